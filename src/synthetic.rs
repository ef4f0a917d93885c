//! Seeded synthetic transaction tables for demos and tests.
//!
//! Produces a block of ordinary amounts followed by a block of much larger
//! ones, with categorical columns drawn uniformly from the configured labels.

use crate::config::SyntheticConfig;
use crate::types::transaction::Transaction;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::io::Write;
use tracing::debug;

/// Synthetic dataset generator
pub struct SyntheticGenerator {
    config: SyntheticConfig,
}

impl SyntheticGenerator {
    pub fn new(config: &SyntheticConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Total rows produced per call
    pub fn row_count(&self) -> usize {
        self.config.normal_count + self.config.outlier_count
    }

    /// Generate the full table; identical output for identical config
    pub fn generate(&self) -> Vec<Transaction> {
        let cfg = &self.config;
        let mut rng = StdRng::seed_from_u64(cfg.seed);

        let mut amounts = Vec::with_capacity(self.row_count());
        amounts.extend(Self::draw(&mut rng, cfg.normal_mean, cfg.normal_std, cfg.normal_count));
        amounts.extend(Self::draw(&mut rng, cfg.outlier_mean, cfg.outlier_std, cfg.outlier_count));

        let rows: Vec<Transaction> = amounts
            .into_iter()
            .enumerate()
            .map(|(i, amount)| {
                Transaction::new(
                    i as i64 + 1,
                    amount,
                    Self::pick(&mut rng, &cfg.merchant_categories),
                    Self::pick(&mut rng, &cfg.locations),
                    Self::pick(&mut rng, &cfg.behaviors),
                )
            })
            .collect();

        debug!(
            rows = rows.len(),
            seed = cfg.seed,
            "Generated synthetic transactions"
        );
        rows
    }

    fn draw(rng: &mut StdRng, mean: f64, std_dev: f64, count: usize) -> Vec<f64> {
        match Normal::new(mean, std_dev) {
            Ok(normal) => normal.sample_iter(&mut *rng).take(count).collect(),
            // A non-finite or negative spread degenerates to the mean
            Err(_) => vec![mean; count],
        }
    }

    fn pick(rng: &mut StdRng, labels: &[String]) -> String {
        labels.choose(rng).cloned().unwrap_or_default()
    }

    /// Generate the table and serialise it as CSV with the upload header
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<usize, csv::Error> {
        let rows = self.generate();
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(rows.len())
    }

    /// CSV bytes for the generated table
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, csv::Error> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}
