//! Amount-based anomaly scoring for transaction tables

use crate::config::DetectionConfig;
use crate::types::transaction::{ScoredTransaction, Transaction};
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Errors raised while fitting or applying the model
#[derive(Debug, Error, PartialEq)]
pub enum DetectionError {
    #[error("cannot fit on an empty dataset")]
    EmptyInput,

    #[error("isolation forest rejected the input: {0}")]
    Model(String),
}

/// Raw model output for one table
struct ModelOutput {
    predictions: Vec<i8>,
    scores: Vec<f64>,
}

/// Fits an isolation forest on the amount column and labels every row.
///
/// The model is refitted on each call; nothing is retained between datasets.
#[derive(Debug, Clone)]
pub struct AnomalyScorer {
    n_estimators: usize,
    contamination: f64,
    random_state: u64,
    max_samples: usize,
}

impl AnomalyScorer {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            contamination: config.contamination,
            random_state: config.random_state,
            max_samples: config.max_samples,
        }
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    /// Map amounts onto [0, 1].
    ///
    /// Isolation splits are drawn uniformly between the column bounds, so an
    /// affine rescale leaves the fitted partitions unchanged while keeping the
    /// f32 model input finite for any finite amount. Returns `None` when the
    /// column is constant.
    fn normalized_amounts(transactions: &[Transaction]) -> Option<Vec<f32>> {
        let (lo, hi) = transactions
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
                (lo.min(t.amount), hi.max(t.amount))
            });
        // Halved so the span cannot overflow
        let half_span = hi / 2.0 - lo / 2.0;
        if half_span.is_nan() || half_span <= 0.0 {
            return None;
        }
        Some(
            transactions
                .iter()
                .map(|t| ((t.amount / 2.0 - lo / 2.0) / half_span) as f32)
                .collect(),
        )
    }

    fn run_model(&self, amounts: Vec<f32>) -> Result<ModelOutput, DetectionError> {
        use aprender::prelude::*;

        let rows = amounts.len();
        let data = Matrix::from_vec(rows, 1, amounts)
            .map_err(|e| DetectionError::Model(e.to_string()))?;

        let mut forest = IsolationForest::new()
            .with_n_estimators(self.n_estimators)
            .with_max_samples(self.max_samples.min(rows))
            .with_contamination(self.contamination as _)
            .with_random_state(self.random_state as _);
        forest
            .fit(&data)
            .map_err(|e| DetectionError::Model(e.to_string()))?;

        let predictions = forest
            .predict(&data)
            .iter()
            .map(|&p| if p == -1 { -1 } else { 1 })
            .collect();
        let scores = forest
            .score_samples(&data)
            .iter()
            .map(|&s| s as f64)
            .collect();

        Ok(ModelOutput {
            predictions,
            scores,
        })
    }

    /// Score a table, returning rows in their original order
    pub fn score(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<ScoredTransaction>, DetectionError> {
        if transactions.is_empty() {
            return Err(DetectionError::EmptyInput);
        }
        let start = Instant::now();

        // A single row or a constant column leaves nothing to isolate:
        // every score ties with the contamination quantile
        let output = match Self::normalized_amounts(&transactions) {
            Some(amounts) if transactions.len() > 1 => self.run_model(amounts)?,
            _ => ModelOutput {
                predictions: vec![1; transactions.len()],
                scores: vec![0.0; transactions.len()],
            },
        };

        let offset = percentile(&output.scores, self.contamination * 100.0);
        let scored: Vec<ScoredTransaction> = transactions
            .into_iter()
            .zip(output.predictions.into_iter().zip(output.scores))
            .map(|(tx, (prediction, score))| ScoredTransaction::new(tx, prediction, score - offset))
            .collect();

        debug!(
            rows = scored.len(),
            flagged = scored.iter().filter(|r| r.is_fraud()).count(),
            offset,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Anomaly scoring complete"
        );

        Ok(scored)
    }
}

impl Default for AnomalyScorer {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

/// Linear-interpolated percentile, `pct` in [0, 100]
fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
