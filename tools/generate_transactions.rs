//! Synthetic Transaction Generator
//!
//! Writes a seeded transactions CSV in the dashboard's upload format.
//!
//! Usage: generate-transactions [OUTPUT|-] [NORMAL_COUNT] [OUTLIER_COUNT] [SEED]

use anyhow::{Context, Result};
use fraud_dashboard::{config::AppConfig, synthetic::SyntheticGenerator};
use std::fs::File;
use std::io::{self, BufWriter};
use tracing::info;

fn main() -> Result<()> {
    // Logs go to stderr so stdout can carry the CSV
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_transactions=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let mut synthetic = AppConfig::load()?.synthetic;

    let args: Vec<String> = std::env::args().collect();
    let output = args.get(1).map(|s| s.as_str()).unwrap_or("-");
    if let Some(n) = args.get(2).and_then(|s| s.parse().ok()) {
        synthetic.normal_count = n;
    }
    if let Some(n) = args.get(3).and_then(|s| s.parse().ok()) {
        synthetic.outlier_count = n;
    }
    if let Some(seed) = args.get(4).and_then(|s| s.parse().ok()) {
        synthetic.seed = seed;
    }

    info!(
        output = %output,
        normal = synthetic.normal_count,
        outliers = synthetic.outlier_count,
        seed = synthetic.seed,
        "Configuration loaded"
    );

    let generator = SyntheticGenerator::new(&synthetic);
    let written = if output == "-" {
        generator
            .write_csv(io::stdout().lock())
            .context("Failed to write CSV to stdout")?
    } else {
        let file = File::create(output).with_context(|| format!("Failed to create {output}"))?;
        generator
            .write_csv(BufWriter::new(file))
            .with_context(|| format!("Failed to write {output}"))?
    };

    info!("Completed! Wrote {} transactions", written);
    Ok(())
}
