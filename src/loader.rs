//! CSV ingest for uploaded transaction tables

use crate::error::DashboardError;
use crate::schema;
use crate::types::transaction::Transaction;
use csv::{ErrorKind, ReaderBuilder, Trim};
use tracing::{debug, warn};

/// Parse raw CSV bytes into transactions.
///
/// The header is checked against the required schema before any row is
/// read. Rows that fail to parse abort the load with their line number.
pub fn parse_transactions(raw: &[u8]) -> Result<Vec<Transaction>, DashboardError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(raw);

    let headers = reader.headers()?.clone();
    if let Err(err) = schema::validate_columns(headers.iter()) {
        warn!(headers = ?headers, error = %err, "Rejected upload with missing columns");
        return Err(err);
    }

    let mut rows = Vec::new();
    for record in reader.deserialize::<Transaction>() {
        let tx = record.map_err(row_error)?;
        if !tx.amount.is_finite() {
            return Err(DashboardError::InvalidRow {
                line: rows.len() as u64 + 2,
                message: format!("amount {} is not a finite number", tx.amount),
            });
        }
        rows.push(tx);
    }

    if rows.is_empty() {
        return Err(DashboardError::EmptyDataset);
    }

    debug!(rows = rows.len(), bytes = raw.len(), "Parsed transactions CSV");
    Ok(rows)
}

fn row_error(err: csv::Error) -> DashboardError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let message = match err.kind() {
        ErrorKind::Deserialize { err: de, .. } => Some(de.to_string()),
        ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => Some(format!("expected {expected_len} fields, found {len}")),
        _ => None,
    };

    match message {
        Some(message) => DashboardError::InvalidRow { line, message },
        None => DashboardError::Csv(err),
    }
}
