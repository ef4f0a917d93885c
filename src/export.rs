//! CSV export of scored rows

use crate::types::transaction::ScoredTransaction;
use serde::Serialize;
use std::io::Write;

/// Flat record written per row; the CSV writer cannot serialise the
/// flattened JSON shape directly
#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Transaction_ID")]
    transaction_id: i64,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "Merchant_Category")]
    merchant_category: &'a str,
    #[serde(rename = "Transaction_Location")]
    location: &'a str,
    #[serde(rename = "User_Behavior")]
    user_behavior: &'a str,
    #[serde(rename = "Anomaly_Score")]
    prediction: i8,
    #[serde(rename = "Decision_Score")]
    decision_score: f64,
    #[serde(rename = "Fraudulent")]
    label: &'static str,
}

impl<'a> From<&'a ScoredTransaction> for ExportRow<'a> {
    fn from(row: &'a ScoredTransaction) -> Self {
        let tx = &row.transaction;
        Self {
            transaction_id: tx.transaction_id,
            amount: tx.amount,
            merchant_category: &tx.merchant_category,
            location: &tx.location,
            user_behavior: &tx.user_behavior,
            prediction: row.prediction,
            decision_score: row.decision_score,
            label: row.label.as_str(),
        }
    }
}

/// Write rows with the upload columns followed by the derived ones
pub fn write_scored_csv<W: Write>(rows: &[ScoredTransaction], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(ExportRow::from(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn scored_csv_bytes(rows: &[ScoredTransaction]) -> Result<Vec<u8>, csv::Error> {
    let mut buffer = Vec::new();
    write_scored_csv(rows, &mut buffer)?;
    Ok(buffer)
}
