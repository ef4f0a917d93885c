//! Error kinds surfaced by the dashboard pipeline

use crate::models::DetectionError;
use crate::schema::REQUIRED_COLUMNS;
use thiserror::Error;

/// Why a dashboard could not be produced
#[derive(Debug, Error)]
pub enum DashboardError {
    /// No upload and no sample request
    #[error("Please upload a CSV file.")]
    MissingFile,

    #[error("Uploaded CSV must contain: {}", REQUIRED_COLUMNS.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Row {line}: {message}")]
    InvalidRow { line: u64, message: String },

    #[error("The uploaded CSV contains no transactions")]
    EmptyDataset,

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Anomaly detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("Scoring task failed: {0}")]
    Worker(String),
}

impl DashboardError {
    /// Stable identifier for logs, metrics and API responses
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::MissingFile => "missing_file",
            DashboardError::MissingColumns { .. } => "missing_columns",
            DashboardError::InvalidRow { .. } => "invalid_row",
            DashboardError::EmptyDataset => "empty_dataset",
            DashboardError::Csv(_) => "csv",
            DashboardError::Detection(_) => "detection",
            DashboardError::Worker(_) => "worker",
        }
    }

    /// Missing input is a prompt, everything else is a failure
    pub fn is_warning(&self) -> bool {
        matches!(self, DashboardError::MissingFile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_schema() {
        let err = DashboardError::MissingColumns {
            missing: vec!["Amount".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Uploaded CSV must contain: Transaction_ID, Amount, Merchant_Category, Transaction_Location, User_Behavior"
        );
        assert_eq!(err.kind(), "missing_columns");
        assert!(!err.is_warning());
    }

    #[test]
    fn test_missing_file_is_a_warning() {
        let err = DashboardError::MissingFile;
        assert!(err.is_warning());
        assert_eq!(err.to_string(), "Please upload a CSV file.");
    }
}
