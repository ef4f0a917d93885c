//! Transaction records as loaded from CSV and as enriched by the anomaly scorer

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single transaction row.
///
/// Field names follow the CSV header of the upload format, so the same
/// struct is used for ingest, the JSON API and CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier (uniqueness is not enforced)
    #[serde(rename = "Transaction_ID")]
    pub transaction_id: i64,

    /// Transaction amount
    #[serde(rename = "Amount")]
    pub amount: f64,

    /// Merchant category label (e.g. Grocery, Fuel)
    #[serde(rename = "Merchant_Category")]
    pub merchant_category: String,

    /// Where the transaction happened (e.g. Online, Store)
    #[serde(rename = "Transaction_Location")]
    pub location: String,

    /// User behavior label (e.g. Frequent, Rare)
    #[serde(rename = "User_Behavior")]
    pub user_behavior: String,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(
        transaction_id: i64,
        amount: f64,
        merchant_category: impl Into<String>,
        location: impl Into<String>,
        user_behavior: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id,
            amount,
            merchant_category: merchant_category.into(),
            location: location.into(),
            user_behavior: user_behavior.into(),
        }
    }
}

/// Binary label derived from the anomaly model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyLabel {
    Fraud,
    Legit,
}

impl AnomalyLabel {
    /// Map an estimator prediction (-1 outlier, 1 inlier) to a label
    pub fn from_prediction(prediction: i8) -> Self {
        if prediction == -1 {
            AnomalyLabel::Fraud
        } else {
            AnomalyLabel::Legit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyLabel::Fraud => "Fraud",
            AnomalyLabel::Legit => "Legit",
        }
    }

    pub fn is_fraud(&self) -> bool {
        matches!(self, AnomalyLabel::Fraud)
    }
}

impl fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction enriched once with the model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,

    /// Raw estimator prediction: -1 for outliers, 1 for inliers
    #[serde(rename = "Anomaly_Score")]
    pub prediction: i8,

    /// Label derived from the prediction
    #[serde(rename = "Fraudulent")]
    pub label: AnomalyLabel,

    /// Continuous decision value, negative for outliers
    #[serde(rename = "Decision_Score")]
    pub decision_score: f64,
}

impl ScoredTransaction {
    pub fn new(transaction: Transaction, prediction: i8, decision_score: f64) -> Self {
        Self {
            transaction,
            prediction,
            label: AnomalyLabel::from_prediction(prediction),
            decision_score,
        }
    }

    pub fn is_fraud(&self) -> bool {
        self.label.is_fraud()
    }
}
