//! Summary statistics shown at the top of the dashboard

use crate::types::transaction::ScoredTransaction;
use serde::{Deserialize, Serialize};

/// Headline counts for a scored dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Rows in the whole dataset
    pub total_transactions: usize,
    /// Rows labelled Fraud in the whole dataset
    pub fraudulent_transactions: usize,
    /// Fraud share in percent (0.0 for an empty dataset)
    pub fraud_percentage: f64,
}

impl DashboardSummary {
    pub fn from_scored(rows: &[ScoredTransaction]) -> Self {
        let total = rows.len();
        let fraud = rows.iter().filter(|r| r.is_fraud()).count();
        let fraud_percentage = if total > 0 {
            fraud as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_transactions: total,
            fraudulent_transactions: fraud,
            fraud_percentage,
        }
    }

    /// Fraud percentage formatted the way the metric card shows it
    pub fn fraud_percentage_label(&self) -> String {
        format!("{:.2}%", self.fraud_percentage)
    }
}

/// Histogram of decision scores in ten equal-width buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub min: f64,
    pub max: f64,
    pub buckets: [usize; 10],
}

impl ScoreDistribution {
    pub fn from_scored(rows: &[ScoredTransaction]) -> Self {
        let mut buckets = [0usize; 10];
        if rows.is_empty() {
            return Self {
                min: 0.0,
                max: 0.0,
                buckets,
            };
        }

        let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r.decision_score), hi.max(r.decision_score))
        });
        let width = max - min;

        for row in rows {
            let bucket = if width > 0.0 {
                (((row.decision_score - min) / width) * 10.0).min(9.0) as usize
            } else {
                0
            };
            buckets[bucket] += 1;
        }

        Self { min, max, buckets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::Transaction;

    fn scored(id: i64, prediction: i8, decision: f64) -> ScoredTransaction {
        ScoredTransaction::new(
            Transaction::new(id, 10.0, "Food", "Store", "Frequent"),
            prediction,
            decision,
        )
    }

    #[test]
    fn test_summary_counts() {
        let rows = vec![scored(1, 1, 0.1), scored(2, -1, -0.2), scored(3, 1, 0.05), scored(4, 1, 0.2)];
        let summary = DashboardSummary::from_scored(&rows);

        assert_eq!(summary.total_transactions, 4);
        assert_eq!(summary.fraudulent_transactions, 1);
        assert!((summary.fraud_percentage - 25.0).abs() < 1e-9);
        assert_eq!(summary.fraud_percentage_label(), "25.00%");
    }

    #[test]
    fn test_empty_summary() {
        let summary = DashboardSummary::from_scored(&[]);
        assert_eq!(summary.total_transactions, 0);
        assert_eq!(summary.fraud_percentage, 0.0);
    }

    #[test]
    fn test_distribution_covers_all_rows() {
        let rows = vec![scored(1, 1, 0.1), scored(2, -1, -0.2), scored(3, 1, 0.3)];
        let dist = ScoreDistribution::from_scored(&rows);

        assert_eq!(dist.buckets.iter().sum::<usize>(), 3);
        assert_eq!(dist.buckets[0], 1);
        assert_eq!(dist.buckets[9], 1);
        assert_eq!(dist.min, -0.2);
    }
}
