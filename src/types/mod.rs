//! Type definitions for the fraud dashboard

pub mod report;
pub mod transaction;

pub use report::{DashboardSummary, ScoreDistribution};
pub use transaction::{AnomalyLabel, ScoredTransaction, Transaction};
