//! Anomaly detection components

pub mod scorer;

pub use scorer::{AnomalyScorer, DetectionError};
