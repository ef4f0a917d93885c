//! Fraud Detection Dashboard Library
//!
//! Loads a transactions table, flags anomalous amounts with an isolation
//! forest and renders filterable views of the result.

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod server;
pub mod synthetic;
pub mod types;

pub use config::AppConfig;
pub use error::DashboardError;
pub use filter::{FilterCriteria, FilterOptions, FilterSelection};
pub use models::{AnomalyScorer, DetectionError};
pub use pipeline::{Dashboard, DashboardPipeline, DatasetSource};
pub use server::{build_router, AppState};
pub use types::{AnomalyLabel, ScoredTransaction, Transaction};
