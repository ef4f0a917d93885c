//! The dashboard pipeline: load, validate, score, filter, summarise.
//!
//! `DashboardPipeline::run` is a pure function of its inputs. Every call
//! parses and scores the table from scratch and nothing about the dataset
//! outlives the returned [`Dashboard`].

use crate::config::AppConfig;
use crate::error::DashboardError;
use crate::filter::{FilterCriteria, FilterOptions, FilterSelection};
use crate::loader;
use crate::models::scorer::AnomalyScorer;
use crate::synthetic::SyntheticGenerator;
use crate::types::report::{DashboardSummary, ScoreDistribution};
use crate::types::transaction::ScoredTransaction;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Where the table comes from
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// Freshly uploaded CSV bytes
    Csv(Vec<u8>),
    /// A table carried over from a previous render, with where it first
    /// came from
    Carried(Vec<u8>, SourceKind),
    /// The seeded synthetic table
    Sample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Upload,
    Sample,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Upload => "upload",
            SourceKind::Sample => "sample",
        }
    }

    /// Parse the form value; anything unknown counts as an upload
    pub fn from_form(value: &str) -> Self {
        match value.trim() {
            "sample" => SourceKind::Sample,
            _ => SourceKind::Upload,
        }
    }
}

/// Everything one render of the dashboard shows
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub source: SourceKind,
    pub summary: DashboardSummary,
    pub score_distribution: ScoreDistribution,
    pub options: FilterOptions,
    pub criteria: FilterCriteria,
    /// Rows passing the filters
    pub filtered: Vec<ScoredTransaction>,
    /// Every row labelled Fraud, ignoring filters
    pub flagged: Vec<ScoredTransaction>,
    /// The whole scored table, used by the chart
    #[serde(skip)]
    pub scored: Vec<ScoredTransaction>,
    /// The table as CSV text, carried into the next form submission
    #[serde(skip)]
    pub raw_csv: String,
}

/// Pipeline configured once at startup and shared by request handlers
pub struct DashboardPipeline {
    scorer: AnomalyScorer,
    generator: SyntheticGenerator,
}

impl DashboardPipeline {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            scorer: AnomalyScorer::new(&config.detection),
            generator: SyntheticGenerator::new(&config.synthetic),
        }
    }

    /// Run the whole pipeline for one request
    pub fn run(
        &self,
        source: Option<DatasetSource>,
        selection: &FilterSelection,
    ) -> Result<Dashboard, DashboardError> {
        let (kind, raw) = match source {
            Some(DatasetSource::Csv(bytes)) => (SourceKind::Upload, bytes),
            Some(DatasetSource::Carried(bytes, kind)) => (kind, bytes),
            Some(DatasetSource::Sample) => (SourceKind::Sample, self.generator.to_csv_bytes()?),
            None => return Err(DashboardError::MissingFile),
        };

        let transactions = loader::parse_transactions(&raw)?;
        let scored = self.scorer.score(transactions)?;

        let options = FilterOptions::from_scored(&scored);
        let criteria = selection.resolve(&options);
        let filtered = criteria.apply(&scored);
        let flagged: Vec<ScoredTransaction> =
            scored.iter().filter(|r| r.is_fraud()).cloned().collect();

        let summary = DashboardSummary::from_scored(&scored);
        let score_distribution = ScoreDistribution::from_scored(&scored);

        info!(
            source = ?kind,
            rows = summary.total_transactions,
            fraud = summary.fraudulent_transactions,
            fraud_pct = format!("{:.2}", summary.fraud_percentage),
            filtered = filtered.len(),
            "Dashboard computed"
        );

        Ok(Dashboard {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            source: kind,
            summary,
            score_distribution,
            options,
            criteria,
            filtered,
            flagged,
            scored,
            raw_csv: String::from_utf8_lossy(&raw).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Transaction_ID,Amount,Merchant_Category,Transaction_Location,User_Behavior";

    fn pipeline() -> DashboardPipeline {
        DashboardPipeline::new(&AppConfig::default())
    }

    #[test]
    fn test_no_source_is_missing_file() {
        let result = pipeline().run(None, &FilterSelection::default());
        assert!(matches!(result, Err(DashboardError::MissingFile)));
    }

    #[test]
    fn test_missing_columns_stop_the_pipeline() {
        let csv = b"Transaction_ID,Amount\n1,10\n".to_vec();
        let result = pipeline().run(Some(DatasetSource::Csv(csv)), &FilterSelection::default());
        assert!(matches!(result, Err(DashboardError::MissingColumns { .. })));
    }

    #[test]
    fn test_sample_dashboard() {
        let dashboard = pipeline()
            .run(Some(DatasetSource::Sample), &FilterSelection::default())
            .unwrap();

        assert_eq!(dashboard.source, SourceKind::Sample);
        assert_eq!(dashboard.summary.total_transactions, 500);
        assert_eq!(dashboard.filtered.len(), 500);
        assert_eq!(dashboard.flagged.len(), dashboard.summary.fraudulent_transactions);
        assert!(dashboard.flagged.iter().all(|r| r.is_fraud()));
        assert!(dashboard.raw_csv.starts_with(HEADER));
    }

    #[test]
    fn test_filters_do_not_change_summary_or_flagged() {
        let selection = FilterSelection {
            locations: Some(vec!["Online".to_string()]),
            ..FilterSelection::default()
        };
        let full = pipeline()
            .run(Some(DatasetSource::Sample), &FilterSelection::default())
            .unwrap();
        let narrowed = pipeline().run(Some(DatasetSource::Sample), &selection).unwrap();

        assert_eq!(full.summary, narrowed.summary);
        assert_eq!(full.flagged, narrowed.flagged);
        assert!(narrowed.filtered.len() < full.filtered.len());
        assert!(narrowed.filtered.iter().all(|r| r.transaction.location == "Online"));
    }

    #[test]
    fn test_carried_csv_reproduces_dashboard() {
        let first = pipeline()
            .run(Some(DatasetSource::Sample), &FilterSelection::default())
            .unwrap();
        let again = pipeline()
            .run(
                Some(DatasetSource::Csv(first.raw_csv.clone().into_bytes())),
                &FilterSelection::default(),
            )
            .unwrap();

        assert_eq!(again.source, SourceKind::Upload);
        assert_eq!(first.scored, again.scored);
    }

    #[test]
    fn test_carried_sample_keeps_its_source() {
        let first = pipeline()
            .run(Some(DatasetSource::Sample), &FilterSelection::default())
            .unwrap();
        let again = pipeline()
            .run(
                Some(DatasetSource::Carried(
                    first.raw_csv.into_bytes(),
                    SourceKind::Sample,
                )),
                &FilterSelection::default(),
            )
            .unwrap();

        assert_eq!(again.source, SourceKind::Sample);
    }

    #[test]
    fn test_small_upload() {
        let mut csv = format!("{HEADER}\n");
        for i in 1..=40 {
            csv.push_str(&format!("{i},{},Food,Store,Frequent\n", 100 + i % 5));
        }
        csv.push_str("41,5000,Food,Online,Rare\n");
        let dashboard = pipeline()
            .run(Some(DatasetSource::Csv(csv.into_bytes())), &FilterSelection::default())
            .unwrap();

        assert_eq!(dashboard.summary.total_transactions, 41);
        assert!(!dashboard.flagged.is_empty());
        assert!(dashboard
            .flagged
            .iter()
            .any(|r| r.transaction.transaction_id == 41));
    }

    #[test]
    fn test_single_row_upload() {
        let csv = format!("{HEADER}\n7,250.5,Fuel,Online,Rare\n");
        let dashboard = pipeline()
            .run(Some(DatasetSource::Csv(csv.into_bytes())), &FilterSelection::default())
            .unwrap();

        assert_eq!(dashboard.summary.total_transactions, 1);
        assert_eq!(dashboard.summary.fraudulent_transactions, 0);
        assert!(dashboard.flagged.is_empty());
        assert_eq!(dashboard.filtered.len(), 1);
    }
}
