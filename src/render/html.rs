//! The dashboard page: sidebar form, metric cards, tables and chart

use crate::config::RenderConfig;
use crate::error::DashboardError;
use crate::pipeline::{Dashboard, SourceKind};
use crate::render::chart::ScatterChart;
use crate::render::Escape;
use crate::schema::REQUIRED_COLUMNS;
use crate::types::transaction::ScoredTransaction;
use std::collections::BTreeSet;
use std::fmt;

const STYLE: &str = r#"
body { background-color: #121212; color: #fff; font-family: Arial, sans-serif; margin: 0; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 300px; background-color: #222222; padding: 15px; border-radius: 0 10px 10px 0; }
.sidebar h2 { font-size: 1.05em; margin-top: 1.2em; }
.sidebar fieldset { border: 1px solid #444; border-radius: 6px; margin: 8px 0; }
.sidebar input[type=number] { width: 110px; }
main { flex: 1; padding: 20px 30px; overflow-x: auto; }
button { background-color: #ff007f; color: white; border: none; border-radius: 10px; font-weight: bold; padding: 10px; margin-top: 12px; cursor: pointer; }
button:hover { background-color: #ff00ff; }
.status { padding: 8px; border-radius: 6px; margin: 10px 0; }
.status.success { background: #1e4620; }
.status.warning { background: #5c4a12; }
.status.error { background: #5c1a1a; }
.metrics { display: flex; gap: 16px; }
.metric-container { flex: 1; background: linear-gradient(135deg, #ff007f, #00ff99); padding: 10px; border-radius: 8px; text-align: center; font-weight: bold; color: white; }
.table-wrap { border: 2px solid #ff007f; border-radius: 5px; padding: 5px; max-height: 420px; overflow-y: auto; }
table { border-collapse: collapse; width: 100%; font-size: 0.9em; }
th, td { padding: 4px 8px; border-bottom: 1px solid #333; text-align: left; }
tr.fraud td { color: #ff6b6b; }
.note { color: #aaa; font-size: 0.85em; }
.scatter { background: #fff; border-radius: 8px; max-width: 100%; }
.scatter .axis { stroke: #333; }
.scatter .grid { stroke: #eee; }
.scatter text { fill: #333; font-size: 12px; }
.scatter .chart-title { font-size: 16px; font-weight: bold; }
"#;

const HEADLINE: &str = "🔍 Real-Time Fraud Monitoring Dashboard";
const CHART_TITLE: &str = "Transaction Amounts with Fraud Highlighted";

/// What the page shows besides the sidebar
pub enum PageState<'a> {
    Ready(&'a Dashboard),
    Failed(&'a DashboardError),
}

/// A full HTML document for one request
pub struct DashboardPage<'a> {
    config: &'a RenderConfig,
    state: PageState<'a>,
}

impl<'a> DashboardPage<'a> {
    pub fn new(config: &'a RenderConfig, state: PageState<'a>) -> Self {
        Self { config, state }
    }

    fn write_status(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (class, message) = match &self.state {
            PageState::Ready(dashboard) => match dashboard.source {
                SourceKind::Upload => ("success", "File uploaded successfully!".to_string()),
                SourceKind::Sample => ("success", "Using generated sample data.".to_string()),
            },
            PageState::Failed(err) if err.is_warning() => ("warning", err.to_string()),
            PageState::Failed(err) => ("error", err.to_string()),
        };
        writeln!(f, r#"<div class="status {class}">{}</div>"#, Escape(&message))?;

        if let PageState::Failed(DashboardError::MissingColumns { missing }) = &self.state {
            writeln!(
                f,
                r#"<div class="note">Missing: {}</div>"#,
                Escape(&missing.join(", "))
            )?;
        }
        Ok(())
    }

    fn write_sidebar(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, r#"<aside class="sidebar">"#)?;
        writeln!(
            f,
            r#"<form method="post" action="/" enctype="multipart/form-data">"#
        )?;
        writeln!(f, "<h2>Upload Your Transactions CSV File</h2>")?;
        writeln!(f, r#"<input type="file" name="file" accept=".csv">"#)?;
        writeln!(
            f,
            r#"<div class="note">Columns: {}</div>"#,
            REQUIRED_COLUMNS.join(", ")
        )?;
        writeln!(
            f,
            r#"<label><input type="checkbox" name="use_sample" value="1"> Use sample data</label>"#
        )?;
        self.write_status(f)?;

        if let PageState::Ready(dashboard) = &self.state {
            write_filters(f, dashboard)?;
        }

        writeln!(f, r#"<button type="submit">Apply</button>"#)?;
        writeln!(f, "</form>")?;
        writeln!(f, "</aside>")
    }

    fn write_main(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<main>")?;
        writeln!(f, "<h1>{HEADLINE}</h1>")?;

        if let PageState::Ready(dashboard) = &self.state {
            let summary = &dashboard.summary;
            writeln!(f, r#"<div class="metrics">"#)?;
            writeln!(
                f,
                r#"<div class="metric-container">Total Transactions: {}</div>"#,
                summary.total_transactions
            )?;
            writeln!(
                f,
                r#"<div class="metric-container">Fraudulent Transactions: {}</div>"#,
                summary.fraudulent_transactions
            )?;
            writeln!(
                f,
                r#"<div class="metric-container">Fraud Percentage: {}</div>"#,
                summary.fraud_percentage_label()
            )?;
            writeln!(f, "</div>")?;

            writeln!(f, "<h2>Transactions Overview</h2>")?;
            write_table(f, &dashboard.filtered, self.config.max_table_rows)?;

            writeln!(f, "<h2>Detected Fraudulent Transactions</h2>")?;
            write_table(f, &dashboard.flagged, self.config.max_table_rows)?;

            writeln!(f, "<h2>Fraud Detection Visualization</h2>")?;
            write!(f, "{}", ScatterChart::new(&dashboard.scored, CHART_TITLE))?;
            writeln!(
                f,
                r#"<p class="note">Report {} generated {}</p>"#,
                dashboard.report_id,
                dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            )?;
        }

        writeln!(f, "</main>")
    }
}

fn write_checkboxes(
    f: &mut fmt::Formatter<'_>,
    legend: &str,
    name: &str,
    values: &[String],
    selected: &BTreeSet<String>,
) -> fmt::Result {
    writeln!(f, "<fieldset><legend>{legend}</legend>")?;
    for value in values {
        let checked = if selected.contains(value) { " checked" } else { "" };
        writeln!(
            f,
            r#"<label><input type="checkbox" name="{name}" value="{}"{checked}> {}</label><br>"#,
            Escape(value),
            Escape(value)
        )?;
    }
    writeln!(f, "</fieldset>")
}

fn write_filters(f: &mut fmt::Formatter<'_>, dashboard: &Dashboard) -> fmt::Result {
    let options = &dashboard.options;
    let criteria = &dashboard.criteria;

    // The table travels with the form so a filter change re-runs the pipeline
    writeln!(
        f,
        r#"<textarea name="csv_data" hidden>{}</textarea>"#,
        Escape(&dashboard.raw_csv)
    )?;
    writeln!(
        f,
        r#"<input type="hidden" name="source" value="{}">"#,
        dashboard.source.as_str()
    )?;
    writeln!(f, r#"<input type="hidden" name="filters_applied" value="1">"#)?;

    writeln!(f, "<h2>Filter Transactions</h2>")?;
    write_checkboxes(
        f,
        "Select Merchant Category:",
        "merchant_category",
        &options.merchant_categories,
        &criteria.merchant_categories,
    )?;
    write_checkboxes(
        f,
        "Select Transaction Location:",
        "transaction_location",
        &options.locations,
        &criteria.locations,
    )?;
    write_checkboxes(
        f,
        "Select User Behavior:",
        "user_behavior",
        &options.behaviors,
        &criteria.behaviors,
    )?;

    writeln!(f, "<fieldset><legend>Select Amount Range:</legend>")?;
    writeln!(
        f,
        r#"<input type="number" step="any" name="amount_min" min="{}" max="{}" value="{}"> to "#,
        options.amount_range.min, options.amount_range.max, criteria.amount_range.min
    )?;
    writeln!(
        f,
        r#"<input type="number" step="any" name="amount_max" min="{}" max="{}" value="{}">"#,
        options.amount_range.min, options.amount_range.max, criteria.amount_range.max
    )?;
    writeln!(f, "</fieldset>")
}

fn write_table(f: &mut fmt::Formatter<'_>, rows: &[ScoredTransaction], max_rows: usize) -> fmt::Result {
    if rows.len() > max_rows {
        writeln!(
            f,
            r#"<p class="note">Showing first {max_rows} of {} rows</p>"#,
            rows.len()
        )?;
    }

    writeln!(f, r#"<div class="table-wrap"><table>"#)?;
    writeln!(f, "<thead><tr>")?;
    for column in REQUIRED_COLUMNS
        .iter()
        .chain(["Anomaly_Score", "Decision_Score", "Fraudulent"].iter())
    {
        write!(f, "<th>{column}</th>")?;
    }
    writeln!(f, "</tr></thead><tbody>")?;

    for row in rows.iter().take(max_rows) {
        let tx = &row.transaction;
        let class = if row.is_fraud() { r#" class="fraud""# } else { "" };
        writeln!(
            f,
            "<tr{class}><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.4}</td><td>{}</td></tr>",
            tx.transaction_id,
            tx.amount,
            Escape(&tx.merchant_category),
            Escape(&tx.location),
            Escape(&tx.user_behavior),
            row.prediction,
            row.decision_score,
            row.label
        )?;
    }
    writeln!(f, "</tbody></table></div>")
}

impl fmt::Display for DashboardPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, r#"<html lang="en"><head><meta charset="utf-8">"#)?;
        writeln!(f, "<title>{}</title>", Escape(&self.config.page_title))?;
        writeln!(f, "<style>{STYLE}</style>")?;
        writeln!(f, r#"</head><body><div class="layout">"#)?;
        self.write_sidebar(f)?;
        self.write_main(f)?;
        writeln!(f, "</div></body></html>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::filter::FilterSelection;
    use crate::pipeline::{DashboardPipeline, DatasetSource};

    fn sample_dashboard(selection: &FilterSelection) -> Dashboard {
        DashboardPipeline::new(&AppConfig::default())
            .run(Some(DatasetSource::Sample), selection)
            .unwrap()
    }

    #[test]
    fn test_missing_file_page_shows_warning_only() {
        let config = RenderConfig::default();
        let err = DashboardError::MissingFile;
        let html = DashboardPage::new(&config, PageState::Failed(&err)).to_string();

        assert!(html.contains(r#"<div class="status warning">Please upload a CSV file.</div>"#));
        assert!(!html.contains("Transactions Overview"));
        assert!(!html.contains("<svg"));
        assert!(!html.contains("csv_data"));
    }

    #[test]
    fn test_missing_columns_page_shows_error() {
        let config = RenderConfig::default();
        let err = DashboardError::MissingColumns {
            missing: vec!["User_Behavior".to_string()],
        };
        let html = DashboardPage::new(&config, PageState::Failed(&err)).to_string();

        assert!(html.contains(r#"class="status error">Uploaded CSV must contain:"#));
        assert!(html.contains("Missing: User_Behavior"));
        assert!(!html.contains("metric-container\">"));
    }

    #[test]
    fn test_ready_page_has_all_sections() {
        let config = RenderConfig::default();
        let dashboard = sample_dashboard(&FilterSelection::default());
        let html = DashboardPage::new(&config, PageState::Ready(&dashboard)).to_string();

        assert!(html.contains("Total Transactions: 500"));
        assert!(html.contains(&format!(
            "Fraudulent Transactions: {}",
            dashboard.summary.fraudulent_transactions
        )));
        assert!(html.contains("Fraud Percentage: "));
        assert!(html.contains("<h2>Transactions Overview</h2>"));
        assert!(html.contains("<h2>Detected Fraudulent Transactions</h2>"));
        assert!(html.contains(CHART_TITLE));
        assert!(html.contains(r#"name="csv_data""#));
        assert!(html.contains(r#"<input type="hidden" name="source" value="sample">"#));
        assert!(html.contains(r#"value="Grocery" checked"#));
    }

    #[test]
    fn test_unselected_values_render_unchecked() {
        let config = RenderConfig::default();
        let selection = FilterSelection {
            merchant_categories: Some(vec!["Fuel".to_string()]),
            ..FilterSelection::default()
        };
        let dashboard = sample_dashboard(&selection);
        let html = DashboardPage::new(&config, PageState::Ready(&dashboard)).to_string();

        assert!(html.contains(r#"value="Fuel" checked"#));
        assert!(html.contains(r#"value="Grocery">"#));
    }

    #[test]
    fn test_tables_are_truncated() {
        let config = RenderConfig {
            max_table_rows: 10,
            ..RenderConfig::default()
        };
        let dashboard = sample_dashboard(&FilterSelection::default());
        let html = DashboardPage::new(&config, PageState::Ready(&dashboard)).to_string();

        assert!(html.contains("Showing first 10 of 500 rows"));
    }
}
