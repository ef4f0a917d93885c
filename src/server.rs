//! HTTP surface: the HTML dashboard, a scoring API, health and metrics

use crate::config::AppConfig;
use crate::error::DashboardError;
use crate::export;
use crate::filter::FilterSelection;
use crate::metrics::ServiceMetrics;
use crate::pipeline::{Dashboard, DashboardPipeline, DatasetSource, SourceKind};
use crate::render::{DashboardPage, PageState};
use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

/// Shared, read-only handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<DashboardPipeline>,
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(config: AppConfig, metrics: Arc<ServiceMetrics>) -> Self {
        let pipeline = Arc::new(DashboardPipeline::new(&config));
        Self {
            config: Arc::new(config),
            pipeline,
            metrics,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;
    Router::new()
        .route("/", get(index).post(submit))
        .route("/api/score", post(api_score))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::MissingFile => StatusCode::BAD_REQUEST,
        DashboardError::MissingColumns { .. }
        | DashboardError::InvalidRow { .. }
        | DashboardError::EmptyDataset
        | DashboardError::Csv(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DashboardError::Detection(_) | DashboardError::Worker(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Run the pipeline off the async workers and record the outcome
async fn run_pipeline(
    state: &AppState,
    source: Option<DatasetSource>,
    selection: FilterSelection,
    api: bool,
) -> Result<Dashboard, DashboardError> {
    let pipeline = state.pipeline.clone();
    let start = Instant::now();

    let result = tokio::task::spawn_blocking(move || pipeline.run(source, &selection))
        .await
        .unwrap_or_else(|e| Err(DashboardError::Worker(e.to_string())));

    match &result {
        Ok(dashboard) => state.metrics.record_run(
            start.elapsed(),
            dashboard.summary.total_transactions,
            dashboard.summary.fraudulent_transactions,
            api,
        ),
        Err(err) => {
            state.metrics.record_rejection(err.kind());
            if err.is_warning() {
                debug!(kind = err.kind(), "No dataset supplied");
            } else if status_for(err).is_server_error() {
                error!(kind = err.kind(), error = %err, "Pipeline failed");
            } else {
                warn!(kind = err.kind(), error = %err, "Rejected dataset");
            }
        }
    }
    result
}

fn render_page(state: &AppState, page_state: PageState<'_>) -> String {
    DashboardPage::new(&state.config.render, page_state).to_string()
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state, PageState::Failed(&DashboardError::MissingFile)))
}

/// Fields posted by the sidebar form
#[derive(Debug, Default)]
struct DashboardForm {
    file: Option<Vec<u8>>,
    csv_data: Option<String>,
    source: Option<SourceKind>,
    use_sample: bool,
    filters_applied: bool,
    merchant_categories: Vec<String>,
    locations: Vec<String>,
    behaviors: Vec<String>,
    amount_min: Option<f64>,
    amount_max: Option<f64>,
}

impl DashboardForm {
    async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let bytes = field.bytes().await?;
                    // An empty file input still posts a part
                    if !bytes.is_empty() {
                        form.file = Some(bytes.to_vec());
                    }
                }
                "csv_data" => {
                    let text = field.text().await?;
                    if !text.trim().is_empty() {
                        form.csv_data = Some(text);
                    }
                }
                "source" => form.source = Some(SourceKind::from_form(&field.text().await?)),
                "use_sample" => form.use_sample = true,
                "filters_applied" => form.filters_applied = true,
                "merchant_category" => form.merchant_categories.push(field.text().await?),
                "transaction_location" => form.locations.push(field.text().await?),
                "user_behavior" => form.behaviors.push(field.text().await?),
                "amount_min" => form.amount_min = field.text().await?.trim().parse().ok(),
                "amount_max" => form.amount_max = field.text().await?.trim().parse().ok(),
                _ => {}
            }
        }
        Ok(form)
    }

    /// A new upload or a sample request resets the filters; a carried
    /// table keeps them
    fn into_request(self) -> (Option<DatasetSource>, FilterSelection) {
        if let Some(bytes) = self.file {
            return (Some(DatasetSource::Csv(bytes)), FilterSelection::default());
        }
        if self.use_sample {
            return (Some(DatasetSource::Sample), FilterSelection::default());
        }

        let selection = if self.filters_applied {
            FilterSelection {
                merchant_categories: Some(self.merchant_categories),
                locations: Some(self.locations),
                behaviors: Some(self.behaviors),
                amount_min: self.amount_min,
                amount_max: self.amount_max,
            }
        } else {
            FilterSelection::default()
        };
        let kind = self.source.unwrap_or(SourceKind::Upload);
        let source = self
            .csv_data
            .map(|text| DatasetSource::Carried(text.into_bytes(), kind));
        (source, selection)
    }
}

async fn submit(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match DashboardForm::read(multipart).await {
        Ok(form) => form,
        Err(err) => {
            warn!(error = %err, "Malformed form submission");
            state.metrics.record_rejection("bad_form");
            return (err.status(), err.body_text()).into_response();
        }
    };

    let (source, selection) = form.into_request();
    match run_pipeline(&state, source, selection, false).await {
        Ok(dashboard) => Html(render_page(&state, PageState::Ready(&dashboard))).into_response(),
        Err(err) => {
            // The missing-file prompt is a normal page, not a failure
            let status = if err.is_warning() {
                StatusCode::OK
            } else {
                status_for(&err)
            };
            (status, Html(render_page(&state, PageState::Failed(&err)))).into_response()
        }
    }
}

/// Query parameters of the scoring API; lists are comma separated
#[derive(Debug, Default, Deserialize)]
pub struct ScoreQuery {
    pub merchant_category: Option<String>,
    pub transaction_location: Option<String>,
    pub user_behavior: Option<String>,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
    pub format: Option<String>,
    #[serde(default)]
    pub sample: bool,
}

fn split_list(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
}

impl ScoreQuery {
    fn selection(&self) -> FilterSelection {
        FilterSelection {
            merchant_categories: split_list(&self.merchant_category),
            locations: split_list(&self.transaction_location),
            behaviors: split_list(&self.user_behavior),
            amount_min: self.amount_min,
            amount_max: self.amount_max,
        }
    }
}

fn api_error(err: &DashboardError) -> Response {
    let mut body = json!({
        "error": err.kind(),
        "message": err.to_string(),
    });
    if let DashboardError::MissingColumns { missing } = err {
        body["missing"] = json!(missing);
    }
    (status_for(err), Json(body)).into_response()
}

async fn api_score(
    State(state): State<AppState>,
    Query(query): Query<ScoreQuery>,
    body: Bytes,
) -> Response {
    let source = if !body.is_empty() {
        Some(DatasetSource::Csv(body.to_vec()))
    } else if query.sample {
        Some(DatasetSource::Sample)
    } else {
        None
    };

    let dashboard = match run_pipeline(&state, source, query.selection(), true).await {
        Ok(dashboard) => dashboard,
        Err(err) => return api_error(&err),
    };

    match query.format.as_deref() {
        Some("csv") => match export::scored_csv_bytes(&dashboard.filtered) {
            Ok(bytes) => ([(header::CONTENT_TYPE, "text/csv")], bytes).into_response(),
            Err(err) => api_error(&DashboardError::Csv(err)),
        },
        _ => Json(dashboard).into_response(),
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics(State(state): State<AppState>) -> Json<crate::metrics::MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_prefers_new_upload_and_resets_filters() {
        let form = DashboardForm {
            file: Some(b"new".to_vec()),
            csv_data: Some("old".to_string()),
            filters_applied: true,
            ..DashboardForm::default()
        };
        let (source, selection) = form.into_request();

        assert!(matches!(source, Some(DatasetSource::Csv(bytes)) if bytes == b"new"));
        assert_eq!(selection, FilterSelection::default());
    }

    #[test]
    fn test_carried_table_keeps_empty_selections() {
        let form = DashboardForm {
            csv_data: Some("table".to_string()),
            filters_applied: true,
            merchant_categories: vec!["Food".to_string()],
            ..DashboardForm::default()
        };
        let (source, selection) = form.into_request();

        assert!(matches!(source, Some(DatasetSource::Carried(_, SourceKind::Upload))));
        assert_eq!(selection.merchant_categories, Some(vec!["Food".to_string()]));
        assert_eq!(selection.locations, Some(Vec::new()));
    }

    #[test]
    fn test_carried_table_keeps_sample_source() {
        let form = DashboardForm {
            csv_data: Some("table".to_string()),
            source: Some(SourceKind::Sample),
            filters_applied: true,
            ..DashboardForm::default()
        };
        let (source, _) = form.into_request();

        assert!(matches!(source, Some(DatasetSource::Carried(_, SourceKind::Sample))));
    }

    #[test]
    fn test_empty_form_has_no_source() {
        let (source, _) = DashboardForm::default().into_request();
        assert!(source.is_none());
    }

    #[test]
    fn test_query_lists() {
        let query = ScoreQuery {
            merchant_category: Some("Food, Fuel".to_string()),
            transaction_location: Some(String::new()),
            ..ScoreQuery::default()
        };
        let selection = query.selection();

        assert_eq!(
            selection.merchant_categories,
            Some(vec!["Food".to_string(), "Fuel".to_string()])
        );
        assert_eq!(selection.locations, Some(Vec::new()));
        assert_eq!(selection.behaviors, None);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&DashboardError::MissingFile), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&DashboardError::EmptyDataset),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&DashboardError::Worker("panic".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
