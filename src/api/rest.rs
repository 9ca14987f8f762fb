// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// Every request is an independent, stateless computation: the body carries
// the CSV text and options, the response carries the report.  The only shared
// state is the immutable set of defaults loaded at startup.
//
// CORS is configured permissively so a browser front-end can post uploads
// directly.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::export;
use crate::pipeline::{self, AprReport};
use crate::runtime_config::RuntimeConfig;
use crate::table::{ColumnSelection, FundingTable};
use crate::types::RateFormat;

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST API router with CORS middleware and shared defaults.
pub fn router(defaults: Arc<RuntimeConfig>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/apr", post(compute_apr))
        .route("/api/v1/apr/logic", post(compute_logic_csv))
        .layer(cors)
        .with_state(defaults)
}

// =============================================================================
// Errors
// =============================================================================

/// Rejection for bad input: unreadable CSV, unknown column, invalid config.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// APR computation
// =============================================================================

/// Upload body.  Every option falls back to the service defaults.
#[derive(Debug, Deserialize)]
pub struct AprRequest {
    pub csv: String,
    #[serde(default)]
    pub timestamp_column: Option<String>,
    #[serde(default)]
    pub rate_column: Option<String>,
    #[serde(default)]
    pub interval_hours: Option<f64>,
    #[serde(default)]
    pub window_days: Option<u32>,
    #[serde(default)]
    pub rate_format: Option<RateFormat>,
    #[serde(default)]
    pub exchange: Option<String>,
}

fn run_request(defaults: &RuntimeConfig, req: AprRequest) -> Result<AprReport, ApiError> {
    let options = RuntimeConfig {
        exchange: req.exchange.unwrap_or_else(|| defaults.exchange.clone()),
        window_days: req.window_days.unwrap_or(defaults.window_days),
        rate_format: req.rate_format.unwrap_or(defaults.rate_format),
        interval_hours: req.interval_hours.or(defaults.interval_hours),
        timestamp_column: req.timestamp_column.or_else(|| defaults.timestamp_column.clone()),
        rate_column: req.rate_column.or_else(|| defaults.rate_column.clone()),
        ..defaults.clone()
    };

    let table = FundingTable::from_csv_str(&req.csv).map_err(ApiError::bad_request)?;
    let selection = ColumnSelection::resolve(
        table.headers(),
        options.timestamp_column.as_deref(),
        options.rate_column.as_deref(),
    )
    .map_err(ApiError::bad_request)?;

    let detected = pipeline::suggest_interval(
        &table,
        &selection,
        options.rate_format,
        options.fallback_interval_hours,
    );
    let config = options.to_config(detected.hours).map_err(ApiError::bad_request)?;

    Ok(pipeline::run(&table, &selection, &config))
}

async fn compute_apr(
    State(defaults): State<Arc<RuntimeConfig>>,
    Json(req): Json<AprRequest>,
) -> Result<Json<AprReport>, ApiError> {
    let report = run_request(&defaults, req).map_err(|e| {
        warn!(error = %e.message, "APR request rejected");
        e
    })?;
    info!(rows_used = report.summary.rows_used, "APR request served");
    Ok(Json(report))
}

async fn compute_logic_csv(
    State(defaults): State<Arc<RuntimeConfig>>,
    Json(req): Json<AprRequest>,
) -> Result<Response, ApiError> {
    let report = run_request(&defaults, req)?;
    let mut buf = Vec::new();
    export::write_logic(&report.audit, &mut buf).map_err(|e| ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: format!("{e:#}"),
    })?;

    let file_name = export::logic_file_name(&report.audit.exchange);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        buf,
    )
        .into_response())
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const CSV: &str = "Time(UTC),Symbol,Funding Rate\n\
                       2024-05-01 00:00:00,BTCUSDT,0.01%\n\
                       2024-05-01 04:00:00,BTCUSDT,0.01%\n\
                       2024-05-01 08:00:00,BTCUSDT,0.01%\n";

    fn app() -> Router {
        router(Arc::new(RuntimeConfig::default()))
    }

    async fn post_json(uri: &str, body: serde_json::Value) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn health_is_public() {
        let req = Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn computes_report_with_detected_interval() {
        let (status, body) = post_json(
            "/api/v1/apr",
            serde_json::json!({ "csv": CSV, "rate_format": "percent", "window_days": 1, "exchange": "Bybit" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["summary"]["rows_used"], 3);
        assert_eq!(json["summary"]["rows_expected"], 6);
        assert_eq!(json["audit"]["interval_hours"], 4.0);
        assert_eq!(json["audit"]["exchange"], "Bybit");
        let apr = json["rows"][0]["apr_pct"].as_f64().unwrap();
        assert!((apr - 21.9).abs() < 1e-9);
        assert_eq!(json["rows"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_upload_reports_null_aggregates() {
        let (status, body) = post_json(
            "/api/v1/apr",
            serde_json::json!({ "csv": "time,funding_rate\n" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["summary"]["window_apr_compounding"].is_null());
        assert!(json["summary"]["window_apr_average"].is_null());
    }

    #[tokio::test]
    async fn invalid_window_is_bad_request() {
        let (status, body) = post_json(
            "/api/v1/apr",
            serde_json::json!({ "csv": CSV, "window_days": 91 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("out of range"));
    }

    #[tokio::test]
    async fn unknown_column_is_bad_request() {
        let (status, _) = post_json(
            "/api/v1/apr",
            serde_json::json!({ "csv": CSV, "rate_column": "premium" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logic_endpoint_returns_csv() {
        let (status, body) = post_json(
            "/api/v1/apr/logic",
            serde_json::json!({ "csv": CSV, "rate_format": "percent", "exchange": "WOOX" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Exchange,"));
        assert!(lines.next().unwrap().starts_with("WOOX,"));
    }
}
