use super::HealthAggregator;
use crate::metrics::exposition;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

/// `GET /healthz` and `GET /metrics` over the given aggregator.
pub fn router(aggregator: HealthAggregator) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(aggregator)
}

async fn healthz(State(aggregator): State<HealthAggregator>) -> Response {
    match aggregator.report().await {
        Ok(report) => {
            let status = if report.is_healthy() {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (status, Json(report)).into_response()
        }
        Err(e) => {
            log::error!("Failed to read shared state: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn metrics(State(aggregator): State<HealthAggregator>) -> Response {
    match aggregator.counters().await {
        Ok(counters) => (
            [(header::CONTENT_TYPE, exposition::CONTENT_TYPE)],
            exposition::render(&counters),
        )
            .into_response(),
        Err(e) => {
            log::error!("Failed to read counters: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}
