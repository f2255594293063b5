use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json, Router};
use ecomart::impact::impact_router;
use ecomart::ledger::{ledger_router, KeyValueStore, SharedLedger};
use ecomart::prediction::{prediction_router, EmissionPredictor};
use ecomart::rating::{rating_router, RatingEngine};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes<S>(
    engine: Arc<RatingEngine>,
    ledger: SharedLedger<S>,
    predictor: Arc<dyn EmissionPredictor>,
) -> Router
where
    S: KeyValueStore + 'static,
{
    rating_router(engine)
        .merge(ledger_router(ledger.clone()))
        .merge(impact_router(ledger))
        .merge(prediction_router(predictor))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
