use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use crate::AppError;

use super::{
    EmissionPredictor, FuelType, PredictionError, VehicleFeatures, ENGINE_SIZE_BINS,
    FEATURE_COLUMNS, VEHICLE_CLASSES,
};

type SharedPredictor = Arc<dyn EmissionPredictor>;

/// Router builder proxying the hosted emissions model.
pub fn prediction_router(predictor: Arc<dyn EmissionPredictor>) -> Router {
    Router::new()
        .route("/api/v1/emissions/predict", post(predict_handler))
        .route("/api/v1/emissions/options", get(options_handler))
        .with_state(predictor)
}

#[derive(Debug, Serialize)]
struct SelectOption {
    value: &'static str,
    label: &'static str,
}

pub(crate) async fn predict_handler(
    State(predictor): State<SharedPredictor>,
    payload: Result<Json<VehicleFeatures>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(features) = payload?;
    if let Err(error) = features.validate() {
        return Ok(prediction_error_response(&error));
    }

    let response = match predictor.predict(&features).await {
        Ok(prediction) => (StatusCode::OK, Json(prediction)).into_response(),
        Err(error) => prediction_error_response(&error),
    };
    Ok(response)
}

pub(crate) async fn options_handler() -> Json<serde_json::Value> {
    let fuel_types: Vec<SelectOption> = [
        FuelType::RegularGasoline,
        FuelType::PremiumGasoline,
        FuelType::Diesel,
        FuelType::Ethanol,
        FuelType::NaturalGas,
    ]
    .into_iter()
    .map(|fuel| SelectOption {
        value: fuel.code(),
        label: fuel.label(),
    })
    .collect();
    let engine_size_bins: Vec<SelectOption> = ENGINE_SIZE_BINS
        .iter()
        .map(|&(value, label)| SelectOption { value, label })
        .collect();

    Json(json!({
        "feature_columns": FEATURE_COLUMNS,
        "vehicle_classes": VEHICLE_CLASSES,
        "fuel_types": fuel_types,
        "engine_size_bins": engine_size_bins,
    }))
}

fn prediction_error_response(error: &PredictionError) -> Response {
    let status = match error {
        PredictionError::InvalidFeature { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PredictionError::Remote { .. }
        | PredictionError::EmptyPrediction
        | PredictionError::Transport(_) => StatusCode::BAD_GATEWAY,
    };
    let message = match error {
        PredictionError::Remote { message, .. } => message.clone(),
        other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
}
