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

use super::labels::{category_label, vehicle_class_label};
use super::{EcoGrade, GradeBound, RatingEngine, RatingError, RatingRequest, RatingResult};

/// Router builder exposing the eco-rating calculator.
pub fn rating_router(engine: Arc<RatingEngine>) -> Router {
    Router::new()
        .route("/api/v1/eco-rating", post(rate_handler))
        .route("/api/v1/eco-rating/options", get(options_handler))
        .with_state(engine)
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub vehicle_class: String,
    pub category: String,
    #[serde(flatten)]
    pub result: RatingResult,
    pub grade_label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RatingOptions {
    pub vehicle_classes: Vec<VehicleOption>,
    pub categories: Vec<CategoryOption>,
    pub grade_bounds: Vec<GradeBound>,
    pub final_grade: EcoGrade,
}

#[derive(Debug, Serialize)]
pub struct VehicleOption {
    pub value: String,
    pub label: String,
    pub g_per_km: f64,
}

#[derive(Debug, Serialize)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
    pub factor: f64,
}

impl RatingOptions {
    pub fn from_engine(engine: &RatingEngine) -> Self {
        let tables = engine.tables();
        Self {
            vehicle_classes: tables
                .vehicles
                .entries()
                .iter()
                .map(|entry| VehicleOption {
                    value: entry.vehicle_class.clone(),
                    label: vehicle_class_label(&entry.vehicle_class),
                    g_per_km: entry.g_per_km,
                })
                .collect(),
            categories: tables
                .categories
                .entries()
                .iter()
                .map(|entry| CategoryOption {
                    value: entry.category.clone(),
                    label: category_label(&entry.category),
                    factor: entry.factor,
                })
                .collect(),
            grade_bounds: tables.thresholds.bounds().to_vec(),
            final_grade: tables.thresholds.final_grade(),
        }
    }
}

pub(crate) async fn rate_handler(
    State(engine): State<Arc<RatingEngine>>,
    payload: Result<Json<RatingRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let response = match engine.rate(&request) {
        Ok(result) => {
            let grade_label = result.grade.label();
            let body = RatingResponse {
                vehicle_class: request.vehicle_class,
                category: request.category,
                result,
                grade_label,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => {
            let status = match error {
                RatingError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                RatingError::UnknownVehicleClass(_) => StatusCode::NOT_FOUND,
            };
            let payload = json!({ "error": error.to_string() });
            (status, Json(payload)).into_response()
        }
    };
    Ok(response)
}

pub(crate) async fn options_handler(State(engine): State<Arc<RatingEngine>>) -> Json<RatingOptions> {
    Json(RatingOptions::from_engine(&engine))
}
