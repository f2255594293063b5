use crate::config::ConfigError;
use crate::ledger::LedgerError;
use crate::prediction::PredictionError;
use crate::rating::{RatingError, TableError};
use crate::telemetry::TelemetryError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Tables(TableError),
    Rating(RatingError),
    Ledger(LedgerError),
    Prediction(PredictionError),
    Payload(JsonRejection),
    Unavailable(&'static str),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Tables(err) => write!(f, "rating tables error: {}", err),
            AppError::Rating(err) => write!(f, "{}", err),
            AppError::Ledger(err) => write!(f, "ledger error: {}", err),
            AppError::Prediction(err) => write!(f, "{}", err),
            AppError::Payload(rejection) => {
                write!(f, "invalid request body: {}", rejection.body_text())
            }
            AppError::Unavailable(component) => write!(f, "{} unavailable", component),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Tables(err) => Some(err),
            AppError::Rating(err) => Some(err),
            AppError::Ledger(err) => Some(err),
            AppError::Prediction(err) => Some(err),
            AppError::Payload(rejection) => Some(rejection),
            AppError::Unavailable(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Rating(RatingError::InvalidInput { .. })
            | AppError::Ledger(
                LedgerError::InvalidAmount
                | LedgerError::BalanceOverflow
                | LedgerError::InvalidReward
                | LedgerError::InvalidLogin,
            )
            | AppError::Prediction(PredictionError::InvalidFeature { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Rating(RatingError::UnknownVehicleClass(_)) => StatusCode::NOT_FOUND,
            AppError::Ledger(LedgerError::InsufficientCredits { .. }) => StatusCode::CONFLICT,
            AppError::Prediction(_) => StatusCode::BAD_GATEWAY,
            AppError::Tables(_) => StatusCode::BAD_REQUEST,
            AppError::Payload(rejection) => rejection.status(),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Ledger(LedgerError::Store(_))
            | AppError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<TableError> for AppError {
    fn from(value: TableError) -> Self {
        Self::Tables(value)
    }
}

impl From<RatingError> for AppError {
    fn from(value: RatingError) -> Self {
        Self::Rating(value)
    }
}

impl From<LedgerError> for AppError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        Self::Payload(value)
    }
}

impl From<PredictionError> for AppError {
    fn from(value: PredictionError) -> Self {
        Self::Prediction(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_statuses() {
        let cases = [
            (
                AppError::from(RatingError::UnknownVehicleClass("SPACESHIP".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(LedgerError::InsufficientCredits {
                    requested: 10,
                    available: 5,
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(PredictionError::EmptyPrediction),
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::Unavailable("ledger"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn rating_messages_are_shown_verbatim() {
        let error = AppError::from(RatingError::InvalidInput {
            distance_km: 0.0,
            weight_kg: 1.0,
        });
        assert_eq!(
            error.to_string(),
            "Please enter valid positive numbers for distance and weight."
        );
    }
}
