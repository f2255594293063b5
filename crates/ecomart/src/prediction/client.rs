use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{instrument, warn};

use super::{EmissionPredictor, Prediction, PredictionError, VehicleFeatures, GENERIC_REMOTE_ERROR};
use crate::config::PredictionConfig;

#[derive(Debug, Deserialize)]
struct PredictionBody {
    #[serde(default)]
    prediction: Option<Vec<f64>>,
    #[serde(default)]
    error: Option<String>,
}

/// reqwest-backed client for the hosted model. Single attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPredictionClient {
    pub fn new(config: &PredictionConfig) -> Result<Self, PredictionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| PredictionError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn interpret(status: StatusCode, bytes: &[u8]) -> Result<Prediction, PredictionError> {
    let body = serde_json::from_slice::<PredictionBody>(bytes).ok();

    if !status.is_success() {
        let message = body
            .and_then(|body| body.error)
            .unwrap_or_else(|| GENERIC_REMOTE_ERROR.to_string());
        return Err(PredictionError::Remote {
            status: status.as_u16(),
            message,
        });
    }

    match body {
        Some(PredictionBody {
            prediction: Some(values),
            ..
        }) => values
            .first()
            .copied()
            .map(|co2_emissions_g_per_km| Prediction {
                co2_emissions_g_per_km,
            })
            .ok_or(PredictionError::EmptyPrediction),
        Some(PredictionBody {
            error: Some(message),
            ..
        }) => Err(PredictionError::Remote {
            status: status.as_u16(),
            message,
        }),
        _ => Err(PredictionError::Remote {
            status: status.as_u16(),
            message: GENERIC_REMOTE_ERROR.to_string(),
        }),
    }
}

#[async_trait]
impl EmissionPredictor for HttpPredictionClient {
    #[instrument(name = "emissions_predict", skip(self, features), fields(endpoint = %self.endpoint))]
    async fn predict(&self, features: &VehicleFeatures) -> Result<Prediction, PredictionError> {
        features.validate()?;

        let response = self
            .client
            .post(&self.endpoint)
            .json(&features.to_payload())
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "prediction request failed");
                PredictionError::Transport(err.to_string())
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| PredictionError::Transport(err.to_string()))?;

        let outcome = interpret(status, &bytes);
        if let Err(error) = &outcome {
            warn!(%error, "prediction service rejected request");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_takes_first_prediction() {
        let prediction = interpret(StatusCode::OK, br#"{"prediction":[231.4, 7.0]}"#)
            .expect("prediction parsed");
        assert_eq!(prediction.co2_emissions_g_per_km, 231.4);
    }

    #[test]
    fn empty_prediction_array_is_an_error() {
        assert!(matches!(
            interpret(StatusCode::OK, br#"{"prediction":[]}"#),
            Err(PredictionError::EmptyPrediction)
        ));
    }

    #[test]
    fn remote_error_message_is_surfaced() {
        match interpret(
            StatusCode::BAD_REQUEST,
            br#"{"error":"Expected 6 values, got 5"}"#,
        ) {
            Err(PredictionError::Remote { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Expected 6 values, got 5");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_failure_falls_back_to_generic_message() {
        match interpret(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>") {
            Err(PredictionError::Remote { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, GENERIC_REMOTE_ERROR);
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }
}
