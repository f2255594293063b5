//! Client for the hosted vehicle-emissions model.
//!
//! The model accepts `{"input": [...]}` with six feature values in [`FEATURE_COLUMNS`] order and
//! answers `{"prediction": [f64]}` or `{"error": "..."}`.

mod client;
pub mod router;

pub use client::HttpPredictionClient;
pub use router::prediction_router;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const FEATURE_COLUMNS: [&str; 6] = [
    "Vehicle Class",
    "Cylinders",
    "Fuel Type",
    "Engine Size (Binned)",
    "Engine_Cylinders",
    "EnginePowerRatio",
];

pub const VEHICLE_CLASSES: [&str; 10] = [
    "COMPACT",
    "SUV",
    "MID-SIZE",
    "PICKUP TRUCK",
    "MINIVAN",
    "STATION WAGON",
    "TWO-SEATER",
    "SUBCOMPACT",
    "FULL-SIZE",
    "VAN",
];

/// Engine size bins and their display ranges.
pub const ENGINE_SIZE_BINS: [(&str, &str); 5] = [
    ("1.5", "1.0-2.0L"),
    ("2.5", "2.0-3.0L"),
    ("3.5", "3.0-4.0L"),
    ("4.5", "4.0-5.0L"),
    ("6.5", "5.0+L"),
];

pub const GENERIC_REMOTE_ERROR: &str = "Something went wrong";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuelType {
    #[serde(rename = "X")]
    RegularGasoline,
    #[serde(rename = "Z")]
    PremiumGasoline,
    #[serde(rename = "D")]
    Diesel,
    #[serde(rename = "E")]
    Ethanol,
    #[serde(rename = "N")]
    NaturalGas,
}

impl FuelType {
    pub const fn code(self) -> &'static str {
        match self {
            Self::RegularGasoline => "X",
            Self::PremiumGasoline => "Z",
            Self::Diesel => "D",
            Self::Ethanol => "E",
            Self::NaturalGas => "N",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RegularGasoline => "Regular Gasoline",
            Self::PremiumGasoline => "Premium Gasoline",
            Self::Diesel => "Diesel",
            Self::Ethanol => "Ethanol",
            Self::NaturalGas => "Natural Gas",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "X" => Some(Self::RegularGasoline),
            "Z" => Some(Self::PremiumGasoline),
            "D" => Some(Self::Diesel),
            "E" => Some(Self::Ethanol),
            "N" => Some(Self::NaturalGas),
            _ => None,
        }
    }
}

/// Vehicle attributes submitted to the emissions model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleFeatures {
    pub vehicle_class: String,
    pub cylinders: u32,
    pub fuel_type: FuelType,
    pub engine_size: f64,
    /// One of the [`ENGINE_SIZE_BINS`] values, sent as a string.
    pub engine_cylinders: String,
    pub engine_power_ratio: f64,
}

impl VehicleFeatures {
    pub fn validate(&self) -> Result<(), PredictionError> {
        if !VEHICLE_CLASSES.contains(&self.vehicle_class.as_str()) {
            return Err(PredictionError::invalid(
                "vehicle_class",
                format!("unknown vehicle class '{}'", self.vehicle_class),
            ));
        }
        if self.cylinders == 0 {
            return Err(PredictionError::invalid(
                "cylinders",
                "must be at least 1".to_string(),
            ));
        }
        if !(self.engine_size.is_finite() && self.engine_size > 0.0) {
            return Err(PredictionError::invalid(
                "engine_size",
                "must be a positive number".to_string(),
            ));
        }
        if !ENGINE_SIZE_BINS
            .iter()
            .any(|(value, _)| *value == self.engine_cylinders)
        {
            return Err(PredictionError::invalid(
                "engine_cylinders",
                format!("unknown engine size bin '{}'", self.engine_cylinders),
            ));
        }
        if !(self.engine_power_ratio.is_finite() && self.engine_power_ratio >= 0.0) {
            return Err(PredictionError::invalid(
                "engine_power_ratio",
                "must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// Request body in [`FEATURE_COLUMNS`] order.
    pub fn to_payload(&self) -> Value {
        json!({
            "input": [
                self.vehicle_class,
                self.cylinders,
                self.fuel_type.code(),
                self.engine_size,
                self.engine_cylinders,
                self.engine_power_ratio,
            ]
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub co2_emissions_g_per_km: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("invalid {field}: {reason}")]
    InvalidFeature { field: &'static str, reason: String },
    #[error("prediction service error ({status}): {message}")]
    Remote { status: u16, message: String },
    #[error("prediction service returned no values")]
    EmptyPrediction,
    #[error("prediction service unreachable: {0}")]
    Transport(String),
}

impl PredictionError {
    fn invalid(field: &'static str, reason: String) -> Self {
        Self::InvalidFeature { field, reason }
    }
}

/// Anything that can turn vehicle features into an emissions estimate.
#[async_trait]
pub trait EmissionPredictor: Send + Sync {
    async fn predict(&self, features: &VehicleFeatures) -> Result<Prediction, PredictionError>;
}
