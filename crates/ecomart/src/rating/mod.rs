//! Delivery eco-rating: vehicle emission rate, distance, weight, and product category mapped to
//! an A–E grade.

mod grade;
pub mod labels;
pub mod router;
mod tables;

pub use grade::{EcoGrade, GradeBound, GradeThresholds};
pub use router::rating_router;
pub use tables::{
    CategoryAdjustmentTable, CategoryFactor, RatingTables, TableError, VehicleEmission,
    VehicleEmissionTable, DEFAULT_CATEGORY,
};

use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

/// Rejected rating inputs. No partial result accompanies either variant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("Please enter valid positive numbers for distance and weight.")]
    InvalidInput { distance_km: f64, weight_kg: f64 },
    #[error("Invalid vehicle type selected or no simulated emission data.")]
    UnknownVehicleClass(String),
}

/// Inputs for a single rating, as submitted by a form or API client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRequest {
    pub vehicle_class: String,
    pub distance_km: f64,
    pub weight_kg: f64,
    pub category: String,
}

/// Computed rating. Emissions keep full precision in memory and serialize rounded to two places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingResult {
    #[serde(serialize_with = "serialize_rounded")]
    pub emission_factor_g_per_km: f64,
    pub category_factor: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub raw_emission_kg: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub adjusted_emission_kg: f64,
    pub grade: EcoGrade,
}

impl RatingResult {
    pub fn raw_emission_display(&self) -> f64 {
        round_to_hundredths(self.raw_emission_kg)
    }

    pub fn adjusted_emission_display(&self) -> f64 {
        round_to_hundredths(self.adjusted_emission_kg)
    }
}

/// Two-decimal display value, rounded like the calculator's `toFixed(2)`.
pub fn round_to_hundredths(value: f64) -> f64 {
    crate::decimal::round_to(value, 2)
}

fn serialize_rounded<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round_to_hundredths(*value))
}

/// Stateless evaluator over immutable lookup tables; share it freely across threads.
#[derive(Debug, Clone, Default)]
pub struct RatingEngine {
    tables: RatingTables,
}

impl RatingEngine {
    pub fn new(tables: RatingTables) -> Self {
        Self { tables }
    }

    pub fn standard() -> Self {
        Self::new(RatingTables::standard())
    }

    pub fn tables(&self) -> &RatingTables {
        &self.tables
    }

    pub fn compute_rating(
        &self,
        vehicle_class: &str,
        distance_km: f64,
        weight_kg: f64,
        category: &str,
    ) -> Result<RatingResult, RatingError> {
        if !is_positive(distance_km) || !is_positive(weight_kg) {
            return Err(RatingError::InvalidInput {
                distance_km,
                weight_kg,
            });
        }

        let emission_factor_g_per_km = self
            .tables
            .vehicles
            .rate_for(vehicle_class)
            .filter(|rate| *rate > 0.0)
            .ok_or_else(|| RatingError::UnknownVehicleClass(vehicle_class.to_string()))?;

        let co2_kg_per_km = emission_factor_g_per_km / 1000.0;
        let weight_tonnes = weight_kg / 1000.0;
        let raw_emission_kg = co2_kg_per_km * distance_km * weight_tonnes;

        let category_factor = self.tables.categories.factor_for(category);
        let adjusted_emission_kg = raw_emission_kg * category_factor;

        // Grade on the unrounded value so display rounding never moves a bucket.
        let grade = self.tables.thresholds.grade_for(adjusted_emission_kg);

        debug!(
            vehicle_class,
            distance_km,
            weight_kg,
            category,
            adjusted_emission_kg,
            %grade,
            "computed eco rating"
        );

        Ok(RatingResult {
            emission_factor_g_per_km,
            category_factor,
            raw_emission_kg,
            adjusted_emission_kg,
            grade,
        })
    }

    pub fn rate(&self, request: &RatingRequest) -> Result<RatingResult, RatingError> {
        self.compute_rating(
            &request.vehicle_class,
            request.distance_km,
            request.weight_kg,
            &request.category,
        )
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
