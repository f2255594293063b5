use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::grade::{EcoGrade, GradeBound, GradeThresholds};

pub const DEFAULT_CATEGORY: &str = "default";

/// Problems detected while building or loading rating tables.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("emission rate for '{vehicle_class}' must be positive and finite, got {rate}")]
    NonPositiveRate { vehicle_class: String, rate: f64 },
    #[error("vehicle class '{0}' listed more than once")]
    DuplicateVehicleClass(String),
    #[error("adjustment factor for '{category}' must be positive and finite, got {factor}")]
    NonPositiveFactor { category: String, factor: f64 },
    #[error("category '{0}' listed more than once")]
    DuplicateCategory(String),
    #[error("category table is missing the '{DEFAULT_CATEGORY}' entry")]
    MissingDefaultCategory,
    #[error("grade bound must be finite, got {0}")]
    NonFiniteBound(f64),
    #[error("grade bounds must strictly increase ({previous} then {next})")]
    UnorderedBounds { previous: f64, next: f64 },
    #[error("grades must worsen as emissions rise ({previous} then {next})")]
    UnorderedGrades { previous: EcoGrade, next: EcoGrade },
    #[error("failed to read rating tables: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rating tables document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid vehicle emission CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// CO₂ rate in g/km for one vehicle class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleEmission {
    #[serde(rename = "Vehicle Class", alias = "vehicle_class")]
    pub vehicle_class: String,
    #[serde(rename = "CO2 g/km", alias = "g_per_km")]
    pub g_per_km: f64,
}

/// Vehicle class to emission rate. Lookups are exact; listing order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleEmissionTable {
    entries: Vec<VehicleEmission>,
}

impl VehicleEmissionTable {
    pub fn new(entries: Vec<VehicleEmission>) -> Result<Self, TableError> {
        let mut seen: Vec<&str> = Vec::with_capacity(entries.len());
        for entry in &entries {
            if !(entry.g_per_km.is_finite() && entry.g_per_km > 0.0) {
                return Err(TableError::NonPositiveRate {
                    vehicle_class: entry.vehicle_class.clone(),
                    rate: entry.g_per_km,
                });
            }
            if seen.contains(&entry.vehicle_class.as_str()) {
                return Err(TableError::DuplicateVehicleClass(
                    entry.vehicle_class.clone(),
                ));
            }
            seen.push(&entry.vehicle_class);
        }
        Ok(Self { entries })
    }

    /// Representative averages per vehicle class, standing in for a trained model.
    pub fn standard() -> Self {
        let entries = [
            ("PICKUP TRUCK - STANDARD", 290.0),
            ("STATION WAGON - SMALL", 200.0),
            ("PICKUP TRUCK - SMALL", 260.0),
            ("MINIVAN", 240.0),
            ("SPECIAL PURPOSE VEHICLE", 250.0),
            ("VAN - PASSENGER", 300.0),
            ("STATION WAGON - MID-SIZE", 245.0),
            ("VAN - CARGO", 280.0),
        ]
        .into_iter()
        .map(|(vehicle_class, g_per_km)| VehicleEmission {
            vehicle_class: vehicle_class.to_string(),
            g_per_km,
        })
        .collect();
        Self { entries }
    }

    /// Reads a `Vehicle Class,CO2 g/km` CSV export.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries = Vec::new();
        for row in csv_reader.deserialize::<VehicleEmission>() {
            entries.push(row?);
        }
        Self::new(entries)
    }

    pub fn rate_for(&self, vehicle_class: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.vehicle_class == vehicle_class)
            .map(|entry| entry.g_per_km)
    }

    pub fn entries(&self) -> &[VehicleEmission] {
        &self.entries
    }
}

impl Default for VehicleEmissionTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Packaging/handling multiplier for one product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFactor {
    pub category: String,
    pub factor: f64,
}

/// Case-insensitive category multipliers. Unknown categories use the `default` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAdjustmentTable {
    entries: Vec<CategoryFactor>,
    default_factor: f64,
}

impl CategoryAdjustmentTable {
    pub fn new(entries: Vec<CategoryFactor>) -> Result<Self, TableError> {
        let mut normalized: Vec<CategoryFactor> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !(entry.factor.is_finite() && entry.factor > 0.0) {
                return Err(TableError::NonPositiveFactor {
                    category: entry.category,
                    factor: entry.factor,
                });
            }
            let category = entry.category.to_lowercase();
            if normalized.iter().any(|existing| existing.category == category) {
                return Err(TableError::DuplicateCategory(category));
            }
            normalized.push(CategoryFactor {
                category,
                factor: entry.factor,
            });
        }

        let default_factor = normalized
            .iter()
            .find(|entry| entry.category == DEFAULT_CATEGORY)
            .map(|entry| entry.factor)
            .ok_or(TableError::MissingDefaultCategory)?;

        Ok(Self {
            entries: normalized,
            default_factor,
        })
    }

    pub fn standard() -> Self {
        let entries = [
            ("electronics", 1.0),
            ("furniture", 1.0),
            ("fashion", 0.8),
            ("stationery", 0.6),
            ("home_appliance", 1.2),
            ("grocery", 0.5),
            (DEFAULT_CATEGORY, 1.0),
        ]
        .into_iter()
        .map(|(category, factor)| CategoryFactor {
            category: category.to_string(),
            factor,
        })
        .collect();
        Self {
            entries,
            default_factor: 1.0,
        }
    }

    /// Never fails: a miss falls back to the default multiplier.
    pub fn factor_for(&self, category: &str) -> f64 {
        let key = category.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.category == key)
            .map(|entry| entry.factor)
            .unwrap_or(self.default_factor)
    }

    pub fn default_factor(&self) -> f64 {
        self.default_factor
    }

    pub fn entries(&self) -> &[CategoryFactor] {
        &self.entries
    }
}

impl Default for CategoryAdjustmentTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// On-disk shape of a rating tables override file.
#[derive(Debug, Deserialize)]
struct RatingTablesDocument {
    vehicle_emissions: Vec<VehicleEmission>,
    category_factors: Vec<CategoryFactor>,
    #[serde(default)]
    grade_bounds: Option<Vec<GradeBound>>,
    #[serde(default)]
    final_grade: Option<EcoGrade>,
}

/// The three static lookup tables the rating engine is built from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatingTables {
    pub vehicles: VehicleEmissionTable,
    pub categories: CategoryAdjustmentTable,
    pub thresholds: GradeThresholds,
}

impl RatingTables {
    pub fn standard() -> Self {
        Self::default()
    }

    /// Grade bounds are optional in the document and default to the standard set.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let document: RatingTablesDocument = serde_json::from_reader(reader)?;
        let vehicles = VehicleEmissionTable::new(document.vehicle_emissions)?;
        let categories = CategoryAdjustmentTable::new(document.category_factors)?;
        let thresholds = match document.grade_bounds {
            Some(bounds) => {
                GradeThresholds::new(bounds, document.final_grade.unwrap_or(EcoGrade::E))?
            }
            None => GradeThresholds::standard(),
        };

        Ok(Self {
            vehicles,
            categories,
            thresholds,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let file = File::open(path)?;
        Self::from_json_reader(file)
    }
}
