use serde::{Deserialize, Serialize};
use std::fmt;

use super::tables::TableError;

/// Ordinal eco grade, A best and E worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EcoGrade {
    A,
    B,
    C,
    D,
    E,
}

impl EcoGrade {
    pub const fn ordered() -> [Self; 5] {
        [Self::A, Self::B, Self::C, Self::D, Self::E]
    }

    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "Very low impact",
            Self::B => "Low impact",
            Self::C => "Moderate impact",
            Self::D => "Higher impact",
            Self::E => "Significant impact",
        }
    }
}

impl fmt::Display for EcoGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One finite bucket: emissions at or below `upper_bound_kg` earn `grade`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeBound {
    pub upper_bound_kg: f64,
    pub grade: EcoGrade,
}

/// Ascending grade buckets with an unbounded catch-all at the end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeThresholds {
    bounds: Vec<GradeBound>,
    final_grade: EcoGrade,
}

impl GradeThresholds {
    pub fn new(bounds: Vec<GradeBound>, final_grade: EcoGrade) -> Result<Self, TableError> {
        let mut previous: Option<&GradeBound> = None;
        for bound in &bounds {
            if !bound.upper_bound_kg.is_finite() {
                return Err(TableError::NonFiniteBound(bound.upper_bound_kg));
            }
            if let Some(prev) = previous {
                if bound.upper_bound_kg <= prev.upper_bound_kg {
                    return Err(TableError::UnorderedBounds {
                        previous: prev.upper_bound_kg,
                        next: bound.upper_bound_kg,
                    });
                }
                if bound.grade <= prev.grade {
                    return Err(TableError::UnorderedGrades {
                        previous: prev.grade,
                        next: bound.grade,
                    });
                }
            }
            previous = Some(bound);
        }
        if let Some(last) = previous {
            if final_grade <= last.grade {
                return Err(TableError::UnorderedGrades {
                    previous: last.grade,
                    next: final_grade,
                });
            }
        }

        Ok(Self {
            bounds,
            final_grade,
        })
    }

    /// kg CO₂ per unit: ≤0.2 A, ≤0.7 B, ≤2.0 C, ≤5.0 D, otherwise E.
    pub fn standard() -> Self {
        let bounds = vec![
            GradeBound {
                upper_bound_kg: 0.2,
                grade: EcoGrade::A,
            },
            GradeBound {
                upper_bound_kg: 0.7,
                grade: EcoGrade::B,
            },
            GradeBound {
                upper_bound_kg: 2.0,
                grade: EcoGrade::C,
            },
            GradeBound {
                upper_bound_kg: 5.0,
                grade: EcoGrade::D,
            },
        ];
        Self {
            bounds,
            final_grade: EcoGrade::E,
        }
    }

    pub fn bounds(&self) -> &[GradeBound] {
        &self.bounds
    }

    pub fn final_grade(&self) -> EcoGrade {
        self.final_grade
    }

    /// First bound that the emission does not exceed wins.
    pub fn grade_for(&self, emission_kg: f64) -> EcoGrade {
        self.bounds
            .iter()
            .find(|bound| emission_kg <= bound.upper_bound_kg)
            .map(|bound| bound.grade)
            .unwrap_or(self.final_grade)
    }
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self::standard()
    }
}
