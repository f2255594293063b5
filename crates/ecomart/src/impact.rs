//! Storefront-wide sustainability counters shown on the impact banner.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::decimal::to_fixed;
use crate::ledger::{KeyValueStore, SharedLedger};
use crate::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalImpactStats {
    pub total_carbon_saved_kg: f64,
    pub total_eco_purchases: u64,
    pub total_customers_helped: u64,
    pub trees_equivalent: u64,
}

impl GlobalImpactStats {
    /// Shown when no live statistics source is connected.
    pub fn demo() -> Self {
        Self {
            total_carbon_saved_kg: 1247.5,
            total_eco_purchases: 3420,
            total_customers_helped: 892,
            trees_equivalent: 62,
        }
    }
}

impl Default for GlobalImpactStats {
    fn default() -> Self {
        Self::demo()
    }
}

/// `1_500_000` → `1.5M`, `3420` → `3.4K`, smaller values are printed as-is.
pub fn format_compact(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{}M", to_fixed(value / 1_000_000.0, 1))
    } else if value >= 1_000.0 {
        format!("{}K", to_fixed(value / 1_000.0, 1))
    } else if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let fixed = format!("{value:.3}");
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct ImpactLabels {
    pub carbon_saved: String,
    pub eco_purchases: String,
    pub customers_helped: String,
    pub trees: String,
    pub credits_balance: String,
}

#[derive(Debug, Serialize)]
pub struct ImpactResponse {
    pub stats: GlobalImpactStats,
    pub carbon_credits: u64,
    pub labels: ImpactLabels,
}

impl ImpactResponse {
    pub fn new(stats: GlobalImpactStats, carbon_credits: u64) -> Self {
        let labels = ImpactLabels {
            carbon_saved: format_compact(stats.total_carbon_saved_kg),
            eco_purchases: format_compact(stats.total_eco_purchases as f64),
            customers_helped: format_compact(stats.total_customers_helped as f64),
            trees: format_compact(stats.trees_equivalent as f64),
            credits_balance: format_compact(carbon_credits as f64),
        };
        Self {
            stats,
            carbon_credits,
            labels,
        }
    }
}

pub fn impact_router<S>(ledger: SharedLedger<S>) -> Router
where
    S: KeyValueStore + 'static,
{
    Router::new()
        .route("/api/v1/impact", get(impact_handler::<S>))
        .with_state(ledger)
}

async fn impact_handler<S>(
    State(ledger): State<SharedLedger<S>>,
) -> Result<Json<ImpactResponse>, AppError>
where
    S: KeyValueStore + 'static,
{
    let credits = ledger
        .lock()
        .map(|guard| guard.credits())
        .map_err(|_| AppError::Unavailable("ledger"))?;
    Ok(Json(ImpactResponse::new(GlobalImpactStats::demo(), credits)))
}
