use chrono::Utc;
use clap::Args;
use ecomart::config::AppConfig;
use ecomart::error::AppError;
use ecomart::impact::{format_compact, GlobalImpactStats};
use ecomart::ledger::{CreditLedger, MemoryStore, RedeemedReward};
use ecomart::prediction::{
    EmissionPredictor, FuelType, HttpPredictionClient, VehicleFeatures, ENGINE_SIZE_BINS,
};
use ecomart::rating::labels::{category_label, vehicle_class_label};
use ecomart::rating::{RatingRequest, RatingResult};
use ecomart::telemetry;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct RateArgs {
    /// Vehicle class as listed in the emission table, e.g. "MINIVAN" or "VAN - CARGO"
    #[arg(long)]
    pub(crate) vehicle_class: String,
    /// Delivery distance in kilometres
    #[arg(long)]
    pub(crate) distance_km: f64,
    /// Parcel weight in kilograms
    #[arg(long)]
    pub(crate) weight_kg: f64,
    /// Product category; unknown categories use the default factor
    #[arg(long, default_value = "default")]
    pub(crate) category: String,
    /// JSON file replacing the built-in rating tables
    #[arg(long)]
    pub(crate) tables: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// One of the model's vehicle classes, e.g. COMPACT or SUV
    #[arg(long)]
    pub(crate) vehicle_class: String,
    #[arg(long)]
    pub(crate) cylinders: u32,
    /// Fuel code: X, Z, D, E, or N
    #[arg(long, value_parser = parse_fuel_type)]
    pub(crate) fuel_type: FuelType,
    /// Engine displacement in litres
    #[arg(long)]
    pub(crate) engine_size: f64,
    /// Engine size bin value (1.5, 2.5, 3.5, 4.5, or 6.5)
    #[arg(long)]
    pub(crate) engine_cylinders: String,
    #[arg(long)]
    pub(crate) engine_power_ratio: f64,
    /// Override PREDICTION_URL for this call
    #[arg(long)]
    pub(crate) url: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Credits earned by the sample shopper before redeeming a reward
    #[arg(long, default_value_t = 40)]
    pub(crate) earn: u64,
    /// Skip the ledger portion of the demo.
    #[arg(long)]
    pub(crate) skip_ledger: bool,
}

fn parse_fuel_type(value: &str) -> Result<FuelType, String> {
    FuelType::from_code(value).ok_or_else(|| format!("unknown fuel code `{value}`"))
}

fn cli_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init_for_cli(&config.telemetry)?;
    Ok(config)
}

pub(crate) fn run_rate(args: RateArgs) -> Result<(), AppError> {
    let RateArgs {
        vehicle_class,
        distance_km,
        weight_kg,
        category,
        tables,
    } = args;

    let mut config = cli_config()?;
    if tables.is_some() {
        config.storage.rating_tables_path = tables;
    }
    let engine = crate::infra::rating_engine(&config)?;

    let request = RatingRequest {
        vehicle_class,
        distance_km,
        weight_kg,
        category,
    };
    let result = engine.rate(&request)?;
    render_rating(&request, &result);
    Ok(())
}

pub(crate) async fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs {
        vehicle_class,
        cylinders,
        fuel_type,
        engine_size,
        engine_cylinders,
        engine_power_ratio,
        url,
    } = args;

    let mut config = cli_config()?;
    if let Some(url) = url {
        config.prediction.endpoint = url;
    }
    let client = HttpPredictionClient::new(&config.prediction)?;

    let features = VehicleFeatures {
        vehicle_class,
        cylinders,
        fuel_type,
        engine_size,
        engine_cylinders,
        engine_power_ratio,
    };
    let prediction = client.predict(&features).await?;

    let bin_label = ENGINE_SIZE_BINS
        .iter()
        .find(|(value, _)| *value == features.engine_cylinders)
        .map(|&(_, label)| label)
        .unwrap_or("custom");

    println!("Vehicle emissions estimate");
    println!("  Endpoint: {}", client.endpoint());
    println!(
        "  {} | {} cylinders | {} | {:.1}L ({bin_label})",
        features.vehicle_class,
        features.cylinders,
        features.fuel_type.label(),
        features.engine_size
    );
    println!(
        "  Predicted CO2: {:.2} g/km",
        prediction.co2_emissions_g_per_km
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { earn, skip_ledger } = args;
    let config = cli_config()?;
    let engine = crate::infra::rating_engine(&config)?;

    println!("EcoMart sustainability demo");
    let samples = [
        RatingRequest {
            vehicle_class: "MINIVAN".to_string(),
            distance_km: 500.0,
            weight_kg: 10.0,
            category: "grocery".to_string(),
        },
        RatingRequest {
            vehicle_class: "PICKUP TRUCK - STANDARD".to_string(),
            distance_km: 5.0,
            weight_kg: 5.0,
            category: "electronics".to_string(),
        },
    ];
    for request in &samples {
        let result = engine.rate(request)?;
        render_rating(request, &result);
    }

    if skip_ledger {
        return Ok(());
    }

    let mut ledger = CreditLedger::load(Arc::new(MemoryStore::new()))?;
    println!("\nCarbon-credit walkthrough");
    println!("  Starting balance: {} credits", ledger.credits());

    let balance = ledger.add_credits(earn)?;
    println!("  Earned {earn} credits for a low-impact delivery -> {balance}");

    let balance = ledger.spend_credits(20)?;
    println!("  Spent 20 credits on an eco-packaging upgrade -> {balance}");

    let reward = RedeemedReward {
        id: "tree-planting".to_string(),
        title: "Plant a tree in your name".to_string(),
        cost: 100,
        redeemed_at: None,
    };
    let title = reward.title.clone();
    let balance = ledger.redeem(reward)?;
    println!("  Redeemed \"{title}\" -> {balance} credits remaining");

    let stats = GlobalImpactStats::demo();
    println!("\nCommunity impact");
    println!(
        "  {} kg CO2 saved | {} eco purchases | {} customers helped | {} trees equivalent",
        format_compact(stats.total_carbon_saved_kg),
        format_compact(stats.total_eco_purchases as f64),
        format_compact(stats.total_customers_helped as f64),
        stats.trees_equivalent
    );
    println!("  Snapshot taken {}", Utc::now().format("%Y-%m-%d %H:%M UTC"));

    Ok(())
}

fn render_rating(request: &RatingRequest, result: &RatingResult) {
    println!(
        "\n{} | {} km | {} kg | {}",
        vehicle_class_label(&request.vehicle_class),
        request.distance_km,
        request.weight_kg,
        category_label(&request.category)
    );
    println!(
        "  Emission factor: {:.2} g/km (category x{})",
        result.emission_factor_g_per_km, result.category_factor
    );
    println!("  Raw emission: {:.2} kg CO2", result.raw_emission_display());
    println!(
        "  Adjusted emission: {:.2} kg CO2",
        result.adjusted_emission_display()
    );
    println!("  Eco grade: {} ({})", result.grade, result.grade.label());
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecomart::rating::RatingEngine;

    #[test]
    fn fuel_codes_parse_case_insensitively() {
        assert_eq!(parse_fuel_type("d"), Ok(FuelType::Diesel));
        assert!(parse_fuel_type("Q").is_err());
    }

    #[test]
    fn demo_samples_rate_against_standard_tables() {
        let engine = RatingEngine::standard();
        let request = RatingRequest {
            vehicle_class: "MINIVAN".to_string(),
            distance_km: 500.0,
            weight_kg: 10.0,
            category: "grocery".to_string(),
        };
        let result = engine.rate(&request).expect("minivan rates");
        assert_eq!(result.grade.letter(), 'B');
    }
}
