pub mod config;
pub mod decimal;
pub mod error;
pub mod impact;
pub mod ledger;
pub mod prediction;
pub mod rating;
pub mod telemetry;

pub use error::AppError;
