use crate::demo::{run_demo, run_predict, run_rate, DemoArgs, PredictArgs, RateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use ecomart::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "EcoMart Sustainability Service",
    about = "Serve and exercise EcoMart's eco-rating, carbon-credit, and emissions tooling",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute a delivery eco-rating from the lookup tables
    Rate(RateArgs),
    /// Ask the hosted emissions model for a vehicle CO2 estimate
    Predict(PredictArgs),
    /// Walk through a rating and a carbon-credit redemption on an in-memory ledger
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Rate(args) => run_rate(args),
        Command::Predict(args) => run_predict(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rate_arguments() {
        let cli = Cli::try_parse_from([
            "ecomart-api",
            "rate",
            "--vehicle-class",
            "MINIVAN",
            "--distance-km",
            "500",
            "--weight-kg",
            "10",
            "--category",
            "grocery",
        ])
        .expect("rate arguments parse");

        match cli.command {
            Some(Command::Rate(args)) => {
                assert_eq!(args.vehicle_class, "MINIVAN");
                assert_eq!(args.distance_km, 500.0);
                assert_eq!(args.category, "grocery");
            }
            other => panic!("expected rate command, got {other:?}"),
        }
    }

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["ecomart-api"]).expect("no arguments parse");
        assert!(cli.command.is_none());
    }
}
