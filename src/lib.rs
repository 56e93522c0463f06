pub mod booster;
pub mod cli;
pub mod error;
pub mod forecast;
pub mod rounds;
pub mod settings;
mod utils;

use clap::Parser;

pub use booster::{plan, AccrualModel, Booster, PlanResult, Standing};
pub use error::{CoreError, CoreResult};
pub use forecast::{estimate_next, DurationWindow, ForecastConfig, ForecastResult, Phase, Trend};

pub fn run() -> anyhow::Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("roundwatch starting up...");

    cli::execute(cli::Cli::parse())
}
