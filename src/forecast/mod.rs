pub mod config;
pub mod estimator;
pub mod remaining;
pub mod window;

pub use config::ForecastConfig;
pub use estimator::{estimate_intervals, estimate_next, ForecastResult, Phase, Trend};
pub use remaining::Countdown;
pub use window::{DurationWindow, SharedWindow};
