//! Command-line front end: read raw API dumps, print forecasts and booster plans.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;

use crate::booster::{plan_targets, PlanResult, Standing, TargetPlan};
use crate::forecast::{estimate_next, Countdown, DurationWindow, ForecastResult};
use crate::rounds::{
    block_intervals, latest_block_time, open_round_start, parse_blocks, parse_rounds,
    round_durations, DurationUnit,
};
use crate::settings::SettingsStore;

#[derive(Parser)]
#[command(name = "roundwatch")]
#[command(about = "Round length forecasts and booster plans", long_about = None)]
pub struct Cli {
    /// Settings file (JSON); defaults are used when it does not exist
    #[arg(short, long, global = true, default_value = "roundwatch.json")]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Forecast the next round from a rounds API dump
    Forecast {
        /// JSON file shaped like `{ "data": { "array": [ { "startedAt", "endedAt" } ] } }`
        #[arg(short, long)]
        rounds: PathBuf,
    },

    /// Forecast the next block interval from a list of block timestamps
    Blocks {
        /// JSON array of `{ "timestamp": <unix seconds> }`
        #[arg(short, long)]
        timestamps: PathBuf,
    },

    /// Work out what each booster needs to reach one or more target scores
    #[command(allow_negative_numbers = true)]
    Plan {
        /// Current score
        #[arg(short, long)]
        current: f64,

        /// Target score; repeat for several ranks
        #[arg(short, long = "target", required = true)]
        targets: Vec<f64>,
    },
}

pub fn execute(cli: Cli) -> Result<()> {
    let store = SettingsStore::new(cli.settings.clone())?;
    info!("Loaded settings from {}", cli.settings.display());

    match cli.command {
        Commands::Forecast { rounds } => {
            let records = parse_rounds(&read_input(&rounds)?)?;
            let settings = store.settings();
            let durations = round_durations(
                &records,
                settings.forecast.capacity,
                settings.duration_unit,
            );

            let mut window = DurationWindow::from_config(&settings.forecast)?;
            window.extend(durations.iter().copied())?;
            let forecast = estimate_next(&window, &settings.forecast);

            let countdown = open_round_start(&records).map(|started| {
                Countdown::since(
                    forecast.point_estimate,
                    settings.duration_unit,
                    started,
                    Utc::now(),
                )
            });

            print!(
                "{}",
                forecast_report("Round", &window, &forecast, countdown, settings.duration_unit)
            );
        }
        Commands::Blocks { timestamps } => {
            let blocks = parse_blocks(&read_input(&timestamps)?)?;
            let settings = store.settings();
            let intervals =
                block_intervals(&blocks, settings.forecast.capacity, settings.duration_unit);

            let mut window = DurationWindow::from_config(&settings.forecast)?;
            window.extend(intervals.iter().copied())?;
            let forecast = estimate_next(&window, &settings.forecast);

            let countdown = latest_block_time(&blocks).map(|found| {
                Countdown::since(
                    forecast.point_estimate,
                    settings.duration_unit,
                    found,
                    Utc::now(),
                )
            });

            print!(
                "{}",
                forecast_report("Block gap", &window, &forecast, countdown, settings.duration_unit)
            );
        }
        Commands::Plan { current, targets } => {
            let plans = plan_targets(current, &targets, &store.boosters());
            print!("{}", plan_report(current, &plans));
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn forecast_report(
    label: &str,
    window: &DurationWindow,
    forecast: &ForecastResult,
    countdown: Option<Countdown>,
    unit: DurationUnit,
) -> String {
    let suffix = unit.as_str();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{label} lengths, oldest first ({} samples, {suffix}):",
        window.len()
    );
    for (i, value) in window.as_slice().iter().enumerate() {
        let _ = writeln!(out, "  {} {}: {value:.2}", label, i + 1);
    }

    let _ = writeln!(out, "Average: {:.2} {suffix}", window.mean());
    let _ = writeln!(
        out,
        "Forecast: {:.2} {suffix} ({} phase, trend {})",
        forecast.point_estimate,
        forecast.phase.as_str(),
        forecast.trend.as_str()
    );
    if forecast.low_confidence {
        let _ = writeln!(out, "Warning: low confidence, fewer samples than required");
    }

    match countdown {
        Some(Countdown::Remaining(left)) => {
            let _ = writeln!(out, "Remaining: {}", format_secs(left.num_seconds() as f64));
        }
        Some(Countdown::Overdue(over)) => {
            let _ = writeln!(out, "Overdue by: {}", format_secs(over.num_seconds() as f64));
        }
        None => {}
    }

    out
}

pub fn plan_report(current: f64, plans: &[TargetPlan]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Current score: {current:.0}");

    for (rank, target) in plans.iter().enumerate() {
        match target.standing {
            Standing::AlreadyAhead { lead } => {
                let _ = writeln!(
                    out,
                    "Target #{} ({:.0}): already ahead by {lead:.0}",
                    rank + 1,
                    target.target
                );
            }
            Standing::Behind { deficit } => {
                let _ = writeln!(
                    out,
                    "Target #{} ({:.0}): behind by {deficit:.0}",
                    rank + 1,
                    target.target
                );
                for plan in &target.plans {
                    let line = match &plan.result {
                        Ok(result) => describe_plan(result),
                        Err(err) => format!("not plannable ({err})"),
                    };
                    let _ = writeln!(out, "  {} [{}]: {line}", plan.name, plan.kind);
                }
            }
        }
    }

    out
}

fn describe_plan(result: &PlanResult) -> String {
    match result.units_needed {
        Some(units) if result.time_needed_secs > 0.0 => {
            format!("{units} use(s) over {}", format_secs(result.time_needed_secs))
        }
        Some(units) => format!("{units} use(s)"),
        None => format!("{} of accrual", format_secs(result.time_needed_secs)),
    }
}

fn format_secs(secs: f64) -> String {
    let total = secs.max(0.0).ceil() as u64;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
