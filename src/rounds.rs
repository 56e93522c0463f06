//! Turns raw round records and block timestamps into interval samples.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Unit that interval samples (and every duration-valued forecast setting) are expressed in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DurationUnit {
    Seconds,
    #[default]
    Minutes,
}

impl DurationUnit {
    pub fn convert_seconds(&self, seconds: f64) -> f64 {
        match self {
            DurationUnit::Seconds => seconds,
            DurationUnit::Minutes => seconds / 60.0,
        }
    }

    pub fn to_seconds(&self, value: f64) -> f64 {
        match self {
            DurationUnit::Seconds => value,
            DurationUnit::Minutes => value * 60.0,
        }
    }

    pub fn of(&self, duration: Duration) -> f64 {
        self.convert_seconds(duration.num_milliseconds() as f64 / 1000.0)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DurationUnit::Seconds => "s",
            DurationUnit::Minutes => "min",
        }
    }
}

/// One round as reported by the game API. Timestamps stay raw until parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RoundsPayload {
    data: RoundsData,
}

#[derive(Debug, Clone, Deserialize)]
struct RoundsData {
    array: Vec<RoundRecord>,
}

/// Parse the `{ "data": { "array": [...] } }` envelope the rounds endpoint returns.
pub fn parse_rounds(json: &str) -> Result<Vec<RoundRecord>> {
    let payload: RoundsPayload =
        serde_json::from_str(json).context("Failed to decode rounds payload")?;
    Ok(payload.data.array)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid timestamp '{value}': {err}"))
}

/// Durations of the most recent `last_n` completed rounds, oldest first.
///
/// Records are expected oldest first. Rounds missing either timestamp are skipped;
/// unparseable or inverted timestamps are skipped with a warning.
pub fn round_durations(rounds: &[RoundRecord], last_n: usize, unit: DurationUnit) -> Vec<f64> {
    let mut durations = Vec::with_capacity(last_n);

    for round in rounds.iter().rev() {
        if durations.len() >= last_n {
            break;
        }

        let (Some(started), Some(ended)) = (&round.started_at, &round.ended_at) else {
            continue;
        };

        let span = match (parse_timestamp(started), parse_timestamp(ended)) {
            (Ok(start), Ok(end)) => end - start,
            (Err(err), _) | (_, Err(err)) => {
                log_warn!("Skipping round: {err}");
                continue;
            }
        };

        if span < Duration::zero() {
            log_warn!("Skipping round that ends before it starts ({started} -> {ended})");
            continue;
        }

        durations.push(unit.of(span));
    }

    durations.reverse();
    durations
}

/// Start of the newest round that has not ended yet, if any.
pub fn open_round_start(rounds: &[RoundRecord]) -> Option<DateTime<Utc>> {
    let latest = rounds.last()?;
    if latest.ended_at.is_some() {
        return None;
    }
    let started = latest.started_at.as_deref()?;
    match parse_timestamp(started) {
        Ok(start) => Some(start),
        Err(err) => {
            log_warn!("Ignoring open round: {err}");
            None
        }
    }
}

/// A block header reduced to the field the interval maths needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockStamp {
    /// Unix seconds
    pub timestamp: i64,
}

pub fn parse_blocks(json: &str) -> Result<Vec<BlockStamp>> {
    serde_json::from_str(json).context("Failed to decode block list")
}

/// Gaps between consecutive block timestamps, oldest first, keeping the newest `last_n`.
///
/// Input order does not matter; miners may publish slightly out-of-order timestamps, so
/// the stamps are sorted first and every gap is therefore non-negative.
pub fn block_intervals(blocks: &[BlockStamp], last_n: usize, unit: DurationUnit) -> Vec<f64> {
    let mut stamps: Vec<i64> = blocks.iter().map(|block| block.timestamp).collect();
    stamps.sort_unstable();

    let gaps: Vec<f64> = stamps
        .windows(2)
        .map(|pair| unit.convert_seconds((pair[1] - pair[0]) as f64))
        .collect();

    let skip = gaps.len().saturating_sub(last_n);
    gaps[skip..].to_vec()
}

/// Timestamp of the newest block, if any.
pub fn latest_block_time(blocks: &[BlockStamp]) -> Option<DateTime<Utc>> {
    let newest = blocks.iter().map(|block| block.timestamp).max()?;
    DateTime::from_timestamp(newest, 0)
}
