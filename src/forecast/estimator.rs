use serde::{Deserialize, Serialize};

use crate::forecast::config::ForecastConfig;
use crate::forecast::window::DurationWindow;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Qualitative bucket for the forecast length.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Short,
    Standard,
    Long,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Short => "short",
            Phase::Standard => "standard",
            Phase::Long => "long",
        }
    }
}

/// Direction of the least-squares trend over the window. `Steady` means no adjustment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    Steady,
    Rising,
    Falling,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Steady => "steady",
            Trend::Rising => "rising",
            Trend::Falling => "falling",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub point_estimate: f64,
    pub phase: Phase,
    pub trend: Trend,
    /// Set when fewer than `min_samples` intervals were available and the estimate is a plain mean.
    pub low_confidence: bool,
    pub sample_count: usize,
}

/// Forecast the next interval from the window contents.
pub fn estimate_next(window: &DurationWindow, config: &ForecastConfig) -> ForecastResult {
    estimate_intervals(window.as_slice(), config)
}

/// Forecast the next interval from a chronological (oldest first) slice.
///
/// Never fails: short input degrades to a plain mean flagged `low_confidence`.
pub fn estimate_intervals(intervals: &[f64], config: &ForecastConfig) -> ForecastResult {
    let sample_count = intervals.len();

    if sample_count == 0 {
        log_warn!("No intervals observed yet; forecast defaults to 0");
        return ForecastResult {
            point_estimate: 0.0,
            phase: Phase::Standard,
            trend: Trend::Steady,
            low_confidence: true,
            sample_count,
        };
    }

    if sample_count < config.min_samples {
        let mean = intervals.iter().sum::<f64>() / sample_count as f64;
        log_warn!(
            "Only {sample_count} interval(s) observed (need {}); using plain mean {mean:.2}",
            config.min_samples
        );
        return ForecastResult {
            point_estimate: mean,
            phase: classify_phase(mean, config),
            trend: Trend::Steady,
            low_confidence: true,
            sample_count,
        };
    }

    // Step 1: Drop one min and one max on long enough windows
    let trimmed = if sample_count > config.trim_above_len {
        trim_extremes(intervals)
    } else {
        intervals.to_vec()
    };

    // Step 2: Recency-weighted mean over what remains
    let mut estimate = weighted_mean(&trimmed, config.weight_start, config.weight_end);

    // Step 3: Trend adjustment, fitted on the untrimmed window
    let slope = least_squares_slope(intervals);
    let trend = if slope > config.trend_slope_threshold {
        estimate += config.trend_bump;
        Trend::Rising
    } else if slope < -config.trend_slope_threshold {
        estimate -= config.trend_bump;
        Trend::Falling
    } else {
        Trend::Steady
    };

    // Step 4: Floor
    let point_estimate = estimate.max(config.estimate_floor);

    log_debug!(
        "Forecast over {sample_count} intervals: trimmed to {}, slope {slope:.4}, estimate {point_estimate:.2}",
        trimmed.len()
    );

    ForecastResult {
        point_estimate,
        phase: classify_phase(point_estimate, config),
        trend,
        low_confidence: false,
        sample_count,
    }
}

pub fn classify_phase(value: f64, config: &ForecastConfig) -> Phase {
    if value < config.short_below {
        Phase::Short
    } else if value > config.long_above {
        Phase::Long
    } else {
        Phase::Standard
    }
}

/// Remove exactly one minimum and one maximum, keeping the rest in order.
///
/// Ties resolve to the earliest occurrence; when every value is equal the first two go.
pub fn trim_extremes(values: &[f64]) -> Vec<f64> {
    if values.len() < 2 {
        return values.to_vec();
    }

    let mut min_idx = 0;
    for (i, value) in values.iter().enumerate() {
        if *value < values[min_idx] {
            min_idx = i;
        }
    }

    let mut max_idx = if min_idx == 0 { 1 } else { 0 };
    for (i, value) in values.iter().enumerate() {
        if i != min_idx && *value > values[max_idx] {
            max_idx = i;
        }
    }

    values
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != min_idx && *i != max_idx)
        .map(|(_, value)| *value)
        .collect()
}

/// Weighted mean with weights rising linearly from `start` (first) to `end` (last).
pub fn weighted_mean(values: &[f64], start: f64, end: f64) -> f64 {
    match values.len() {
        0 => 0.0,
        1 => values[0],
        n => {
            let step = (end - start) / (n - 1) as f64;
            let mut weighted_sum = 0.0;
            let mut weight_total = 0.0;
            for (i, value) in values.iter().enumerate() {
                let weight = start + step * i as f64;
                weighted_sum += weight * value;
                weight_total += weight;
            }
            weighted_sum / weight_total
        }
    }
}

/// Slope of the first-degree least-squares fit with x = 0..n-1.
pub fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n < 2.0 {
        return 0.0;
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;

    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom.abs() < 1e-10 {
        return 0.0;
    }

    (n * sum_xy - sum_x * sum_y) / denom
}
