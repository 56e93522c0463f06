use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Configuration for the next-interval forecaster with tunable thresholds.
///
/// All duration-valued fields share the unit of the intervals fed to the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForecastConfig {
    /// Maximum number of intervals kept in the rolling window
    pub capacity: usize,

    /// Below this many samples the estimate is a plain mean flagged as low confidence
    pub min_samples: usize,

    /// Drop one min and one max only when the window is longer than this
    pub trim_above_len: usize,

    /// Recency weights run linearly from `weight_start` (oldest) to `weight_end` (newest)
    pub weight_start: f64,
    pub weight_end: f64,

    /// Least-squares slope (units per sample) that counts as a trend
    pub trend_slope_threshold: f64,
    /// Amount added to (rising) or removed from (falling) the weighted mean
    pub trend_bump: f64,

    /// Smallest estimate the full path may return
    pub estimate_floor: f64,

    /// Phase thresholds: estimate < `short_below` is Short, > `long_above` is Long
    pub short_below: f64,
    pub long_above: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            min_samples: 3,
            trim_above_len: 4,
            weight_start: 1.0,
            weight_end: 2.0,
            trend_slope_threshold: 0.05,
            trend_bump: 1.0,
            estimate_floor: 1.0,
            short_below: 9.0,
            long_above: 12.0,
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.capacity == 0 {
            return Err(invalid("capacity", "must be at least 1".into()));
        }
        if self.trim_above_len < 2 {
            return Err(invalid(
                "trimAboveLen",
                format!(
                    "{} must be at least 2 so trimming leaves a sample",
                    self.trim_above_len
                ),
            ));
        }
        if !(self.weight_start.is_finite() && self.weight_start > 0.0) {
            return Err(invalid(
                "weightStart",
                format!("{} must be finite and positive", self.weight_start),
            ));
        }
        if !self.weight_end.is_finite() || self.weight_end < self.weight_start {
            return Err(invalid(
                "weightEnd",
                format!(
                    "{} must be finite and not below weightStart {}",
                    self.weight_end, self.weight_start
                ),
            ));
        }
        for (name, value) in [
            ("trendSlopeThreshold", self.trend_slope_threshold),
            ("trendBump", self.trend_bump),
            ("estimateFloor", self.estimate_floor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, format!("{value} must be finite and non-negative")));
            }
        }
        if !self.short_below.is_finite()
            || !self.long_above.is_finite()
            || self.short_below > self.long_above
        {
            return Err(invalid(
                "shortBelow",
                format!(
                    "{} must not exceed longAbove {}",
                    self.short_below, self.long_above
                ),
            ));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: String) -> CoreError {
    CoreError::InvalidConfig { name, reason }
}
