use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::rounds::DurationUnit;

/// Time left until the forecast end of the running interval.
///
/// Never negative: once the elapsed time passes the estimate the countdown flips to
/// `Overdue` carrying the overrun.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "state", content = "ms")]
pub enum Countdown {
    Remaining(#[serde(with = "millis")] Duration),
    Overdue(#[serde(with = "millis")] Duration),
}

impl Countdown {
    pub fn from_estimate(estimate: Duration, elapsed: Duration) -> Self {
        let elapsed = elapsed.max(Duration::zero());
        if estimate > elapsed {
            Countdown::Remaining(estimate - elapsed)
        } else {
            Countdown::Overdue(elapsed - estimate)
        }
    }

    /// Countdown for an interval that began at `started_at`, given an estimate in `unit`.
    pub fn since(
        estimate: f64,
        unit: DurationUnit,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let estimate_ms = (unit.to_seconds(estimate.max(0.0)) * 1000.0).round() as i64;
        Self::from_estimate(Duration::milliseconds(estimate_ms), now - started_at)
    }

    pub fn is_overdue(&self) -> bool {
        matches!(self, Countdown::Overdue(_))
    }

    pub fn duration(&self) -> Duration {
        match self {
            Countdown::Remaining(d) | Countdown::Overdue(d) => *d,
        }
    }
}

mod millis {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        i64::deserialize(deserializer).map(Duration::milliseconds)
    }
}
