use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// How a booster turns uses or elapsed time into points.
///
/// Intervals are in seconds regardless of the forecast duration unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AccrualModel {
    /// Each use grants `yield_per_use` immediately.
    #[serde(rename_all = "camelCase")]
    Instant { yield_per_use: f64 },

    /// Each use grants `yield_per_cycle`; uses are `cycle_interval` seconds apart.
    #[serde(rename_all = "camelCase")]
    Periodic {
        yield_per_cycle: f64,
        cycle_interval: f64,
    },

    /// The k-th use grants `unit * k`, so N uses total `unit * N * (N + 1) / 2`.
    #[serde(rename_all = "camelCase")]
    TriangularPeriodic { unit: f64, cycle_interval: f64 },

    /// Points accrue continuously; only elapsed time matters.
    #[serde(rename_all = "camelCase")]
    ContinuousRate { rate_per_second: f64 },
}

impl AccrualModel {
    pub fn kind(&self) -> &'static str {
        match self {
            AccrualModel::Instant { .. } => "instant",
            AccrualModel::Periodic { .. } => "periodic",
            AccrualModel::TriangularPeriodic { .. } => "triangularPeriodic",
            AccrualModel::ContinuousRate { .. } => "continuousRate",
        }
    }

    /// Every yield, rate and interval must be finite and strictly positive.
    pub fn validate(&self) -> CoreResult<()> {
        match *self {
            AccrualModel::Instant { yield_per_use } => positive("yieldPerUse", yield_per_use),
            AccrualModel::Periodic {
                yield_per_cycle,
                cycle_interval,
            } => {
                positive("yieldPerCycle", yield_per_cycle)?;
                positive("cycleInterval", cycle_interval)
            }
            AccrualModel::TriangularPeriodic {
                unit,
                cycle_interval,
            } => {
                positive("unit", unit)?;
                positive("cycleInterval", cycle_interval)
            }
            AccrualModel::ContinuousRate { rate_per_second } => {
                positive("ratePerSecond", rate_per_second)
            }
        }
    }
}

fn positive(field: &'static str, value: f64) -> CoreResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidModel { field, value })
    }
}

/// A named catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booster {
    pub name: String,
    pub model: AccrualModel,
}

impl Booster {
    pub fn new(name: impl Into<String>, model: AccrualModel) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }
}

/// Catalog used when the settings file does not list any boosters.
pub fn default_catalog() -> Vec<Booster> {
    vec![
        Booster::new(
            "Instant boost",
            AccrualModel::Instant {
                yield_per_use: 400_000.0,
            },
        ),
        Booster::new(
            "Timed boost",
            AccrualModel::Periodic {
                yield_per_cycle: 250_000.0,
                cycle_interval: 300.0,
            },
        ),
        Booster::new(
            "Stacking boost",
            AccrualModel::TriangularPeriodic {
                unit: 100_000.0,
                cycle_interval: 120.0,
            },
        ),
        Booster::new(
            "Passive income",
            AccrualModel::ContinuousRate {
                rate_per_second: 1_800.0,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_valid() {
        for booster in default_catalog() {
            assert!(booster.model.validate().is_ok(), "{} invalid", booster.name);
        }
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let cases = [
            (AccrualModel::Instant { yield_per_use: 0.0 }, "yieldPerUse"),
            (
                AccrualModel::Periodic {
                    yield_per_cycle: 10.0,
                    cycle_interval: -1.0,
                },
                "cycleInterval",
            ),
            (
                AccrualModel::TriangularPeriodic {
                    unit: f64::NAN,
                    cycle_interval: 60.0,
                },
                "unit",
            ),
            (
                AccrualModel::ContinuousRate {
                    rate_per_second: f64::INFINITY,
                },
                "ratePerSecond",
            ),
        ];

        for (model, expected) in cases {
            match model.validate() {
                Err(CoreError::InvalidModel { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected InvalidModel for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn catalog_entries_deserialize_by_kind() {
        let json = r#"[
            { "name": "a", "model": { "kind": "instant", "yieldPerUse": 5 } },
            { "name": "b", "model": { "kind": "periodic", "yieldPerCycle": 5, "cycleInterval": 60 } },
            { "name": "c", "model": { "kind": "triangularPeriodic", "unit": 2, "cycleInterval": 30 } },
            { "name": "d", "model": { "kind": "continuousRate", "ratePerSecond": 1.5 } }
        ]"#;
        let catalog: Vec<Booster> = serde_json::from_str(json).unwrap();
        let kinds: Vec<&str> = catalog.iter().map(|b| b.model.kind()).collect();
        assert_eq!(
            kinds,
            vec!["instant", "periodic", "triangularPeriodic", "continuousRate"]
        );
        assert_eq!(
            catalog[2].model,
            AccrualModel::TriangularPeriodic {
                unit: 2.0,
                cycle_interval: 30.0
            }
        );
    }

    #[test]
    fn unknown_kind_fails_to_deserialize() {
        let json = r#"{ "name": "x", "model": { "kind": "quadratic", "unit": 1 } }"#;
        assert!(serde_json::from_str::<Booster>(json).is_err());
    }
}
