use serde::{Deserialize, Serialize};

use crate::booster::model::{AccrualModel, Booster};
use crate::error::{CoreError, CoreResult};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// What closing a deficit takes under one accrual model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    /// Uses required; `None` for continuous-rate models where a count means nothing.
    pub units_needed: Option<u64>,
    /// Seconds until the deficit is closed.
    pub time_needed_secs: f64,
}

impl PlanResult {
    fn nothing_needed(model: &AccrualModel) -> Self {
        let units_needed = match model {
            AccrualModel::ContinuousRate { .. } => None,
            _ => Some(0),
        };
        Self {
            units_needed,
            time_needed_secs: 0.0,
        }
    }
}

/// Where a competitor stands relative to one target score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum Standing {
    /// Current score already meets the target; `lead` is how far past it.
    AlreadyAhead { lead: f64 },
    Behind { deficit: f64 },
}

pub fn standing(current: f64, target: f64) -> Standing {
    let gap = target - current;
    if gap > 0.0 {
        Standing::Behind { deficit: gap }
    } else {
        Standing::AlreadyAhead { lead: -gap }
    }
}

/// Minimum uses or time needed to close `deficit` with `model`.
///
/// A negative deficit counts as zero. The model is checked first, so an invalid
/// catalog entry fails even when nothing is owed. A deficit so large that the use
/// count cannot be represented exactly fails with `Uncountable`.
pub fn plan(deficit: f64, model: &AccrualModel) -> CoreResult<PlanResult> {
    model.validate()?;

    if deficit.is_nan() || deficit == f64::INFINITY {
        return Err(CoreError::InvalidInput { value: deficit });
    }
    if deficit <= 0.0 {
        return Ok(PlanResult::nothing_needed(model));
    }

    let result = match *model {
        AccrualModel::Instant { yield_per_use } => PlanResult {
            units_needed: Some(uses_for_fixed_yield(deficit, yield_per_use)?),
            time_needed_secs: 0.0,
        },
        AccrualModel::Periodic {
            yield_per_cycle,
            cycle_interval,
        } => {
            let units = uses_for_fixed_yield(deficit, yield_per_cycle)?;
            PlanResult {
                units_needed: Some(units),
                time_needed_secs: units as f64 * cycle_interval,
            }
        }
        AccrualModel::TriangularPeriodic {
            unit,
            cycle_interval,
        } => {
            let units = uses_for_triangular_yield(deficit, unit)?;
            PlanResult {
                units_needed: Some(units),
                time_needed_secs: units as f64 * cycle_interval,
            }
        }
        AccrualModel::ContinuousRate { rate_per_second } => PlanResult {
            units_needed: None,
            time_needed_secs: deficit / rate_per_second,
        },
    };

    Ok(result)
}

/// Counts at or past 2^53 no longer have distinct `f64` neighbours.
const MAX_COUNTABLE_USES: f64 = 9_007_199_254_740_992.0;

/// Cast a non-negative ceil to a count, or fail if the count would not be exact.
fn countable(ceil: f64, deficit: f64) -> CoreResult<u64> {
    if !(ceil < MAX_COUNTABLE_USES) {
        return Err(CoreError::Uncountable { deficit });
    }
    Ok(ceil.max(0.0) as u64)
}

/// Smallest n with `n * per_use >= deficit`.
fn uses_for_fixed_yield(deficit: f64, per_use: f64) -> CoreResult<u64> {
    let mut n = countable((deficit / per_use).ceil(), deficit)?;
    // Rounding in the division can leave the ceil one step off
    if n > 0 && (n - 1) as f64 * per_use >= deficit {
        n -= 1;
    } else if (n as f64) * per_use < deficit {
        n += 1;
    }
    Ok(n)
}

/// Smallest k with `unit * k * (k + 1) / 2 >= deficit`.
///
/// Closed form `k* = (-1 + sqrt(1 + 8 * deficit / unit)) / 2`. With `unit > 0` the
/// discriminant is at least 1, so a non-negative root always exists.
fn uses_for_triangular_yield(deficit: f64, unit: f64) -> CoreResult<u64> {
    let discriminant = 1.0 + 8.0 * deficit / unit;
    let root = (-1.0 + discriminant.sqrt()) / 2.0;
    let mut k = countable(root.ceil(), deficit)?;

    // Floating point can land the ceil one step off an exact triangular number
    if k > 0 && triangular_total(unit, k - 1) >= deficit {
        k -= 1;
    } else if triangular_total(unit, k) < deficit {
        k += 1;
    }
    Ok(k)
}

fn triangular_total(unit: f64, uses: u64) -> f64 {
    let uses = uses as f64;
    unit * uses * (uses + 1.0) / 2.0
}

/// One catalog entry's plan. Entries fail independently.
#[derive(Debug, Clone, PartialEq)]
pub struct BoosterPlan {
    pub name: String,
    pub kind: &'static str,
    pub result: CoreResult<PlanResult>,
}

pub fn plan_catalog(deficit: f64, catalog: &[Booster]) -> Vec<BoosterPlan> {
    catalog
        .iter()
        .map(|booster| {
            let result = plan(deficit, &booster.model);
            if let Err(err) = &result {
                log_warn!("Booster '{}' cannot be planned: {err}", booster.name);
            }
            BoosterPlan {
                name: booster.name.clone(),
                kind: booster.model.kind(),
                result,
            }
        })
        .collect()
}

/// Plans for one target score. `plans` is empty when the target is already met.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPlan {
    pub target: f64,
    pub standing: Standing,
    pub plans: Vec<BoosterPlan>,
}

/// Plan every booster against every target (e.g. the scores of ranks 1, 2 and 3).
pub fn plan_targets(current: f64, targets: &[f64], catalog: &[Booster]) -> Vec<TargetPlan> {
    targets
        .iter()
        .map(|&target| {
            let standing = standing(current, target);
            let plans = match standing {
                Standing::AlreadyAhead { lead } => {
                    log_info!("Target {target} already reached (lead {lead})");
                    Vec::new()
                }
                Standing::Behind { deficit } => plan_catalog(deficit, catalog),
            };
            TargetPlan {
                target,
                standing,
                plans,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use crate::booster::model::default_catalog;

    #[test]
    fn instant_rounds_up() {
        let model = AccrualModel::Instant {
            yield_per_use: 400_000.0,
        };
        let result = plan(950_000.0, &model).unwrap();
        assert_eq!(result.units_needed, Some(3));
        assert_eq!(result.time_needed_secs, 0.0);
    }

    #[test]
    fn periodic_time_is_units_times_interval() {
        let model = AccrualModel::Periodic {
            yield_per_cycle: 250_000.0,
            cycle_interval: 300.0,
        };
        let result = plan(600_000.0, &model).unwrap();
        assert_eq!(result.units_needed, Some(3));
        assert_relative_eq!(result.time_needed_secs, 900.0);
    }

    #[test]
    fn triangular_matches_closed_form() {
        // k* = (-1 + sqrt(1 + 8 * 2.5)) / 2 ~= 1.79, ceil = 2; 100000 * 2 * 3 / 2 = 300000
        let model = AccrualModel::TriangularPeriodic {
            unit: 100_000.0,
            cycle_interval: 120.0,
        };
        let result = plan(250_000.0, &model).unwrap();
        assert_eq!(result.units_needed, Some(2));
        assert_relative_eq!(result.time_needed_secs, 240.0);
    }

    #[test]
    fn triangular_exact_totals_do_not_overshoot() {
        let model = AccrualModel::TriangularPeriodic {
            unit: 100_000.0,
            cycle_interval: 120.0,
        };
        assert_eq!(plan(300_000.0, &model).unwrap().units_needed, Some(2));
        assert_eq!(plan(300_001.0, &model).unwrap().units_needed, Some(3));
        assert_eq!(plan(100_000.0, &model).unwrap().units_needed, Some(1));
        assert_eq!(plan(1.0, &model).unwrap().units_needed, Some(1));
    }

    #[test]
    fn continuous_rate_has_no_unit_count() {
        let model = AccrualModel::ContinuousRate {
            rate_per_second: 1_800.0,
        };
        let result = plan(9_000.0, &model).unwrap();
        assert_eq!(result.units_needed, None);
        assert_eq!(result.time_needed_secs, 5.0);
    }

    #[test]
    fn zero_and_negative_deficits_need_nothing() {
        for booster in default_catalog() {
            for deficit in [0.0, -1_000.0, f64::NEG_INFINITY] {
                let result = plan(deficit, &booster.model).unwrap();
                assert_eq!(result.time_needed_secs, 0.0);
                assert!(matches!(result.units_needed, None | Some(0)));
            }
        }
    }

    #[test]
    fn invalid_model_fails_even_without_deficit() {
        let model = AccrualModel::Periodic {
            yield_per_cycle: 0.0,
            cycle_interval: 60.0,
        };
        assert!(matches!(
            plan(0.0, &model),
            Err(CoreError::InvalidModel {
                field: "yieldPerCycle",
                ..
            })
        ));
    }

    #[test]
    fn nan_deficit_is_invalid_input() {
        let model = AccrualModel::Instant { yield_per_use: 1.0 };
        assert!(matches!(
            plan(f64::NAN, &model),
            Err(CoreError::InvalidInput { .. })
        ));
        assert!(plan(f64::INFINITY, &model).is_err());
    }

    #[test]
    fn huge_deficits_are_uncountable() {
        let instant = AccrualModel::Instant { yield_per_use: 1.0 };
        assert_eq!(
            plan(1e30, &instant),
            Err(CoreError::Uncountable { deficit: 1e30 })
        );
        assert!(matches!(
            plan(f64::MAX, &instant),
            Err(CoreError::Uncountable { .. })
        ));

        let stacking = AccrualModel::TriangularPeriodic {
            unit: 1.0,
            cycle_interval: 1.0,
        };
        assert_eq!(
            plan(1e40, &stacking),
            Err(CoreError::Uncountable { deficit: 1e40 })
        );

        let tiny_unit = AccrualModel::TriangularPeriodic {
            unit: 1e-300,
            cycle_interval: 1.0,
        };
        assert!(matches!(
            plan(1e300, &tiny_unit),
            Err(CoreError::Uncountable { .. })
        ));
    }

    #[test]
    fn large_but_countable_deficits_still_plan() {
        let instant = AccrualModel::Instant { yield_per_use: 1.0 };
        assert_eq!(
            plan(1e15, &instant).unwrap().units_needed,
            Some(1_000_000_000_000_000)
        );

        let stacking = AccrualModel::TriangularPeriodic {
            unit: 1.0,
            cycle_interval: 1.0,
        };
        let k = plan(1e30, &stacking).unwrap().units_needed.unwrap();
        assert!(triangular_total(1.0, k) >= 1e30);
    }

    #[test]
    fn standing_distinguishes_ahead_from_behind() {
        assert_eq!(standing(100.0, 250.0), Standing::Behind { deficit: 150.0 });
        assert_eq!(standing(300.0, 250.0), Standing::AlreadyAhead { lead: 50.0 });
        assert_eq!(standing(250.0, 250.0), Standing::AlreadyAhead { lead: 0.0 });
    }

    #[test]
    fn catalog_with_a_bad_entry_still_plans_the_rest() {
        let mut catalog = default_catalog();
        catalog.push(Booster::new(
            "Broken",
            AccrualModel::ContinuousRate {
                rate_per_second: 0.0,
            },
        ));

        let plans = plan_catalog(950_000.0, &catalog);
        assert_eq!(plans.len(), 5);
        assert_eq!(plans[0].result.as_ref().unwrap().units_needed, Some(3));
        assert_eq!(plans[0].kind, "instant");
        assert!(plans[..4].iter().all(|p| p.result.is_ok()));
        assert!(plans[4].result.is_err());
    }

    #[test]
    fn targets_are_planned_independently() {
        let catalog = vec![Booster::new(
            "Passive",
            AccrualModel::ContinuousRate {
                rate_per_second: 1_800.0,
            },
        )];
        let plans = plan_targets(1_000.0, &[10_000.0, 5_500.0, 900.0], &catalog);

        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0].standing, Standing::Behind { deficit: 9_000.0 });
        assert_eq!(
            plans[0].plans[0].result.as_ref().unwrap().time_needed_secs,
            5.0
        );
        assert_relative_eq!(
            plans[1].plans[0].result.as_ref().unwrap().time_needed_secs,
            2.5
        );
        assert!(matches!(plans[2].standing, Standing::AlreadyAhead { .. }));
        assert!(plans[2].plans.is_empty());
    }

    proptest! {
        #[test]
        fn triangular_count_is_minimal(unit in 1.0f64..1_000_000.0, deficit in 0.001f64..1e10) {
            let model = AccrualModel::TriangularPeriodic { unit, cycle_interval: 60.0 };
            let k = plan(deficit, &model).unwrap().units_needed.unwrap();
            prop_assert!(k >= 1);
            prop_assert!(triangular_total(unit, k) >= deficit);
            prop_assert!(triangular_total(unit, k - 1) < deficit);
        }

        #[test]
        fn any_finite_deficit_plans_or_is_uncountable(
            per_use in 1e-6f64..1e6,
            deficit in 0.0f64..f64::MAX,
        ) {
            for model in [
                AccrualModel::Instant { yield_per_use: per_use },
                AccrualModel::TriangularPeriodic { unit: per_use, cycle_interval: 1.0 },
            ] {
                match plan(deficit, &model) {
                    Ok(result) => prop_assert!(result.units_needed.is_some()),
                    Err(err) => prop_assert_eq!(err, CoreError::Uncountable { deficit }),
                }
            }
        }

        #[test]
        fn fixed_yield_count_is_minimal(per_use in 0.01f64..1_000_000.0, deficit in 0.001f64..1e10) {
            let model = AccrualModel::Instant { yield_per_use: per_use };
            let n = plan(deficit, &model).unwrap().units_needed.unwrap();
            prop_assert!(n >= 1);
            prop_assert!(n as f64 * per_use >= deficit);
            prop_assert!((n - 1) as f64 * per_use < deficit);
        }
    }
}
