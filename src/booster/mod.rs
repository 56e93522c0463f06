pub mod model;
pub mod planner;

pub use model::{default_catalog, AccrualModel, Booster};
pub use planner::{
    plan, plan_catalog, plan_targets, standing, BoosterPlan, PlanResult, Standing, TargetPlan,
};
