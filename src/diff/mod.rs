//! Diff planner - content comparison and plan generation

mod compare;
mod plan;

pub use compare::{Comparison, ContentComparer, DigestComparer};
pub use plan::{generate_sync_plan, PlanStats, SyncPlan};
