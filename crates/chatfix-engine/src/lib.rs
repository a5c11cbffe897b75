pub mod cache;
pub mod discover;
pub mod error;
pub mod merge;
pub mod ops;
pub mod orphan;
pub mod reconcile;

pub use discover::discover_locations;
pub use error::{Error, Result};
pub use merge::{MergeGroup, merge_groups};
pub use ops::{
    LocationReport, MergeOutcome, MergeProgress, RepairOptions, RepairOutcome, RepairProgress,
    RunMode, Survey, WriteGate, apply_merge, apply_plan, plan_location, recover_orphans,
    repair_location, resolve_orphans, survey,
};
pub use orphan::{OrphanCandidate, OrphanResolution, Similarity};
pub use reconcile::ReconciliationPlan;
