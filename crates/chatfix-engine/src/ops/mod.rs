mod merge;
mod repair;

pub use merge::{MergeOutcome, MergeProgress, apply_merge};
pub use repair::{
    LocationReport, RepairOptions, RepairOutcome, RepairProgress, Survey, apply_plan,
    plan_location, recover_orphans, repair_location, resolve_orphans, survey,
};

use crate::error::Result;

/// Whether a run may mutate anything. Defaults to preview so a caller has
/// to opt in to writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// All reads, zero writes.
    #[default]
    Preview,
    /// Mutations allowed.
    Apply,
}

impl RunMode {
    pub fn is_preview(self) -> bool {
        matches!(self, RunMode::Preview)
    }
}

/// The single entry point every mutation routes through. Under preview the
/// closure never runs, which is what keeps preview side-effect-free.
#[derive(Debug, Clone, Copy)]
pub struct WriteGate {
    mode: RunMode,
}

impl WriteGate {
    pub fn new(mode: RunMode) -> Self {
        Self { mode }
    }

    pub fn is_preview(self) -> bool {
        self.mode.is_preview()
    }

    /// Run a mutating action, or skip it under preview. `Ok(None)` means
    /// the action was skipped.
    pub fn mutate<T>(self, action: impl FnOnce() -> Result<T>) -> Result<Option<T>> {
        if self.mode.is_preview() {
            return Ok(None);
        }
        action().map(Some)
    }
}
