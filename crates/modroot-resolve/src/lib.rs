//! Modroot Resolve - Mod asset relocation engine
//!
//! This crate walks a mod's prefabs and materials, finds material and
//! texture references that point outside the mod's canonical folders,
//! deduplicates them by content, copies them into place and repoints
//! every reference.

mod cancel;
mod config;
mod detector;
mod executor;
mod planner;
mod report;
mod retarget;
mod session;
mod types;
mod walker;

#[cfg(test)]
mod testutil;

pub use cancel::CancelFlag;
pub use config::{ModrootConfigFile, ResolverConfig, ResolverSection};
pub use detector::classify;
pub use executor::{CopyExecutor, CopyResult};
pub use planner::{sanitize, suffixed_path, Planner};
pub use report::{
    ExecutionSummary, FailedGroup, FailureReason, GroupOutcome, GroupStatus, IncompleteGroup,
    MissingSite, PassReport, ReportGroup, SkipReason,
};
pub use retarget::{RetargetEdit, Retargeter, SiteResult};
pub use session::{PassResult, Session, SessionOutcome, SessionState};
pub use types::{
    ConflictRecord, CopyPlan, GroupKey, NamingMode, Pass, PlannedAction, ReferenceSite, Violation,
};
pub use walker::{ReferenceWalker, ReverseIndex, SiteWalk, SkippedDocument, WalkStats};
