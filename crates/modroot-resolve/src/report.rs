//! Operator-facing report types

use crate::types::{CopyPlan, GroupKey, NamingMode, Pass, PlannedAction, Violation};
use crate::walker::WalkStats;
use modroot_core::AssetPath;
use serde::Serialize;
use std::fmt;

/// Why a group could not be copied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum FailureReason {
    IoError(String),
    MissingSource,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::IoError(e) => write!(f, "IoError: {}", e),
            FailureReason::MissingSource => f.write_str("MissingSource"),
        }
    }
}

/// Why a group was not processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipReason {
    Excluded,
    Cancelled,
}

/// Result of executing one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Copied,
    Reused,
    Failed(FailureReason),
    Skipped(SkipReason),
}

impl GroupStatus {
    /// Copied or reused: members may now be retargeted
    pub fn is_resolved(&self) -> bool {
        matches!(self, GroupStatus::Copied | GroupStatus::Reused)
    }
}

/// Execution record for one group
#[derive(Debug, Clone, Serialize)]
pub struct GroupOutcome {
    pub key: GroupKey,
    pub source: AssetPath,
    /// Final destination when resolved, planned destination otherwise
    pub dest: AssetPath,
    pub status: GroupStatus,
}

/// One conflict group as shown before execution
#[derive(Debug, Clone, Serialize)]
pub struct ReportGroup {
    pub index: usize,
    pub included: bool,
    #[serde(rename = "mod")]
    pub mod_name: String,
    pub example: String,
    pub reason: Violation,
    pub source: AssetPath,
    pub dest: AssetPath,
    pub action: PlannedAction,
    pub members: usize,
}

/// Conflicts of one pass, grouped and planned, awaiting confirmation
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    #[serde(rename = "mod")]
    pub mod_name: String,
    pub pass: Pass,
    pub naming: NamingMode,
    /// False when the mod has no Prefabs folder (nothing to walk)
    pub has_prefabs: bool,
    pub groups: Vec<ReportGroup>,
    pub walk: WalkStats,
}

impl PassReport {
    pub fn new(
        mod_name: &str,
        pass: Pass,
        naming: NamingMode,
        has_prefabs: bool,
        plans: &[CopyPlan],
        walk: WalkStats,
    ) -> Self {
        let groups = plans
            .iter()
            .enumerate()
            .map(|(index, plan)| ReportGroup {
                index,
                included: plan.included,
                mod_name: plan.mod_info.name.clone(),
                example: plan
                    .example_site()
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                reason: plan.reason(),
                source: plan.source.clone(),
                dest: plan.dest.clone(),
                action: plan.action,
                members: plan.members.len(),
            })
            .collect();

        Self {
            mod_name: mod_name.to_string(),
            pass,
            naming,
            has_prefabs,
            groups,
            walk,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total conflicting reference sites across all groups
    pub fn conflict_count(&self) -> usize {
        self.groups.iter().map(|g| g.members).sum()
    }

    pub fn included_count(&self) -> usize {
        self.groups.iter().filter(|g| g.included).count()
    }

    pub fn summary(&self) -> String {
        if self.groups.is_empty() {
            return format!("{} {}: no conflicts.", self.mod_name, self.pass);
        }
        format!(
            "{} {}: {} conflict(s) in {} group(s), {} included",
            self.mod_name,
            self.pass,
            self.conflict_count(),
            self.groups.len(),
            self.included_count(),
        )
    }
}

/// A group whose copy failed; its members were left untouched
#[derive(Debug, Clone, Serialize)]
pub struct FailedGroup {
    pub source: AssetPath,
    pub dest: AssetPath,
    pub reason: FailureReason,
}

/// A reference the retargeter could not find or could not write
#[derive(Debug, Clone, Serialize)]
pub struct MissingSite {
    pub site: String,
    pub document: AssetPath,
    pub detail: String,
}

/// Copied, not fully retargeted
#[derive(Debug, Clone, Serialize)]
pub struct IncompleteGroup {
    pub source: AssetPath,
    pub dest: AssetPath,
    pub missing: Vec<MissingSite>,
}

/// What one executed pass did
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionSummary {
    #[serde(rename = "mod")]
    pub mod_name: String,
    pub pass: Option<Pass>,
    pub copied: usize,
    pub reused: usize,
    pub failed: usize,
    pub skipped: usize,
    pub retargeted: usize,
    pub failures: Vec<FailedGroup>,
    pub incomplete: Vec<IncompleteGroup>,
    pub cancelled: bool,
}

impl ExecutionSummary {
    pub fn new(mod_name: &str, pass: Pass) -> Self {
        Self {
            mod_name: mod_name.to_string(),
            pass: Some(pass),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &GroupOutcome) {
        match &outcome.status {
            GroupStatus::Copied => self.copied += 1,
            GroupStatus::Reused => self.reused += 1,
            GroupStatus::Skipped(_) => self.skipped += 1,
            GroupStatus::Failed(reason) => {
                self.failed += 1;
                self.failures.push(FailedGroup {
                    source: outcome.source.clone(),
                    dest: outcome.dest.clone(),
                    reason: reason.clone(),
                });
            }
        }
    }

    /// Any failed copy or unretargeted reference
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || !self.incomplete.is_empty()
    }

    pub fn summary(&self) -> String {
        let pass = self.pass.map(|p| p.to_string()).unwrap_or_default();
        let mut line = format!(
            "{} {}: {} copied, {} reused, {} failed, {} skipped, {} reference(s) retargeted",
            self.mod_name, pass, self.copied, self.reused, self.failed, self.skipped, self.retargeted,
        );
        if !self.incomplete.is_empty() {
            line.push_str(&format!(
                ", {} group(s) not fully retargeted",
                self.incomplete.len()
            ));
        }
        if self.cancelled {
            line.push_str(" (cancelled)");
        }
        line
    }
}
