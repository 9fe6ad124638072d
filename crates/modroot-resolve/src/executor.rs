//! Copy phase
//!
//! Every included plan is copied inside one batch on the asset store. The
//! batch is closed before this module returns, so nothing downstream can
//! observe the store mid-batch.

use crate::cancel::CancelFlag;
use crate::planner::suffixed_path;
use crate::report::{FailureReason, GroupOutcome, GroupStatus, SkipReason};
use crate::types::{CopyPlan, GroupKey};
use modroot_asset::{AssetStore, EditScope, HashCache};
use modroot_core::AssetPath;
use std::collections::BTreeMap;

/// Result of the copy phase
#[derive(Debug, Default)]
pub struct CopyResult {
    /// Final destination for every copied or reused group
    pub resolved: BTreeMap<GroupKey, AssetPath>,
    /// One outcome per plan, in plan order
    pub outcomes: Vec<GroupOutcome>,
    pub cancelled: bool,
}

/// Performs the planned copies
pub struct CopyExecutor<'a, S: AssetStore + ?Sized> {
    store: &'a mut S,
    cache: &'a mut HashCache,
    cancel: &'a CancelFlag,
}

impl<'a, S: AssetStore + ?Sized> CopyExecutor<'a, S> {
    pub fn new(store: &'a mut S, cache: &'a mut HashCache, cancel: &'a CancelFlag) -> Self {
        Self {
            store,
            cache,
            cancel,
        }
    }

    /// Copy every included plan. Failures are recorded per group.
    pub fn execute(self, plans: &[CopyPlan]) -> CopyResult {
        let mut result = CopyResult::default();
        let mut scope = EditScope::new(&mut *self.store);

        for plan in plans {
            let status = if !plan.included {
                GroupStatus::Skipped(SkipReason::Excluded)
            } else if result.cancelled || self.cancel.is_requested() {
                result.cancelled = true;
                GroupStatus::Skipped(SkipReason::Cancelled)
            } else {
                match Self::copy_group(&mut scope, self.cache, plan) {
                    Ok((dest, status)) => {
                        result.resolved.insert(plan.key.clone(), dest.clone());
                        result.outcomes.push(GroupOutcome {
                            key: plan.key.clone(),
                            source: plan.source.clone(),
                            dest,
                            status,
                        });
                        continue;
                    }
                    Err(reason) => {
                        tracing::warn!("Copy of '{}' failed: {}", plan.source, reason);
                        GroupStatus::Failed(reason)
                    }
                }
            };

            result.outcomes.push(GroupOutcome {
                key: plan.key.clone(),
                source: plan.source.clone(),
                dest: plan.dest.clone(),
                status,
            });
        }

        if let Err(e) = scope.close() {
            tracing::warn!("Closing the copy batch failed: {}", e);
        }
        result
    }

    fn copy_group(
        store: &mut S,
        cache: &mut HashCache,
        plan: &CopyPlan,
    ) -> std::result::Result<(AssetPath, GroupStatus), FailureReason> {
        if !store.exists(&plan.source) {
            return Err(FailureReason::MissingSource);
        }

        // The destination may have changed since planning
        let mut dest = plan.dest.clone();
        let mut n = 0;
        while store.exists(&dest) {
            if cache.content_equals(&*store, &plan.source, &dest) {
                tracing::debug!("Reusing '{}' for '{}'", dest, plan.source);
                return Ok((dest, GroupStatus::Reused));
            }
            n += 1;
            dest = suffixed_path(&plan.desired, &plan.mod_info.name, n);
        }

        store
            .copy(&plan.source, &dest)
            .map_err(|e| FailureReason::IoError(e.to_string()))?;
        cache.invalidate(&dest);
        tracing::debug!("Copied '{}' to '{}'", plan.source, dest);
        Ok((dest, GroupStatus::Copied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::classify;
    use crate::planner::Planner;
    use crate::testutil::Fixture;
    use crate::types::{NamingMode, ReferenceSite};
    use crate::walker::ReverseIndex;
    use modroot_prefab::HierarchyPath;

    fn plans_for(fx: &Fixture, targets: &[&str]) -> Vec<CopyPlan> {
        let m = fx.mod_info("M1");
        let conflicts: Vec<_> = targets
            .iter()
            .map(|t| {
                let site = ReferenceSite::MaterialSlot {
                    container: AssetPath::new("Mods/M1/Prefabs/Box.prefab"),
                    node: HierarchyPath::parse("Box"),
                    renderer: 0,
                    slot: 0,
                    target: AssetPath::new(*t),
                };
                classify(&site, &m).unwrap()
            })
            .collect();
        let (assets, _) = fx.stores();
        let mut cache = HashCache::new();
        let index = ReverseIndex::new();
        Planner::new(&assets, &mut cache, &index, NamingMode::KeepOriginal).plan(&conflicts)
    }

    #[test]
    fn test_copies_in_one_batch() {
        let fx = Fixture::new();
        fx.write("Shared/a.mat", "a");
        fx.write("Shared/b.mat", "b");
        let plans = plans_for(&fx, &["Shared/a.mat", "Shared/b.mat"]);
        let (mut assets, _) = fx.stores();
        let builds = assets.index_builds();
        let mut cache = HashCache::new();
        let cancel = CancelFlag::new();

        let result = CopyExecutor::new(&mut assets, &mut cache, &cancel).execute(&plans);

        assert_eq!(result.resolved.len(), 2);
        assert!(result.outcomes.iter().all(|o| o.status == GroupStatus::Copied));
        assert_eq!(fx.read("Mods/M1/Materials/b.mat"), "b");
        assert_eq!(assets.index_builds(), builds + 1);
        assert!(!assets.is_editing());
    }

    #[test]
    fn test_missing_source_fails_group() {
        let fx = Fixture::new();
        fx.write("Shared/a.mat", "a");
        let plans = plans_for(&fx, &["Shared/a.mat", "Shared/gone.mat"]);
        let (mut assets, _) = fx.stores();
        let mut cache = HashCache::new();
        let cancel = CancelFlag::new();

        let result = CopyExecutor::new(&mut assets, &mut cache, &cancel).execute(&plans);

        assert_eq!(result.resolved.len(), 1);
        assert_eq!(
            result.outcomes[1].status,
            GroupStatus::Failed(FailureReason::MissingSource)
        );
    }

    #[test]
    fn test_destination_appearing_after_planning() {
        let fx = Fixture::new();
        fx.write("Shared/a.mat", "a");
        fx.write("Shared/b.mat", "b");
        let plans = plans_for(&fx, &["Shared/a.mat", "Shared/b.mat"]);
        // a.mat's destination now holds different bytes, b.mat's identical bytes
        fx.write("Mods/M1/Materials/a.mat", "someone else");
        fx.write("Mods/M1/Materials/b.mat", "b");
        let (mut assets, _) = fx.stores();
        let mut cache = HashCache::new();
        let cancel = CancelFlag::new();

        let result = CopyExecutor::new(&mut assets, &mut cache, &cancel).execute(&plans);

        assert_eq!(result.outcomes[0].dest.as_str(), "Mods/M1/Materials/a__M1_1.mat");
        assert_eq!(result.outcomes[0].status, GroupStatus::Copied);
        assert_eq!(fx.read("Mods/M1/Materials/a.mat"), "someone else");
        assert_eq!(result.outcomes[1].status, GroupStatus::Reused);
    }

    #[test]
    fn test_renamed_plan_is_never_suffixed_twice() {
        let fx = Fixture::new();
        fx.write("Shared/a.mat", "a");
        fx.write("Mods/M1/Materials/a.mat", "first");
        let plans = plans_for(&fx, &["Shared/a.mat"]);
        assert_eq!(plans[0].dest.as_str(), "Mods/M1/Materials/a__M1_1.mat");
        // The renamed destination is taken before execution
        fx.write("Mods/M1/Materials/a__M1_1.mat", "second");
        let (mut assets, _) = fx.stores();
        let mut cache = HashCache::new();
        let cancel = CancelFlag::new();

        let result = CopyExecutor::new(&mut assets, &mut cache, &cancel).execute(&plans);

        assert_eq!(result.outcomes[0].dest.as_str(), "Mods/M1/Materials/a__M1_2.mat");
        assert_eq!(result.outcomes[0].status, GroupStatus::Copied);
        assert_eq!(fx.read("Mods/M1/Materials/a__M1_1.mat"), "second");
    }

    #[test]
    fn test_excluded_and_cancelled_groups_are_skipped() {
        let fx = Fixture::new();
        fx.write("Shared/a.mat", "a");
        fx.write("Shared/b.mat", "b");
        let mut plans = plans_for(&fx, &["Shared/a.mat", "Shared/b.mat"]);
        plans[0].included = false;
        let (mut assets, _) = fx.stores();
        let mut cache = HashCache::new();
        let cancel = CancelFlag::new();
        cancel.request();

        let result = CopyExecutor::new(&mut assets, &mut cache, &cancel).execute(&plans);

        assert!(result.cancelled);
        assert!(result.resolved.is_empty());
        assert_eq!(
            result.outcomes[0].status,
            GroupStatus::Skipped(SkipReason::Excluded)
        );
        assert_eq!(
            result.outcomes[1].status,
            GroupStatus::Skipped(SkipReason::Cancelled)
        );
        assert!(!fx.exists("Mods/M1/Materials/b.mat"));
    }
}
