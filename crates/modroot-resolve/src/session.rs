//! Two-pass resolver session
//!
//! A session drives one mod through the material pass and then the texture
//! pass. Each pass walks, classifies and plans, then waits for the operator
//! to confirm before copying and retargeting:
//!
//! ```text
//! Idle -> Scanning -> Planning -> AwaitingConfirmation -> Executing -> Retargeting
//!      (materials, then again for textures) -> Idle
//! ```
//!
//! The texture pass always starts from a fresh walk of the project as the
//! material pass left it.

use crate::cancel::CancelFlag;
use crate::config::ResolverConfig;
use crate::detector::classify;
use crate::executor::CopyExecutor;
use crate::planner::Planner;
use crate::report::{ExecutionSummary, IncompleteGroup, MissingSite, PassReport};
use crate::retarget::{RetargetEdit, Retargeter, SiteResult};
use crate::types::{ConflictRecord, CopyPlan, GroupKey, NamingMode, Pass};
use crate::walker::{ReferenceWalker, ReverseIndex, WalkStats};
use modroot_asset::{AssetStore, HashCache, ModCatalog, ModInfo};
use modroot_core::{ModrootError, Result};
use modroot_prefab::ContainerStore;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Where the session is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Scanning(Pass),
    Planning(Pass),
    AwaitingConfirmation(Pass),
    Executing(Pass),
    Retargeting(Pass),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::Scanning(p) => write!(f, "scanning {}", p),
            SessionState::Planning(p) => write!(f, "planning {}", p),
            SessionState::AwaitingConfirmation(p) => write!(f, "awaiting confirmation of {}", p),
            SessionState::Executing(p) => write!(f, "executing {}", p),
            SessionState::Retargeting(p) => write!(f, "retargeting {}", p),
        }
    }
}

/// Everything one pass produced before confirmation
struct PassContext {
    mod_info: ModInfo,
    pass: Pass,
    has_prefabs: bool,
    index: ReverseIndex,
    conflicts: Vec<ConflictRecord>,
    plans: Vec<CopyPlan>,
    walk: WalkStats,
}

impl PassContext {
    fn report(&self, naming: NamingMode) -> PassReport {
        PassReport::new(
            &self.mod_info.name,
            self.pass,
            naming,
            self.has_prefabs,
            &self.plans,
            self.walk.clone(),
        )
    }
}

/// Result of confirming a pass
#[derive(Debug)]
pub struct PassResult {
    pub summary: ExecutionSummary,
    /// The texture pass report, when confirming the material pass led into it
    pub next: Option<PassReport>,
}

/// Everything a full [`Session::run`] did
#[derive(Debug, Default, Serialize)]
pub struct SessionOutcome {
    pub reports: Vec<PassReport>,
    pub summaries: Vec<ExecutionSummary>,
    /// The operator declined a pass
    pub declined: bool,
    pub cancelled: bool,
}

impl SessionOutcome {
    pub fn has_failures(&self) -> bool {
        self.summaries.iter().any(|s| s.has_failures())
    }
}

/// Resolver session over an asset store and a container store
pub struct Session<A: AssetStore, C: ContainerStore> {
    assets: A,
    containers: C,
    config: ResolverConfig,
    catalog: ModCatalog,
    cache: HashCache,
    cancel: CancelFlag,
    state: SessionState,
    history: Vec<SessionState>,
    pending: Option<PassContext>,
}

impl<A: AssetStore, C: ContainerStore> Session<A, C> {
    /// Validate configuration and discover mods; nothing is scanned yet
    pub fn new(assets: A, containers: C, config: ResolverConfig) -> Result<Self> {
        config.validate(&assets)?;
        let catalog = ModCatalog::discover(&assets, &config.mods_root)?;
        tracing::info!("Found {} mod(s) under {}", catalog.len(), config.mods_root);

        Ok(Self {
            assets,
            containers,
            config,
            catalog,
            cache: HashCache::new(),
            cancel: CancelFlag::new(),
            state: SessionState::Idle,
            history: vec![SessionState::Idle],
            pending: None,
        })
    }

    /// Share an externally owned cancel flag
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn catalog(&self) -> &ModCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every state entered so far, oldest first
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    pub fn cancel_handle(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn containers(&self) -> &C {
        &self.containers
    }

    pub fn cache(&self) -> &HashCache {
        &self.cache
    }

    pub fn into_parts(self) -> (A, C) {
        (self.assets, self.containers)
    }

    /// The report awaiting confirmation, if any
    pub fn report(&self) -> Option<PassReport> {
        self.pending
            .as_ref()
            .map(|ctx| ctx.report(self.config.naming(ctx.pass)))
    }

    /// Scan and plan the material pass of a mod.
    ///
    /// Returns the report awaiting confirmation, or `None` if the scan was
    /// cancelled (the session is then back to `Idle`).
    pub fn begin(&mut self, mod_name: &str) -> Result<Option<PassReport>> {
        self.require_idle("begin a pass")?;
        let mod_info = self.lookup(mod_name)?;
        self.start_pass(&mod_info, Pass::Materials)
    }

    /// Read-only reports of both passes as the project stands
    pub fn preview(&mut self, mod_name: &str) -> Result<Vec<PassReport>> {
        self.require_idle("preview")?;
        let mod_info = self.lookup(mod_name)?;

        let mut reports = Vec::new();
        for pass in [Pass::Materials, Pass::Textures] {
            match self.scan(&mod_info, pass) {
                Ok(Some(ctx)) => reports.push(ctx.report(self.config.naming(pass))),
                Ok(None) => {
                    self.cancel.reset();
                    break;
                }
                Err(e) => {
                    self.transition(SessionState::Idle);
                    return Err(e);
                }
            }
        }
        self.transition(SessionState::Idle);
        Ok(reports)
    }

    /// Change a naming mode. A pending plan for that pass is recomputed,
    /// keeping each group's include flag, and its new report returned.
    pub fn set_naming(&mut self, pass: Pass, mode: NamingMode) -> Option<PassReport> {
        self.config.set_naming(pass, mode);

        let SessionState::AwaitingConfirmation(pending_pass) = self.state else {
            return None;
        };
        if pending_pass != pass {
            return None;
        }
        let ctx = self.pending.as_mut()?;

        let excluded: HashSet<GroupKey> = ctx
            .plans
            .iter()
            .filter(|p| !p.included)
            .map(|p| p.key.clone())
            .collect();
        ctx.plans = Planner::new(&self.assets, &mut self.cache, &ctx.index, mode).plan(&ctx.conflicts);
        for plan in &mut ctx.plans {
            plan.included = !excluded.contains(&plan.key);
        }
        Some(ctx.report(mode))
    }

    /// Include or exclude one group of the pending report
    pub fn set_included(&mut self, group: usize, included: bool) -> Result<()> {
        let ctx = self.pending.as_mut().ok_or_else(|| {
            ModrootError::InvalidState("No pass is awaiting confirmation".to_string())
        })?;
        let count = ctx.plans.len();
        let plan = ctx.plans.get_mut(group).ok_or_else(|| {
            ModrootError::InvalidState(format!(
                "Group {} does not exist ({} group(s))",
                group, count
            ))
        })?;
        plan.included = included;
        Ok(())
    }

    /// Set the include flag of every pending group matching `predicate`
    pub fn set_included_where<F: Fn(&CopyPlan) -> bool>(&mut self, predicate: F, included: bool) -> usize {
        let Some(ctx) = self.pending.as_mut() else {
            return 0;
        };
        let mut changed = 0;
        for plan in ctx.plans.iter_mut().filter(|p| predicate(p)) {
            plan.included = included;
            changed += 1;
        }
        changed
    }

    /// Drop the pending pass without side effects
    pub fn abort(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle | SessionState::AwaitingConfirmation(_) => {
                self.pending = None;
                self.cancel.reset();
                if self.state != SessionState::Idle {
                    self.transition(SessionState::Idle);
                }
                Ok(())
            }
            state => Err(ModrootError::InvalidState(format!(
                "Cannot abort while {}",
                state
            ))),
        }
    }

    /// Execute and retarget the pending pass.
    ///
    /// Confirming the material pass immediately rescans for the texture
    /// pass unless cancellation was requested.
    pub fn confirm(&mut self) -> Result<PassResult> {
        let SessionState::AwaitingConfirmation(pass) = self.state else {
            return Err(ModrootError::InvalidState(format!(
                "Cannot confirm while {}",
                self.state
            )));
        };
        let ctx = self.pending.take().ok_or_else(|| {
            ModrootError::InvalidState("No pass is awaiting confirmation".to_string())
        })?;

        self.transition(SessionState::Executing(pass));
        let included = ctx.plans.iter().filter(|p| p.included).count();
        tracing::info!("Executing {} pass for {}: {} group(s)", pass, ctx.mod_info.name, included);
        let copy = CopyExecutor::new(&mut self.assets, &mut self.cache, &self.cancel).execute(&ctx.plans);
        self.cache.clear();

        let mut summary = ExecutionSummary::new(&ctx.mod_info.name, pass);
        for outcome in &copy.outcomes {
            summary.record(outcome);
        }

        self.transition(SessionState::Retargeting(pass));
        let edits: Vec<RetargetEdit> = ctx
            .plans
            .iter()
            .filter_map(|plan| copy.resolved.get(&plan.key).map(|dest| (plan, dest)))
            .flat_map(|(plan, dest)| {
                plan.members.iter().map(move |member| RetargetEdit {
                    site: member.site.clone(),
                    old: member.source.clone(),
                    new: dest.clone(),
                })
            })
            .collect();
        let results = Retargeter::new(&mut self.containers).retarget_all(edits);
        Self::tally(&mut summary, results);
        tracing::info!("{}", summary.summary());

        let cancelled = copy.cancelled || self.cancel.is_requested();
        if pass == Pass::Materials && !cancelled {
            let next = self.start_pass(&ctx.mod_info, Pass::Textures)?;
            return Ok(PassResult { summary, next });
        }

        if cancelled {
            tracing::info!("Cancelled after the {} pass", pass);
            summary.cancelled = true;
            self.cancel.reset();
        }
        self.transition(SessionState::Idle);
        Ok(PassResult {
            summary,
            next: None,
        })
    }

    /// Drive both passes, asking `confirm` before each one executes
    pub fn run<F: FnMut(&PassReport) -> bool>(&mut self, mod_name: &str, mut confirm: F) -> Result<SessionOutcome> {
        let mut outcome = SessionOutcome::default();
        let mut next = self.begin(mod_name)?;
        if next.is_none() {
            outcome.cancelled = true;
        }

        while let Some(report) = next.take() {
            let accepted = confirm(&report);
            outcome.reports.push(report);
            if !accepted {
                self.abort()?;
                outcome.declined = true;
                break;
            }

            let result = self.confirm()?;
            outcome.cancelled |= result.summary.cancelled;
            let last_pass = result.summary.pass;
            outcome.summaries.push(result.summary);
            next = result.next;
            // Confirming materials always leads to a texture report unless stopped
            if next.is_none() && last_pass == Some(Pass::Materials) {
                outcome.cancelled = true;
            }
        }
        Ok(outcome)
    }

    fn tally(summary: &mut ExecutionSummary, results: Vec<(RetargetEdit, SiteResult)>) {
        let mut incomplete: BTreeMap<String, IncompleteGroup> = BTreeMap::new();
        for (edit, result) in results {
            let detail = match result {
                SiteResult::Rewritten(n) => {
                    summary.retargeted += n;
                    continue;
                }
                SiteResult::AlreadyDone => continue,
                SiteResult::Missing => ModrootError::MissingReference(format!(
                    "no slot holds '{}' any more",
                    edit.old
                ))
                .to_string(),
                SiteResult::Failed(e) => e,
            };

            incomplete
                .entry(edit.old.key())
                .or_insert_with(|| IncompleteGroup {
                    source: edit.old.clone(),
                    dest: edit.new.clone(),
                    missing: Vec::new(),
                })
                .missing
                .push(MissingSite {
                    site: edit.site.to_string(),
                    document: edit.site.document().clone(),
                    detail,
                });
        }
        summary.incomplete = incomplete.into_values().collect();
    }

    fn start_pass(&mut self, mod_info: &ModInfo, pass: Pass) -> Result<Option<PassReport>> {
        match self.scan(mod_info, pass) {
            Ok(Some(ctx)) => {
                let report = ctx.report(self.config.naming(pass));
                tracing::info!("{}", report.summary());
                self.pending = Some(ctx);
                self.transition(SessionState::AwaitingConfirmation(pass));
                Ok(Some(report))
            }
            Ok(None) => {
                tracing::info!("{} scan of {} cancelled", pass, mod_info.name);
                self.cancel.reset();
                self.transition(SessionState::Idle);
                Ok(None)
            }
            Err(e) => {
                self.transition(SessionState::Idle);
                Err(e)
            }
        }
    }

    /// Walk, classify and plan one pass; `None` if cancelled
    fn scan(&mut self, mod_info: &ModInfo, pass: Pass) -> Result<Option<PassContext>> {
        self.transition(SessionState::Scanning(pass));
        tracing::info!("Scanning {} of {}", pass, mod_info.name);
        self.cache.clear();
        self.assets.refresh()?;

        let mut index = ReverseIndex::new();
        let mut conflicts = Vec::new();
        let walker = ReferenceWalker::new(&self.assets, &self.containers, &self.cancel);
        let walk = match pass {
            Pass::Materials => {
                let mut sites = walker.material_sites(mod_info, &mut index)?;
                conflicts.extend(sites.by_ref().filter_map(|site| classify(&site, mod_info)));
                sites.finish()
            }
            Pass::Textures => {
                // Prefabs first, so the index knows which prefab uses each material
                let prefabs = walker.material_sites(mod_info, &mut index)?.index_only();
                if prefabs.cancelled {
                    prefabs
                } else {
                    let mut sites = walker.texture_sites(mod_info, &mut index)?;
                    conflicts.extend(sites.by_ref().filter_map(|site| classify(&site, mod_info)));
                    let mut walk = sites.finish();
                    let mut skipped = prefabs.skipped;
                    skipped.append(&mut walk.skipped);
                    walk.skipped = skipped;
                    walk
                }
            }
        };
        if walk.cancelled {
            return Ok(None);
        }

        self.transition(SessionState::Planning(pass));
        let naming = self.config.naming(pass);
        let plans = Planner::new(&self.assets, &mut self.cache, &index, naming).plan(&conflicts);
        if self.cancel.is_requested() {
            return Ok(None);
        }

        Ok(Some(PassContext {
            mod_info: mod_info.clone(),
            pass,
            has_prefabs: mod_info.has_prefabs(&self.assets),
            index,
            conflicts,
            plans,
            walk,
        }))
    }

    fn lookup(&self, mod_name: &str) -> Result<ModInfo> {
        self.catalog.get(mod_name).cloned().ok_or_else(|| {
            ModrootError::Configuration(format!(
                "No mod named '{}' under {}",
                mod_name,
                self.catalog.mods_root()
            ))
        })
    }

    fn require_idle(&self, action: &str) -> Result<()> {
        if self.state == SessionState::Idle {
            Ok(())
        } else {
            Err(ModrootError::InvalidState(format!(
                "Cannot {} while {}",
                action, self.state
            )))
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("Session: {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }
}
