//! Applying reconciliation plans to targets.
//!
//! For every target: check it exists, remove what the combinator owns but no longer
//! wants, then inject what it wants but does not own. A host failure is
//! recorded against its target and the pass moves on. Tracking changes only
//! when the host confirms an edit.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::host::{HostError, SectionHost};
use crate::section::{CombinatorId, GroupSpec, TargetId};

use super::plan::ReconcilePlan;
use super::registry::{SectionRegistry, TrackedSection};

/// Which edit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionOp {
    /// `add_section`.
    Add,
    /// `remove_section`.
    Remove,
}

/// A host edit that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFailure {
    /// The edit attempted.
    pub op: SectionOp,
    /// Spec being added or removed.
    pub spec: GroupSpec,
    /// Host error.
    pub error: HostError,
}

/// How a target was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutcome {
    /// The plan was applied (possibly with per-section failures).
    Applied,
    /// The target is gone; its tracking was dropped without host calls.
    Vanished,
    /// The target cannot hold sections; nothing was attempted.
    Unsupported,
}

/// Result of reconciling one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    /// The target.
    pub target: TargetId,
    /// How it was handled.
    pub outcome: TargetOutcome,
    /// Specs confirmed removed.
    pub removed: Vec<GroupSpec>,
    /// Specs confirmed injected.
    pub injected: Vec<GroupSpec>,
    /// Edits the host refused.
    pub failures: Vec<SectionFailure>,
    /// Entries of other combinators replaced by an injection here. Their host
    /// sections stay on the target, untracked.
    pub orphaned: Vec<TrackedSection>,
}

impl TargetReport {
    fn new(target: TargetId, outcome: TargetOutcome) -> Self {
        Self {
            target,
            outcome,
            removed: Vec::new(),
            injected: Vec::new(),
            failures: Vec::new(),
            orphaned: Vec::new(),
        }
    }
}

/// Result of reconciling a set of targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// One entry per target, in the order processed.
    pub targets: Vec<TargetReport>,
}

impl ReconcileReport {
    /// Total confirmed injections.
    #[must_use]
    pub fn injected_count(&self) -> usize {
        self.targets.iter().map(|t| t.injected.len()).sum()
    }

    /// Total confirmed removals.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.targets.iter().map(|t| t.removed.len()).sum()
    }

    /// Every failure with its target.
    pub fn failures(&self) -> impl Iterator<Item = (TargetId, &SectionFailure)> + '_ {
        self.targets
            .iter()
            .flat_map(|t| t.failures.iter().map(move |f| (t.target, f)))
    }

    /// Returns true if no host edit failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.targets.iter().all(|t| t.failures.is_empty())
    }

    /// Appends another report.
    pub fn extend(&mut self, other: Self) {
        self.targets.extend(other.targets);
    }
}

/// Reconciles one target of `owner` towards `desired`.
pub fn reconcile_target(
    host: &dyn SectionHost,
    registry: &mut SectionRegistry,
    owner: CombinatorId,
    target: TargetId,
    desired: &BTreeSet<GroupSpec>,
    tick: u64,
) -> TargetReport {
    if !host.target_exists(target) {
        let dropped = registry.forget_owned_on(owner, target);
        if !dropped.is_empty() {
            debug!(%owner, %target, dropped = dropped.len(), "target vanished, dropped tracking");
        }
        return TargetReport::new(target, TargetOutcome::Vanished);
    }
    if !host.target_supports_sections(target) {
        return TargetReport::new(target, TargetOutcome::Unsupported);
    }

    let owned = registry.owned_specs(owner, target);
    let plan = ReconcilePlan::compute(&owned, desired);
    let mut report = TargetReport::new(target, TargetOutcome::Applied);
    if plan.is_empty() {
        return report;
    }

    for spec in plan.remove {
        let Some(handle) = registry.get(target, &spec).map(|e| e.handle) else {
            continue;
        };
        match host.remove_section(target, handle) {
            // Already gone on the host side, which is the state we wanted.
            Ok(()) | Err(HostError::SectionNotFound { .. } | HostError::TargetNotFound(_)) => {
                registry.forget(target, &spec);
                report.removed.push(spec);
            }
            Err(error) => {
                warn!(%owner, %target, section = %spec, %error, "failed to remove section");
                report.failures.push(SectionFailure {
                    op: SectionOp::Remove,
                    spec,
                    error,
                });
            }
        }
    }

    for spec in plan.inject {
        match host.add_section(target, &spec) {
            Ok(handle) => {
                let previous = registry.record(TrackedSection {
                    target,
                    spec: spec.clone(),
                    owner,
                    handle,
                    injected_at: tick,
                });
                if let Some(prev) = previous {
                    warn!(
                        %target,
                        section = %spec,
                        previous_owner = %prev.owner,
                        new_owner = %owner,
                        orphaned_handle = ?prev.handle,
                        "section ownership taken over, previous section left untracked"
                    );
                    report.orphaned.push(prev);
                }
                report.injected.push(spec);
            }
            Err(error) => {
                warn!(%owner, %target, section = %spec, %error, "failed to inject section");
                report.failures.push(SectionFailure {
                    op: SectionOp::Add,
                    spec,
                    error,
                });
            }
        }
    }

    debug!(
        %owner,
        %target,
        removed = report.removed.len(),
        injected = report.injected.len(),
        failed = report.failures.len(),
        "reconciled target"
    );
    report
}

/// Reconciles every target in `targets` towards the same desired set.
pub fn reconcile(
    host: &dyn SectionHost,
    registry: &mut SectionRegistry,
    owner: CombinatorId,
    targets: &[TargetId],
    desired: &BTreeSet<GroupSpec>,
    tick: u64,
) -> ReconcileReport {
    ReconcileReport {
        targets: targets
            .iter()
            .map(|&target| reconcile_target(host, registry, owner, target, desired, tick))
            .collect(),
    }
}

/// Removes everything `owner` injected, on every target it touched.
pub fn cleanup(
    host: &dyn SectionHost,
    registry: &mut SectionRegistry,
    owner: CombinatorId,
    tick: u64,
) -> ReconcileReport {
    let targets: Vec<TargetId> = registry.owned_targets(owner).into_iter().collect();
    reconcile(host, registry, owner, &targets, &BTreeSet::new(), tick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;

    const A: CombinatorId = CombinatorId::new(1);
    const B: CombinatorId = CombinatorId::new(2);
    const X: TargetId = TargetId::new(100);

    fn desired(specs: &[GroupSpec]) -> BTreeSet<GroupSpec> {
        specs.iter().cloned().collect()
    }

    fn setup() -> (InMemoryHost, SectionRegistry) {
        let host = InMemoryHost::new();
        host.add_target(X);
        (host, SectionRegistry::new())
    }

    #[test]
    fn test_inject_then_remove() {
        let (host, mut reg) = setup();
        let g = GroupSpec::new("low-iron", 1.0);

        let r = reconcile_target(&host, &mut reg, A, X, &desired(&[g.clone()]), 1);
        assert_eq!(r.injected, vec![g.clone()]);
        assert_eq!(host.sections(X), vec![g.clone()]);

        // idempotent
        let r = reconcile_target(&host, &mut reg, A, X, &desired(&[g.clone()]), 2);
        assert!(r.injected.is_empty() && r.removed.is_empty());
        assert_eq!(host.section_count(X), 1);

        let r = reconcile_target(&host, &mut reg, A, X, &BTreeSet::new(), 3);
        assert_eq!(r.removed, vec![g]);
        assert_eq!(host.section_count(X), 0);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_never_removes_foreign_sections() {
        let (host, mut reg) = setup();
        let g = GroupSpec::new("g", 1.0);
        let h = GroupSpec::new("h", 1.0);
        host.add_manual_section(X, GroupSpec::new("manual", 1.0));

        reconcile_target(&host, &mut reg, A, X, &desired(&[g.clone()]), 1);
        reconcile_target(&host, &mut reg, B, X, &desired(&[h.clone()]), 1);
        reconcile_target(&host, &mut reg, B, X, &BTreeSet::new(), 2);

        assert_eq!(host.sections(X), vec![GroupSpec::new("manual", 1.0), g.clone()]);
        assert_eq!(reg.get(X, &g).unwrap().owner, A);
    }

    #[test]
    fn test_swap_spec_removes_before_injecting() {
        let (host, mut reg) = setup();
        let one = GroupSpec::new("g", 1.0);
        let two = GroupSpec::new("g", 2.0);
        reconcile_target(&host, &mut reg, A, X, &desired(&[one.clone()]), 1);
        let r = reconcile_target(&host, &mut reg, A, X, &desired(&[two.clone()]), 2);
        assert_eq!(r.removed, vec![one]);
        assert_eq!(r.injected, vec![two.clone()]);
        assert_eq!(host.sections(X), vec![two]);
    }

    #[test]
    fn test_vanished_target_drops_tracking_without_calls() {
        let (host, mut reg) = setup();
        reconcile_target(&host, &mut reg, A, X, &desired(&[GroupSpec::new("g", 1.0)]), 1);
        host.destroy_target(X);

        let r = reconcile_target(&host, &mut reg, A, X, &BTreeSet::new(), 2);
        assert_eq!(r.outcome, TargetOutcome::Vanished);
        assert!(r.removed.is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_unsupported_target_is_skipped() {
        let host = InMemoryHost::new();
        let pole = TargetId::new(5);
        host.add_plain_target(pole);
        let mut reg = SectionRegistry::new();
        let r = reconcile_target(&host, &mut reg, A, pole, &desired(&[GroupSpec::new("g", 1.0)]), 1);
        assert_eq!(r.outcome, TargetOutcome::Unsupported);
        assert!(r.failures.is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_failures_do_not_update_tracking_or_abort_batch() {
        let host = InMemoryHost::new();
        let bad = TargetId::new(1);
        let good = TargetId::new(2);
        host.add_target(bad);
        host.add_target(good);
        host.reject_operations(bad, "locked");
        let mut reg = SectionRegistry::new();
        let g = GroupSpec::new("g", 1.0);

        let report = reconcile(&host, &mut reg, A, &[bad, good], &desired(&[g.clone()]), 1);
        assert_eq!(report.injected_count(), 1);
        assert!(!report.is_clean());
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, bad);
        assert_eq!(failures[0].1.op, SectionOp::Add);
        assert!(reg.get(bad, &g).is_none());
        assert!(reg.get(good, &g).is_some());

        // a later pass retries the failed target
        host.accept_operations(bad);
        let report = reconcile(&host, &mut reg, A, &[bad, good], &desired(&[g.clone()]), 2);
        assert_eq!(report.injected_count(), 1);
        assert!(report.is_clean());
    }

    #[test]
    fn test_failed_removal_keeps_tracking() {
        let (host, mut reg) = setup();
        let g = GroupSpec::new("g", 1.0);
        reconcile_target(&host, &mut reg, A, X, &desired(&[g.clone()]), 1);
        host.reject_operations(X, "locked");
        let r = reconcile_target(&host, &mut reg, A, X, &BTreeSet::new(), 2);
        assert_eq!(r.failures[0].op, SectionOp::Remove);
        assert!(reg.get(X, &g).is_some());
        assert_eq!(host.section_count(X), 1);
    }

    #[test]
    fn test_cleanup_clears_only_own_sections_everywhere() {
        let host = InMemoryHost::new();
        let t1 = TargetId::new(1);
        let t2 = TargetId::new(2);
        host.add_target(t1);
        host.add_target(t2);
        let mut reg = SectionRegistry::new();
        let g = GroupSpec::new("g", 1.0);
        let h = GroupSpec::new("h", 1.0);

        reconcile(&host, &mut reg, A, &[t1, t2], &desired(&[g.clone()]), 1);
        reconcile(&host, &mut reg, B, &[t1], &desired(&[h.clone()]), 1);

        let report = cleanup(&host, &mut reg, A, 2);
        assert_eq!(report.removed_count(), 2);
        assert_eq!(host.sections(t1), vec![h]);
        assert_eq!(host.section_count(t2), 0);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_takeover_is_last_writer_wins() {
        let (host, mut reg) = setup();
        let g = GroupSpec::new("g", 1.0);
        let first = reconcile_target(&host, &mut reg, A, X, &desired(&[g.clone()]), 1);
        assert!(first.orphaned.is_empty());
        let a_handle = reg.get(X, &g).unwrap().handle;

        let second = reconcile_target(&host, &mut reg, B, X, &desired(&[g.clone()]), 2);
        assert_eq!(reg.get(X, &g).unwrap().owner, B);
        // A's section stays on the host and is reported as untracked.
        assert_eq!(host.section_count(X), 2);
        assert_eq!(second.orphaned.len(), 1);
        assert_eq!(second.orphaned[0].owner, A);
        assert_eq!(second.orphaned[0].handle, a_handle);

        // A no longer owns it, so A's cleanup leaves it alone
        cleanup(&host, &mut reg, A, 3);
        assert_eq!(reg.get(X, &g).unwrap().owner, B);
    }
}
