//! Tracked-section registry.
//!
//! Records which combinator injected which section on which target. The
//! registry is passed into reconciliation explicitly; nothing reads it from
//! ambient state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::section::{CombinatorId, GroupSpec, SectionHandle, TargetId};

/// A section injected by a combinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedSection {
    /// Target carrying the section.
    pub target: TargetId,
    /// Spec the section was created from.
    pub spec: GroupSpec,
    /// Combinator that injected it.
    pub owner: CombinatorId,
    /// Host handle of the section.
    pub handle: SectionHandle,
    /// Tick of the injection.
    pub injected_at: u64,
}

/// All tracked sections, keyed by `(target, spec)`.
///
/// At most one owner per key. Recording a key that another combinator owns
/// replaces the old entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionRegistry {
    entries: BTreeMap<(TargetId, GroupSpec), TrackedSection>,
}

impl SectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from saved entries. Later duplicates win.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = TrackedSection>) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            registry.record(entry);
        }
        registry
    }

    /// Number of tracked sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the entry for a key.
    #[must_use]
    pub fn get(&self, target: TargetId, spec: &GroupSpec) -> Option<&TrackedSection> {
        self.entries.get(&(target, spec.clone()))
    }

    /// Iterates over every entry in key order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedSection> + '_ {
        self.entries.values()
    }

    /// Specs `owner` has injected on `target`.
    #[must_use]
    pub fn owned_specs(&self, owner: CombinatorId, target: TargetId) -> BTreeSet<GroupSpec> {
        self.entries
            .range((target, GroupSpec::new(String::new(), f64::NEG_INFINITY))..)
            .take_while(|((t, _), _)| *t == target)
            .filter(|(_, e)| e.owner == owner)
            .map(|((_, spec), _)| spec.clone())
            .collect()
    }

    /// Targets on which `owner` has at least one section.
    #[must_use]
    pub fn owned_targets(&self, owner: CombinatorId) -> BTreeSet<TargetId> {
        self.entries
            .values()
            .filter(|e| e.owner == owner)
            .map(|e| e.target)
            .collect()
    }

    /// Records an entry and returns the one it replaced, if any.
    pub fn record(&mut self, entry: TrackedSection) -> Option<TrackedSection> {
        self.entries
            .insert((entry.target, entry.spec.clone()), entry)
    }

    /// Removes the entry for a key.
    pub fn forget(&mut self, target: TargetId, spec: &GroupSpec) -> Option<TrackedSection> {
        self.entries.remove(&(target, spec.clone()))
    }

    /// Removes the entries `owner` holds on `target`.
    pub fn forget_owned_on(&mut self, owner: CombinatorId, target: TargetId) -> Vec<TrackedSection> {
        self.drain_where(|e| e.owner == owner && e.target == target)
    }

    /// Removes every entry on `target`, whoever owns it.
    pub fn forget_target(&mut self, target: TargetId) -> Vec<TrackedSection> {
        self.drain_where(|e| e.target == target)
    }

    fn drain_where<F>(&mut self, mut pred: F) -> Vec<TrackedSection>
    where
        F: FnMut(&TrackedSection) -> bool,
    {
        let keys: Vec<(TargetId, GroupSpec)> = self
            .entries
            .iter()
            .filter(|(_, e)| pred(e))
            .map(|(k, _)| k.clone())
            .collect();
        keys.into_iter()
            .filter_map(|k| self.entries.remove(&k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(target: u64, name: &str, owner: u64, handle: u64) -> TrackedSection {
        TrackedSection {
            target: TargetId::new(target),
            spec: GroupSpec::new(name, 1.0),
            owner: CombinatorId::new(owner),
            handle: SectionHandle::new(handle),
            injected_at: 0,
        }
    }

    #[test]
    fn test_owned_specs_filters_owner_and_target() {
        let reg = SectionRegistry::from_entries([
            entry(1, "a", 10, 0),
            entry(1, "b", 20, 1),
            entry(2, "c", 10, 2),
            entry(1, "d", 10, 3),
        ]);
        let specs: Vec<String> = reg
            .owned_specs(CombinatorId::new(10), TargetId::new(1))
            .into_iter()
            .map(|s| s.group_name)
            .collect();
        assert_eq!(specs, vec!["a", "d"]);
        assert_eq!(
            reg.owned_targets(CombinatorId::new(10)),
            BTreeSet::from([TargetId::new(1), TargetId::new(2)])
        );
    }

    #[test]
    fn test_record_is_last_writer_wins() {
        let mut reg = SectionRegistry::new();
        assert!(reg.record(entry(1, "a", 10, 0)).is_none());
        let replaced = reg.record(entry(1, "a", 20, 5)).unwrap();
        assert_eq!(replaced.owner, CombinatorId::new(10));
        assert_eq!(reg.len(), 1);
        assert_eq!(
            reg.get(TargetId::new(1), &GroupSpec::new("a", 1.0)).unwrap().owner,
            CombinatorId::new(20)
        );
    }

    #[test]
    fn test_forget_helpers() {
        let mut reg = SectionRegistry::from_entries([
            entry(1, "a", 10, 0),
            entry(1, "b", 20, 1),
            entry(2, "a", 10, 2),
        ]);
        let dropped = reg.forget_owned_on(CombinatorId::new(10), TargetId::new(1));
        assert_eq!(dropped.len(), 1);
        assert_eq!(reg.len(), 2);

        let dropped = reg.forget_target(TargetId::new(2));
        assert_eq!(dropped.len(), 1);
        assert!(reg.forget(TargetId::new(1), &GroupSpec::new("b", 1.0)).is_some());
        assert!(reg.is_empty());
    }
}
