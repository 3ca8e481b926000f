//! In-memory host.
//!
//! Thread-safe implementation of all three collaborator traits. It is
//! intended for embedded usage, tests, and as a reference implementation of
//! the host contract. Failure injection (`reject_operations`) lets callers
//! exercise the apply-failure paths of reconciliation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::section::{CombinatorId, GroupSpec, SectionHandle, TargetId};
use crate::signal::SignalId;
use crate::store::{Channel, SignalStore};

use super::traits::{HostError, SectionHost, SignalSource, WiringSource};

fn lock_err(context: &'static str) -> HostError {
    HostError::Poisoned { context }
}

#[derive(Debug, Default)]
struct TargetState {
    supports_sections: bool,
    sections: BTreeMap<SectionHandle, GroupSpec>,
    rejecting: Option<String>,
}

#[derive(Debug, Default)]
struct HostState {
    signals: HashMap<(CombinatorId, Channel), SignalStore>,
    wiring: HashMap<CombinatorId, Vec<TargetId>>,
    targets: HashMap<TargetId, TargetState>,
    next_handle: u64,
}

/// In-memory implementation of [`SignalSource`], [`WiringSource`] and [`SectionHost`].
#[derive(Debug, Default)]
pub struct InMemoryHost {
    state: RwLock<HostState>,
}

impl InMemoryHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self, context: &'static str) -> Result<RwLockWriteGuard<'_, HostState>, HostError> {
        self.state.write().map_err(|_| lock_err(context))
    }

    fn read(&self, context: &'static str) -> Result<RwLockReadGuard<'_, HostState>, HostError> {
        self.state.read().map_err(|_| lock_err(context))
    }

    fn insert_target(&self, target: TargetId, supports_sections: bool) {
        if let Ok(mut state) = self.write("insert_target") {
            state.targets.insert(
                target,
                TargetState {
                    supports_sections,
                    ..TargetState::default()
                },
            );
        }
    }

    /// Spawns a target that can hold sections.
    pub fn add_target(&self, target: TargetId) {
        self.insert_target(target, true);
    }

    /// Spawns a target that cannot hold sections.
    pub fn add_plain_target(&self, target: TargetId) {
        self.insert_target(target, false);
    }

    /// Destroys a target. Wiring to it is left in place, as a host would
    /// until it raises the wiring-change notification.
    pub fn destroy_target(&self, target: TargetId) {
        if let Ok(mut state) = self.write("destroy_target") {
            state.targets.remove(&target);
        }
    }

    /// Wires a target to a combinator.
    pub fn connect(&self, combinator: CombinatorId, target: TargetId) {
        if let Ok(mut state) = self.write("connect") {
            let targets = state.wiring.entry(combinator).or_default();
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }

    /// Removes the wire between a combinator and a target.
    pub fn disconnect(&self, combinator: CombinatorId, target: TargetId) {
        if let Ok(mut state) = self.write("disconnect") {
            if let Some(targets) = state.wiring.get_mut(&combinator) {
                targets.retain(|t| *t != target);
            }
        }
    }

    /// Replaces one channel of a combinator.
    pub fn set_channel(&self, combinator: CombinatorId, channel: Channel, signals: SignalStore) {
        if let Ok(mut state) = self.write("set_channel") {
            state.signals.insert((combinator, channel), signals);
        }
    }

    /// Sets one signal on one channel of a combinator.
    pub fn set_signal(&self, combinator: CombinatorId, channel: Channel, id: SignalId, count: i32) {
        if let Ok(mut state) = self.write("set_signal") {
            state
                .signals
                .entry((combinator, channel))
                .or_default()
                .set(id, count);
        }
    }

    fn set_rejecting(&self, target: TargetId, reason: Option<String>) {
        if let Ok(mut state) = self.write("set_rejecting") {
            if let Some(t) = state.targets.get_mut(&target) {
                t.rejecting = reason;
            }
        }
    }

    /// Makes every add/remove on the target fail with `reason`.
    pub fn reject_operations(&self, target: TargetId, reason: impl Into<String>) {
        self.set_rejecting(target, Some(reason.into()));
    }

    /// Clears a previous `reject_operations`.
    pub fn accept_operations(&self, target: TargetId) {
        self.set_rejecting(target, None);
    }

    /// Adds a section that no combinator owns, as a player would by hand.
    pub fn add_manual_section(&self, target: TargetId, spec: GroupSpec) -> Option<SectionHandle> {
        let mut state = self.write("add_manual_section").ok()?;
        let handle = SectionHandle::new(state.next_handle);
        let t = state.targets.get_mut(&target)?;
        if !t.supports_sections {
            return None;
        }
        t.sections.insert(handle, spec);
        state.next_handle += 1;
        Some(handle)
    }

    /// Specs of every section on the target, in creation order.
    #[must_use]
    pub fn sections(&self, target: TargetId) -> Vec<GroupSpec> {
        self.read("sections")
            .ok()
            .and_then(|state| {
                state
                    .targets
                    .get(&target)
                    .map(|t| t.sections.values().cloned().collect())
            })
            .unwrap_or_default()
    }

    /// Number of sections on the target.
    #[must_use]
    pub fn section_count(&self, target: TargetId) -> usize {
        self.read("section_count")
            .ok()
            .and_then(|state| state.targets.get(&target).map(|t| t.sections.len()))
            .unwrap_or(0)
    }
}

impl SignalSource for InMemoryHost {
    fn channel_signals(&self, combinator: CombinatorId, channel: Channel) -> SignalStore {
        self.read("channel_signals")
            .ok()
            .and_then(|state| state.signals.get(&(combinator, channel)).cloned())
            .unwrap_or_default()
    }
}

impl WiringSource for InMemoryHost {
    fn connected_targets(&self, combinator: CombinatorId) -> Vec<TargetId> {
        self.read("connected_targets")
            .ok()
            .and_then(|state| state.wiring.get(&combinator).cloned())
            .unwrap_or_default()
    }
}

impl SectionHost for InMemoryHost {
    // A poisoned host reports targets as absent; the edits below surface the
    // poisoning as an error instead.
    fn target_exists(&self, target: TargetId) -> bool {
        self.read("target_exists")
            .is_ok_and(|state| state.targets.contains_key(&target))
    }

    fn target_supports_sections(&self, target: TargetId) -> bool {
        self.read("target_supports_sections").is_ok_and(|state| {
            state
                .targets
                .get(&target)
                .is_some_and(|t| t.supports_sections)
        })
    }

    fn add_section(&self, target: TargetId, spec: &GroupSpec) -> Result<SectionHandle, HostError> {
        let mut state = self.write("add_section")?;
        let handle = SectionHandle::new(state.next_handle);
        let t = state
            .targets
            .get_mut(&target)
            .ok_or(HostError::TargetNotFound(target))?;
        if !t.supports_sections {
            return Err(HostError::Unsupported(target));
        }
        if let Some(reason) = &t.rejecting {
            return Err(HostError::Rejected {
                target,
                reason: reason.clone(),
            });
        }
        t.sections.insert(handle, spec.clone());
        state.next_handle += 1;
        Ok(handle)
    }

    fn remove_section(&self, target: TargetId, handle: SectionHandle) -> Result<(), HostError> {
        let mut state = self.write("remove_section")?;
        let t = state
            .targets
            .get_mut(&target)
            .ok_or(HostError::TargetNotFound(target))?;
        if !t.supports_sections {
            return Err(HostError::Unsupported(target));
        }
        if let Some(reason) = &t.rejecting {
            return Err(HostError::Rejected {
                target,
                reason: reason.clone(),
            });
        }
        t.sections
            .remove(&handle)
            .map(|_| ())
            .ok_or(HostError::SectionNotFound { target, handle })
    }
}
