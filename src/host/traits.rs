//! Collaborator traits at the host boundary.
//!
//! The engine never reaches into the game directly. Signals, wiring and
//! section edits all go through these traits, so the same engine runs
//! against the in-memory host in tests and against host-specific glue in
//! production.

use thiserror::Error;

use crate::section::{CombinatorId, GroupSpec, SectionHandle, TargetId};
use crate::store::{Channel, SignalStore};

/// Failures reported by the host when editing sections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The target no longer exists.
    #[error("Target not found: {0}")]
    TargetNotFound(TargetId),

    /// The target cannot hold sections.
    #[error("Target does not support sections: {0}")]
    Unsupported(TargetId),

    /// The section to remove is not on the target.
    #[error("Section {handle:?} not found on {target}")]
    SectionNotFound {
        /// Target that was edited.
        target: TargetId,
        /// Handle that was not found.
        handle: SectionHandle,
    },

    /// The host refused the edit.
    #[error("Host rejected the operation on {target}: {reason}")]
    Rejected {
        /// Target that was edited.
        target: TargetId,
        /// Host-provided reason.
        reason: String,
    },
    /// The host's own state is unusable after a panic while it was held.
    #[error("Host state lock poisoned: {context}")]
    Poisoned {
        /// Operation that found the lock poisoned.
        context: &'static str,
    },
}

/// Read-only access to the circuit channels of a combinator.
pub trait SignalSource: Send + Sync {
    /// Snapshot of one channel's current values. An unconnected channel is empty.
    fn channel_signals(&self, combinator: CombinatorId, channel: Channel) -> SignalStore;
}

/// Access to the wiring between combinators and targets.
pub trait WiringSource: Send + Sync {
    /// Targets currently wired to a combinator.
    ///
    /// Callers cache the result until the host reports a wiring change.
    fn connected_targets(&self, combinator: CombinatorId) -> Vec<TargetId>;
}

/// Section editing on target entities.
///
/// # Contract
/// - `target_exists` and `target_supports_sections` are cheap checks; the
///   engine calls them once per target per reconciliation pass.
/// - `add_section` returns a handle that stays valid for `remove_section`
///   until that section is removed.
pub trait SectionHost: Send + Sync {
    /// Returns true while the target entity is alive.
    fn target_exists(&self, target: TargetId) -> bool;

    /// Returns true if the target can hold sections.
    fn target_supports_sections(&self, target: TargetId) -> bool;

    /// Adds a section for `spec` to the target.
    fn add_section(&self, target: TargetId, spec: &GroupSpec) -> Result<SectionHandle, HostError>;

    /// Removes a previously added section.
    fn remove_section(&self, target: TargetId, handle: SectionHandle) -> Result<(), HostError>;
}
