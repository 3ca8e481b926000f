//! Section reconciliation.
//!
//! Reconciliation is split into a pure part and an effectful part:
//! [`ReconcilePlan::compute`] diffs owned against desired specs, and
//! [`reconcile`] applies plans through a [`crate::host::SectionHost`],
//! updating the [`SectionRegistry`] on confirmed edits only.

/// Plan application against the host.
pub mod engine;
/// Pure owned-versus-desired diff.
pub mod plan;
/// Tracked-section registry.
pub mod registry;

pub use engine::{
    cleanup, reconcile, reconcile_target, ReconcileReport, SectionFailure, SectionOp,
    TargetOutcome, TargetReport,
};
pub use plan::ReconcilePlan;
pub use registry::{SectionRegistry, TrackedSection};
