//! # group-injector
//!
//! Circuit-driven group injection. A combinator reads the signals on its red
//! and green circuit channels, evaluates a small list of rules, and adds or
//! removes named logistic sections (group name plus multiplier) on the
//! entities wired to it.
//!
//! ## Core Concepts
//!
//! - **Signal store**: a sparse `SignalId -> i32` map per channel
//! - **Condition**: one comparison, optionally quantified over the store
//!   (`Each`, `Anything`, `Everything`), joined with AND before OR
//! - **Rule**: an edge-triggered state machine over its conditions
//! - **Reconciliation**: a pure diff between the sections a combinator owns
//!   and the ones it wants, applied through the host
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use group_injector::condition::{Comparator, Condition, SignalOperand};
//! use group_injector::{
//!     Channel, CombinatorId, GroupSpec, InMemoryHost, InjectorEngine, RuleAction, RuleConfig,
//!     SignalId, TargetId,
//! };
//!
//! let host = Arc::new(InMemoryHost::new());
//! let (combinator, chest) = (CombinatorId::new(1), TargetId::new(2));
//! host.add_target(chest);
//! host.connect(combinator, chest);
//!
//! let mut engine = InjectorEngine::from_host(host.clone());
//! let rule = RuleConfig::new(
//!     vec![Condition::new(
//!         SignalOperand::signal(SignalId::item("iron-plate")),
//!         Comparator::Less,
//!         100,
//!     )],
//!     RuleAction::Inject,
//!     GroupSpec::new("low-iron", 1.0),
//! );
//! engine.add_combinator(combinator, vec![rule])?;
//!
//! host.set_signal(combinator, Channel::Red, SignalId::item("iron-plate"), 50);
//! engine.evaluate(combinator, 1)?;
//! assert_eq!(host.sections(chest), vec![GroupSpec::new("low-iron", 1.0)]);
//! # Ok::<(), group_injector::InjectorError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Value types
pub mod section;
pub mod signal;
pub mod store;

// Evaluation
pub mod condition;
pub mod rule;

// Reconciliation and orchestration
pub mod combinator;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod reconcile;

// Re-export primary types at crate root for convenience
pub use combinator::{CombinatorState, PassReport};
pub use config::EngineConfig;
pub use engine::InjectorEngine;
pub use error::{ExecutionError, InjectorError, InjectorResult, ValidationError};
pub use host::{HostError, InMemoryHost, SectionHost, SignalSource, WiringSource};
pub use reconcile::{
    ReconcilePlan, ReconcileReport, SectionRegistry, TargetOutcome, TargetReport, TrackedSection,
};
pub use rule::{Rule, RuleAction, RuleConfig, RuleEdge, RuleId, RuleSnapshot};
pub use section::{CombinatorId, GroupSpec, SectionHandle, TargetId};
pub use signal::{BaseSignal, SignalId, SignalKind};
pub use store::{filtered, merge, Channel, ChannelFilter, SignalStore};
