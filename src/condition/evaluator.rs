//! Condition evaluation.
//!
//! A condition is evaluated against the two raw channel stores of a
//! combinator. Each operand first picks its own channels, then the left
//! selector decides how the resulting store is compared:
//!
//! | Left selector | Result |
//! |---|---|
//! | signal | compare the one signal (0 when absent) |
//! | anything | any entry matches; empty store is false |
//! | everything | every entry matches; empty store compares a single 0 |
//! | each | any per-signal comparison matches; with `each` on the right, each signal is compared to itself |

use crate::signal::SignalId;
use crate::store::{filtered, SignalStore};

use super::operand::{Comparator, Condition, Operand, SignalOperand, SignalSelector};

/// Resolved right-hand side of a comparison.
#[derive(Debug, Clone, Copy)]
pub enum RightSide<'a> {
    /// A single value shared by every comparison.
    Value(i32),
    /// Per-signal values, used when both sides are `Each`.
    EachStore(&'a SignalStore),
}

impl RightSide<'_> {
    /// Value to compare against the given left signal.
    #[must_use]
    pub fn for_signal(&self, id: &SignalId) -> i32 {
        match self {
            Self::Value(v) => *v,
            Self::EachStore(store) => store.get(id),
        }
    }

    /// Value to compare against when there is no left signal.
    #[must_use]
    pub const fn scalar(&self) -> i32 {
        match self {
            Self::Value(v) => *v,
            Self::EachStore(_) => 0,
        }
    }
}

/// Evaluates one comparison against an already filtered left store.
#[must_use]
pub fn evaluate(
    left: &SignalStore,
    selector: &SignalSelector,
    any_quality: bool,
    comparator: Comparator,
    right: RightSide<'_>,
) -> bool {
    match selector {
        SignalSelector::Signal(id) => {
            let value = if any_quality {
                left.count_any_quality(&id.base())
            } else {
                left.get(id)
            };
            comparator.apply(value, right.for_signal(id))
        }
        SignalSelector::Anything | SignalSelector::Each => left
            .iter()
            .any(|(id, v)| comparator.apply(v, right.for_signal(id))),
        SignalSelector::Everything => {
            if left.is_empty() {
                return comparator.apply(0, right.scalar());
            }
            left.iter()
                .all(|(id, v)| comparator.apply(v, right.for_signal(id)))
        }
    }
}

/// Reads an operand's value from the raw channels as a single number.
fn read_signal_operand(operand: &SignalOperand, red: &SignalStore, green: &SignalStore) -> i32 {
    match &operand.selector {
        SignalSelector::Signal(id) => {
            let store = filtered(red, green, Some(operand.channels));
            if operand.any_quality {
                store.count_any_quality(&id.base())
            } else {
                store.get(id)
            }
        }
        // Quantifiers on the right are rejected by validation.
        _ => 0,
    }
}

impl Condition {
    /// Evaluates this condition against the raw red and green channels.
    ///
    /// The condition must have passed [`Condition::validate`].
    #[must_use]
    pub fn evaluate(&self, red: &SignalStore, green: &SignalStore) -> bool {
        let left = filtered(red, green, Some(self.left.channels));
        match &self.right {
            Operand::Constant(v) => evaluate(
                &left,
                &self.left.selector,
                self.left.any_quality,
                self.comparator,
                RightSide::Value(*v),
            ),
            Operand::Signal(right) if right.selector.is_each() => {
                let right_store = filtered(red, green, Some(right.channels));
                evaluate(
                    &left,
                    &self.left.selector,
                    self.left.any_quality,
                    self.comparator,
                    RightSide::EachStore(&right_store),
                )
            }
            Operand::Signal(right) => evaluate(
                &left,
                &self.left.selector,
                self.left.any_quality,
                self.comparator,
                RightSide::Value(read_signal_operand(right, red, green)),
            ),
        }
    }
}
