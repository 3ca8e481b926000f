//! Condition model, validation, evaluation and precedence.

/// Single-comparison evaluation with quantifiers.
pub mod evaluator;
/// Operands, comparators and conditions.
pub mod operand;
/// AND-before-OR folding.
pub mod precedence;
/// Configuration-time checks.
pub mod validation;

pub use evaluator::{evaluate, RightSide};
pub use operand::{CombineOp, Comparator, Condition, Operand, SignalOperand, SignalSelector};
pub use precedence::{resolve, resolve_lazy};
pub use validation::validate_conditions;

use crate::store::SignalStore;

/// Evaluates an ordered condition list against the raw channels.
#[must_use]
pub fn evaluate_all(conditions: &[Condition], red: &SignalStore, green: &SignalStore) -> bool {
    resolve_lazy(conditions, |c| c.evaluate(red, green))
}
