//! AND-before-OR folding of condition results.
//!
//! Conditions are grouped left to right: every `Or` closes the current group
//! and opens a new one, everything else extends it. A group is the AND of its
//! members and the result is the OR of the groups, so
//! `A and B or C and D or E` reads as `(A and B) or (C and D) or E`.
//!
//! An empty list is false, so a rule without conditions never fires.

use super::operand::{CombineOp, Condition};

/// Folds `(combine, result)` pairs. The first pair's operator is ignored.
///
/// # Examples
///
/// ```
/// use group_injector::condition::{resolve, CombineOp};
///
/// let r = resolve([
///     (None, true),
///     (Some(CombineOp::And), true),
///     (Some(CombineOp::Or), false),
///     (Some(CombineOp::And), true),
/// ]);
/// assert!(r);
/// assert!(!resolve(std::iter::empty()));
/// ```
pub fn resolve<I>(results: I) -> bool
where
    I: IntoIterator<Item = (Option<CombineOp>, bool)>,
{
    let mut seen_any = false;
    let mut group = true;
    for (index, (op, value)) in results.into_iter().enumerate() {
        seen_any = true;
        if index > 0 && op == Some(CombineOp::Or) {
            if group {
                return true;
            }
            group = true;
        }
        group = group && value;
    }
    seen_any && group
}

/// Folds a condition list, evaluating a condition only while its value can
/// still change the outcome.
///
/// Within a group, conditions after the first false member are skipped. The
/// first group that is fully true ends the evaluation.
pub fn resolve_lazy<F>(conditions: &[Condition], mut eval: F) -> bool
where
    F: FnMut(&Condition) -> bool,
{
    if conditions.is_empty() {
        return false;
    }
    let mut group = true;
    for (index, condition) in conditions.iter().enumerate() {
        if index > 0 && condition.combine == Some(CombineOp::Or) {
            if group {
                return true;
            }
            group = true;
        }
        if group {
            group = eval(condition);
        }
    }
    group
}
