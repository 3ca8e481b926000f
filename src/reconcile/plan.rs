//! Pure diff between owned and desired sections.

use std::collections::BTreeSet;

use crate::section::GroupSpec;

/// Minimal edit set for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Owned specs that are no longer desired. Applied first.
    pub remove: Vec<GroupSpec>,
    /// Desired specs not yet owned.
    pub inject: Vec<GroupSpec>,
}

impl ReconcilePlan {
    /// Diffs what a combinator owns on a target against what it wants there.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use group_injector::{GroupSpec, ReconcilePlan};
    ///
    /// let owned = BTreeSet::from([GroupSpec::new("a", 1.0), GroupSpec::new("b", 1.0)]);
    /// let desired = BTreeSet::from([GroupSpec::new("b", 1.0), GroupSpec::new("b", 2.0)]);
    /// let plan = ReconcilePlan::compute(&owned, &desired);
    /// assert_eq!(plan.remove, vec![GroupSpec::new("a", 1.0)]);
    /// assert_eq!(plan.inject, vec![GroupSpec::new("b", 2.0)]);
    /// ```
    #[must_use]
    pub fn compute(owned: &BTreeSet<GroupSpec>, desired: &BTreeSet<GroupSpec>) -> Self {
        Self {
            remove: owned.difference(desired).cloned().collect(),
            inject: desired.difference(owned).cloned().collect(),
        }
    }

    /// Returns true if the target already matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.inject.is_empty()
    }
}
