//! Section and entity identity types.
//!
//! A target entity carries named configuration groups ("sections"). The
//! engine injects and removes them by [`GroupSpec`]; the host hands back an
//! opaque [`SectionHandle`] for every section it creates.

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum length of a group name.
pub const MAX_GROUP_NAME_LEN: usize = 256;

/// Host unit number of a target entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(u64);

impl TargetId {
    /// Wraps a host unit number.
    #[must_use]
    pub const fn new(unit_number: u64) -> Self {
        Self(unit_number)
    }

    /// Returns the host unit number.
    #[must_use]
    pub const fn unit_number(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Host unit number of a combinator entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinatorId(u64);

impl CombinatorId {
    /// Wraps a host unit number.
    #[must_use]
    pub const fn new(unit_number: u64) -> Self {
        Self(unit_number)
    }

    /// Returns the host unit number.
    #[must_use]
    pub const fn unit_number(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CombinatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "combinator#{}", self.0)
    }
}

/// Opaque handle of a section created on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionHandle(u64);

impl SectionHandle {
    /// Wraps a host handle value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw host value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// An injectable configuration group: name plus multiplier.
///
/// Identity is the pair. Two specs naming the same group with different
/// multipliers are tracked as different sections.
///
/// # Examples
///
/// ```
/// use group_injector::GroupSpec;
///
/// let a = GroupSpec::new("low-iron", 1.0);
/// let b = GroupSpec::new("low-iron", 2.0);
/// assert_ne!(a, b);
/// assert!(a < b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Name of the group on the target.
    pub group_name: String,
    /// Multiplier applied to the group's contents.
    pub multiplier: OrderedFloat<f64>,
}

impl GroupSpec {
    /// Creates a group spec.
    #[must_use]
    pub fn new(group_name: impl Into<String>, multiplier: f64) -> Self {
        Self {
            group_name: group_name.into(),
            multiplier: OrderedFloat(multiplier),
        }
    }

    /// Returns the multiplier as a plain float.
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.multiplier.into_inner()
    }

    /// Validates the group name and multiplier.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.group_name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyGroupName);
        }
        if name.len() > MAX_GROUP_NAME_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "group_name".to_string(),
                max_length: MAX_GROUP_NAME_LEN,
            });
        }
        let m = self.multiplier();
        if !m.is_finite() || m <= 0.0 {
            return Err(ValidationError::InvalidMultiplier { value: m });
        }
        Ok(())
    }
}

impl fmt::Display for GroupSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.group_name, self.multiplier)
    }
}
