//! Error types for the injector engine.
//!
//! All errors are strongly typed using thiserror so callers can match on the
//! specific condition. Host-boundary failures live in [`crate::host::HostError`];
//! they are recorded per target and never surface through this type.

use thiserror::Error;

use crate::section::CombinatorId;

/// Errors raised while accepting configuration.
///
/// A configuration that produced one of these never reaches evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// `anything` or `everything` used as a right operand.
    #[error("Condition {index}: '{selector}' is not allowed as the right operand")]
    QuantifierOnRight {
        /// Position of the condition in its rule.
        index: usize,
        /// The offending selector.
        selector: String,
    },

    /// `each` on the right paired with a non-`each` left operand.
    #[error("Condition {index}: 'each' on the right requires 'each' on the left")]
    EachWithoutEach {
        /// Position of the condition in its rule.
        index: usize,
    },

    /// A condition after the first without an and/or operator.
    #[error("Condition {index}: missing and/or operator")]
    MissingCombineOp {
        /// Position of the condition in its rule.
        index: usize,
    },

    /// A named signal with a blank name.
    #[error("Signal name cannot be empty")]
    EmptySignalName,

    /// A section with a blank group name.
    #[error("Group name cannot be empty")]
    EmptyGroupName,

    /// A string field longer than its limit.
    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    FieldTooLong {
        /// Field name.
        field: String,
        /// Allowed length.
        max_length: usize,
    },

    /// A section multiplier that is not finite or not positive.
    #[error("Multiplier {value} must be finite and greater than zero")]
    InvalidMultiplier {
        /// The rejected multiplier.
        value: f64,
    },

    /// More rules or conditions than the engine limits allow.
    #[error("Too many {what}: {actual} (max: {max})")]
    LimitExceeded {
        /// What was counted.
        what: String,
        /// Configured limit.
        max: usize,
        /// Count supplied.
        actual: usize,
    },

    /// An engine configuration that cannot be used.
    #[error("Invalid engine configuration: {reason}")]
    InvalidConfig {
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors raised by engine operations on combinators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// No combinator with this ID is registered.
    #[error("Combinator not found: {id}")]
    CombinatorNotFound {
        /// Requested combinator.
        id: CombinatorId,
    },

    /// A combinator with this ID is already registered.
    #[error("Combinator already registered: {id}")]
    DuplicateCombinator {
        /// Conflicting combinator.
        id: CombinatorId,
    },
}

/// Top-level error type for the injector engine.
#[derive(Debug, Error)]
pub enum InjectorError {
    /// Configuration was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An engine operation failed.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Unexpected failure outside the caller's control.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl InjectorError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for engine operations.
pub type InjectorResult<T> = Result<T, InjectorError>;
