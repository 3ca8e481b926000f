//! Condition building blocks: operands, comparators and combine operators.
//!
//! These types are serializable; they form the configuration a GUI or a save
//! file hands to the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::signal::SignalId;
use crate::store::ChannelFilter;

/// What a signal operand selects from its store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "signal", rename_all = "snake_case")]
pub enum SignalSelector {
    /// A single named signal.
    Signal(SignalId),
    /// Every signal, one comparison per signal; true if any is true.
    Each,
    /// True if any signal satisfies the comparison.
    Anything,
    /// True if all signals satisfy the comparison.
    Everything,
}

impl SignalSelector {
    /// Returns true for the reserved quantifier markers.
    #[must_use]
    pub const fn is_quantifier(&self) -> bool {
        !matches!(self, Self::Signal(_))
    }

    /// Returns true for `Each`.
    #[must_use]
    pub const fn is_each(&self) -> bool {
        matches!(self, Self::Each)
    }
}

impl fmt::Display for SignalSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(id) => write!(f, "{id}"),
            Self::Each => write!(f, "each"),
            Self::Anything => write!(f, "anything"),
            Self::Everything => write!(f, "everything"),
        }
    }
}

/// A signal reference together with the channels it reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalOperand {
    /// Signal or quantifier.
    pub selector: SignalSelector,
    /// Channels feeding this operand. Unset means both.
    #[serde(default)]
    pub channels: ChannelFilter,
    /// Read a named signal summed over all of its qualities.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub any_quality: bool,
}

impl SignalOperand {
    /// Creates an operand reading both channels.
    #[must_use]
    pub fn new(selector: SignalSelector) -> Self {
        Self {
            selector,
            channels: ChannelFilter::default(),
            any_quality: false,
        }
    }

    /// Creates an operand for a single named signal.
    #[must_use]
    pub fn signal(id: SignalId) -> Self {
        Self::new(SignalSelector::Signal(id))
    }

    /// Creates an `Each` operand.
    #[must_use]
    pub fn each() -> Self {
        Self::new(SignalSelector::Each)
    }

    /// Creates an `Anything` operand.
    #[must_use]
    pub fn anything() -> Self {
        Self::new(SignalSelector::Anything)
    }

    /// Creates an `Everything` operand.
    #[must_use]
    pub fn everything() -> Self {
        Self::new(SignalSelector::Everything)
    }

    /// Sets the channel filter.
    #[must_use]
    pub fn on(mut self, channels: ChannelFilter) -> Self {
        self.channels = channels;
        self
    }

    /// Makes a named signal read every quality.
    #[must_use]
    pub fn any_quality(mut self) -> Self {
        self.any_quality = true;
        self
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Operand {
    /// A literal value.
    Constant(i32),
    /// A signal read from the circuit.
    Signal(SignalOperand),
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Self::Constant(v)
    }
}

impl From<SignalOperand> for Operand {
    fn from(v: SignalOperand) -> Self {
        Self::Signal(v)
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    /// `<`
    #[serde(rename = "<")]
    Less,
    /// `>`
    #[serde(rename = ">")]
    Greater,
    /// `=`
    #[serde(rename = "=")]
    Equal,
    /// `≠`
    #[serde(rename = "≠", alias = "!=")]
    NotEqual,
    /// `≤`
    #[serde(rename = "≤", alias = "<=")]
    LessOrEqual,
    /// `≥`
    #[serde(rename = "≥", alias = ">=")]
    GreaterOrEqual,
}

impl Comparator {
    /// Applies the comparison.
    #[must_use]
    pub const fn apply(self, left: i32, right: i32) -> bool {
        match self {
            Self::Less => left < right,
            Self::Greater => left > right,
            Self::Equal => left == right,
            Self::NotEqual => left != right,
            Self::LessOrEqual => left <= right,
            Self::GreaterOrEqual => left >= right,
        }
    }

    /// Returns the operator symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::Greater => ">",
            Self::Equal => "=",
            Self::NotEqual => "≠",
            Self::LessOrEqual => "≤",
            Self::GreaterOrEqual => "≥",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Operator joining a condition to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineOp {
    /// Binds tighter than `Or`.
    And,
    /// Starts a new group.
    Or,
}

/// One comparison in a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    /// Left operand; may use any quantifier.
    pub left: SignalOperand,
    /// Comparison operator.
    pub comparator: Comparator,
    /// Right operand.
    pub right: Operand,
    /// How this condition joins the previous ones. Ignored on the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combine: Option<CombineOp>,
}

impl Condition {
    /// Creates an untagged condition, suitable as the first of a list.
    #[must_use]
    pub fn new(left: SignalOperand, comparator: Comparator, right: impl Into<Operand>) -> Self {
        Self {
            left,
            comparator,
            right: right.into(),
            combine: None,
        }
    }

    /// Tags this condition with `And`.
    #[must_use]
    pub fn and(mut self) -> Self {
        self.combine = Some(CombineOp::And);
        self
    }

    /// Tags this condition with `Or`.
    #[must_use]
    pub fn or(mut self) -> Self {
        self.combine = Some(CombineOp::Or);
        self
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.right {
            Operand::Constant(v) => write!(f, "{} {} {v}", self.left.selector, self.comparator),
            Operand::Signal(s) => {
                write!(f, "{} {} {}", self.left.selector, self.comparator, s.selector)
            }
        }
    }
}
