//! Signal identity.
//!
//! A signal is a typed, named, quality-qualified value carried on a circuit
//! channel. `SignalId` is a plain value type with structural equality and is
//! the only key type used by [`crate::store::SignalStore`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// The quality assumed when none is given.
pub const DEFAULT_QUALITY: &str = "normal";

fn default_quality() -> String {
    DEFAULT_QUALITY.to_string()
}

/// Kind of prototype a signal refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// An item prototype.
    Item,
    /// A fluid prototype.
    Fluid,
    /// A virtual signal.
    Virtual,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item => write!(f, "item"),
            Self::Fluid => write!(f, "fluid"),
            Self::Virtual => write!(f, "virtual"),
        }
    }
}

/// Structural identity of a signal: kind, name and quality.
///
/// # Examples
///
/// ```
/// use group_injector::{SignalId, SignalKind};
///
/// let a = SignalId::item("iron-plate");
/// let b = SignalId::new(SignalKind::Item, "iron-plate");
/// assert_eq!(a, b);
/// assert_eq!(a.quality, "normal");
/// assert_ne!(a, a.clone().with_quality("rare"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignalId {
    /// Prototype kind.
    pub kind: SignalKind,
    /// Prototype name.
    pub name: String,
    /// Quality name.
    #[serde(default = "default_quality")]
    pub quality: String,
}

impl SignalId {
    /// Creates a signal of normal quality.
    #[must_use]
    pub fn new(kind: SignalKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            quality: default_quality(),
        }
    }

    /// Creates an item signal of normal quality.
    #[must_use]
    pub fn item(name: impl Into<String>) -> Self {
        Self::new(SignalKind::Item, name)
    }

    /// Creates a fluid signal of normal quality.
    #[must_use]
    pub fn fluid(name: impl Into<String>) -> Self {
        Self::new(SignalKind::Fluid, name)
    }

    /// Creates a virtual signal of normal quality.
    #[must_use]
    pub fn virtual_signal(name: impl Into<String>) -> Self {
        Self::new(SignalKind::Virtual, name)
    }

    /// Replaces the quality.
    #[must_use]
    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    /// Returns the quality-insensitive identity of this signal.
    #[must_use]
    pub fn base(&self) -> BaseSignal {
        BaseSignal {
            kind: self.kind,
            name: self.name.clone(),
        }
    }

    /// Returns true if this signal has the given base identity.
    #[must_use]
    pub fn matches_base(&self, base: &BaseSignal) -> bool {
        self.kind == base.kind && self.name == base.name
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quality == DEFAULT_QUALITY {
            write!(f, "{}/{}", self.kind, self.name)
        } else {
            write!(f, "{}/{}@{}", self.kind, self.name, self.quality)
        }
    }
}

/// Signal identity with quality stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaseSignal {
    /// Prototype kind.
    pub kind: SignalKind,
    /// Prototype name.
    pub name: String,
}

impl From<&SignalId> for BaseSignal {
    fn from(id: &SignalId) -> Self {
        id.base()
    }
}
