//! Signal store and channel aggregation.
//!
//! A combinator reads two independent circuit channels. Each operand of a
//! condition selects which of them it sees through a [`ChannelFilter`], and
//! the selected channels are summed into one [`SignalStore`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::signal::{BaseSignal, SignalId};

/// One of the two raw circuit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// The red wire.
    Red,
    /// The green wire.
    Green,
}

/// Which raw channels feed an operand.
///
/// An unset filter defaults to [`ChannelFilter::Both`]. An explicit
/// [`ChannelFilter::None`] reads nothing: every lookup resolves to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelFilter {
    /// Red channel only.
    Red,
    /// Green channel only.
    Green,
    /// Sum of both channels.
    #[default]
    Both,
    /// No channel.
    None,
}

impl ChannelFilter {
    /// Returns true if the filter reads the given channel.
    #[must_use]
    pub const fn reads(self, channel: Channel) -> bool {
        matches!(
            (self, channel),
            (Self::Both, _) | (Self::Red, Channel::Red) | (Self::Green, Channel::Green)
        )
    }
}

/// Signal counts keyed by structural signal identity.
///
/// Zero counts are never stored, so a zero entry and an absent entry are
/// indistinguishable for lookups, `len()` and equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalStore {
    counts: HashMap<SignalId, i32>,
}

impl SignalStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the count of a signal, 0 when absent.
    #[must_use]
    pub fn get(&self, id: &SignalId) -> i32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Sets the count of a signal. Setting 0 removes it.
    pub fn set(&mut self, id: SignalId, count: i32) {
        if count == 0 {
            self.counts.remove(&id);
        } else {
            self.counts.insert(id, count);
        }
    }

    /// Adds to the count of a signal, wrapping at the 32-bit boundary.
    pub fn add(&mut self, id: SignalId, delta: i32) {
        if delta == 0 {
            return;
        }
        let next = self.get(&id).wrapping_add(delta);
        self.set(id, next);
    }

    /// Returns the summed count of every quality of a signal.
    #[must_use]
    pub fn count_any_quality(&self, base: &BaseSignal) -> i32 {
        self.counts
            .iter()
            .filter(|(id, _)| id.matches_base(base))
            .fold(0i32, |acc, (_, &v)| acc.wrapping_add(v))
    }

    /// Number of non-zero signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no signal has a non-zero count.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates over the non-zero entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&SignalId, i32)> + '_ {
        self.counts.iter().map(|(id, &v)| (id, v))
    }

    /// Adds every entry of `other` into this store.
    pub fn absorb(&mut self, other: &Self) {
        for (id, v) in other.iter() {
            self.add(id.clone(), v);
        }
    }
}

impl FromIterator<(SignalId, i32)> for SignalStore {
    fn from_iter<I: IntoIterator<Item = (SignalId, i32)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (id, v) in iter {
            store.add(id, v);
        }
        store
    }
}

/// Returns a new store holding the per-signal sum of `a` and `b`.
#[must_use]
pub fn merge(a: &SignalStore, b: &SignalStore) -> SignalStore {
    let mut out = a.clone();
    out.absorb(b);
    out
}

/// Combines the raw channels according to `filter`.
///
/// `None` (unset) reads both channels; `Some(ChannelFilter::None)` reads
/// nothing.
#[must_use]
pub fn filtered(
    red: &SignalStore,
    green: &SignalStore,
    filter: Option<ChannelFilter>,
) -> SignalStore {
    match filter.unwrap_or_default() {
        ChannelFilter::Red => red.clone(),
        ChannelFilter::Green => green.clone(),
        ChannelFilter::Both => merge(red, green),
        ChannelFilter::None => SignalStore::new(),
    }
}
