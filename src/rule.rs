//! Rules and their edge-triggered state machine.
//!
//! A rule remembers the boolean it computed last time. It fires only when
//! the new result differs, so a condition that stays true never re-fires,
//! and a signal blip that returns to the same boolean between two passes is
//! invisible.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::condition::{evaluate_all, validate_conditions, Condition};
use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::section::GroupSpec;
use crate::store::SignalStore;

/// Unique identifier for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(Uuid);

impl RuleId {
    /// Creates a new random rule ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a rule does while its conditions hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Keep the rule's section on every connected target.
    Inject,
    /// Clear every section the combinator injected.
    Remove,
}

/// Serializable description of a rule.
///
/// This is the unit a GUI produces and a save file stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Ordered conditions, folded with AND before OR.
    pub conditions: Vec<Condition>,
    /// Action taken while the conditions hold.
    pub action: RuleAction,
    /// Section injected by an `Inject` rule.
    pub section: GroupSpec,
}

impl RuleConfig {
    /// Creates a rule config.
    #[must_use]
    pub fn new(conditions: Vec<Condition>, action: RuleAction, section: GroupSpec) -> Self {
        Self {
            conditions,
            action,
            section,
        }
    }

    /// Validates conditions and section against the engine limits.
    pub fn validate(&self, config: &EngineConfig) -> Result<(), ValidationError> {
        if self.conditions.len() > config.max_conditions_per_rule {
            return Err(ValidationError::LimitExceeded {
                what: "conditions".to_string(),
                max: config.max_conditions_per_rule,
                actual: self.conditions.len(),
            });
        }
        validate_conditions(&self.conditions)?;
        self.section.validate()
    }
}

/// A state transition of a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEdge {
    /// Rule that fired.
    pub rule_id: RuleId,
    /// New result: true on a rising edge, false on a falling one.
    pub rising: bool,
    /// The rule's action.
    pub action: RuleAction,
    /// The rule's section.
    pub section: GroupSpec,
    /// Tick of the pass that fired the edge.
    pub tick: u64,
}

/// Saved form of a rule, including its remembered result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSnapshot {
    /// Rule ID.
    pub id: RuleId,
    /// Rule configuration.
    pub config: RuleConfig,
    /// Result of the last evaluation.
    #[serde(default)]
    pub previous_result: bool,
    /// Tick of the last edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fired_tick: Option<u64>,
}

/// A validated rule plus its remembered result.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    id: RuleId,
    config: RuleConfig,
    previous_result: bool,
    last_fired_tick: Option<u64>,
}

impl Rule {
    /// Validates `config` and wraps it in a fresh rule whose last result is false.
    pub fn new(config: RuleConfig, limits: &EngineConfig) -> Result<Self, ValidationError> {
        config.validate(limits)?;
        Ok(Self {
            id: RuleId::new(),
            config,
            previous_result: false,
            last_fired_tick: None,
        })
    }

    /// Rebuilds a rule from its saved form, validating the configuration again.
    pub fn restore(snapshot: RuleSnapshot, limits: &EngineConfig) -> Result<Self, ValidationError> {
        snapshot.config.validate(limits)?;
        Ok(Self {
            id: snapshot.id,
            config: snapshot.config,
            previous_result: snapshot.previous_result,
            last_fired_tick: snapshot.last_fired_tick,
        })
    }

    /// Returns the saved form of this rule.
    #[must_use]
    pub fn snapshot(&self) -> RuleSnapshot {
        RuleSnapshot {
            id: self.id,
            config: self.config.clone(),
            previous_result: self.previous_result,
            last_fired_tick: self.last_fired_tick,
        }
    }

    /// Rule ID.
    #[must_use]
    pub const fn id(&self) -> RuleId {
        self.id
    }

    /// The rule's configuration.
    #[must_use]
    pub const fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Result of the most recent evaluation.
    #[must_use]
    pub const fn previous_result(&self) -> bool {
        self.previous_result
    }

    /// Tick of the most recent edge, if any.
    #[must_use]
    pub const fn last_fired_tick(&self) -> Option<u64> {
        self.last_fired_tick
    }

    /// Returns true if this rule currently wants its section present.
    #[must_use]
    pub fn is_injecting(&self) -> bool {
        self.previous_result && self.config.action == RuleAction::Inject
    }

    /// Returns true if this rule currently demands a full cleanup.
    #[must_use]
    pub fn is_clearing(&self) -> bool {
        self.previous_result && self.config.action == RuleAction::Remove
    }

    /// Evaluates the conditions against the raw channels.
    #[must_use]
    pub fn evaluate(&self, red: &SignalStore, green: &SignalStore) -> bool {
        evaluate_all(&self.config.conditions, red, green)
    }

    /// Feeds a new result and returns the edge it caused, if any.
    pub fn observe(&mut self, current: bool, tick: u64) -> Option<RuleEdge> {
        if current == self.previous_result {
            return None;
        }
        self.previous_result = current;
        self.last_fired_tick = Some(tick);
        Some(RuleEdge {
            rule_id: self.id,
            rising: current,
            action: self.config.action,
            section: self.config.section.clone(),
            tick,
        })
    }

    /// Evaluates and observes in one step.
    pub fn step(&mut self, red: &SignalStore, green: &SignalStore, tick: u64) -> Option<RuleEdge> {
        let current = self.evaluate(red, green);
        self.observe(current, tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Comparator, SignalOperand};
    use crate::signal::SignalId;

    fn low_iron() -> RuleConfig {
        RuleConfig::new(
            vec![Condition::new(
                SignalOperand::signal(SignalId::item("iron-plate")),
                Comparator::Less,
                100,
            )],
            RuleAction::Inject,
            GroupSpec::new("low-iron", 1.0),
        )
    }

    fn rule() -> Rule {
        Rule::new(low_iron(), &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_same_result_twice_fires_once() {
        let mut r = rule();
        assert!(r.observe(true, 1).is_some());
        assert!(r.observe(true, 2).is_none());
        assert_eq!(r.last_fired_tick(), Some(1));
    }

    #[test]
    fn test_f_t_t_f_fires_two_edges_in_order() {
        let mut r = rule();
        let edges: Vec<RuleEdge> = [false, true, true, false]
            .into_iter()
            .enumerate()
            .filter_map(|(tick, v)| r.observe(v, tick as u64))
            .collect();
        assert_eq!(edges.len(), 2);
        assert!(edges[0].rising);
        assert_eq!(edges[0].tick, 1);
        assert!(!edges[1].rising);
        assert_eq!(edges[1].tick, 3);
        assert!(!r.previous_result());
    }

    #[test]
    fn test_step_evaluates_signals() {
        let mut r = rule();
        let low: SignalStore = [(SignalId::item("iron-plate"), 50)].into_iter().collect();
        let high: SignalStore = [(SignalId::item("iron-plate"), 150)].into_iter().collect();
        let empty = SignalStore::new();

        let edge = r.step(&low, &empty, 10).unwrap();
        assert!(edge.rising);
        assert_eq!(edge.section, GroupSpec::new("low-iron", 1.0));
        assert!(r.is_injecting());
        assert!(r.step(&low, &empty, 20).is_none());
        let edge = r.step(&high, &empty, 30).unwrap();
        assert!(!edge.rising);
        assert!(!r.is_injecting());
    }

    #[test]
    fn test_zero_conditions_never_fire() {
        let cfg = RuleConfig::new(Vec::new(), RuleAction::Inject, GroupSpec::new("g", 1.0));
        let mut r = Rule::new(cfg, &EngineConfig::default()).unwrap();
        assert!(r.step(&SignalStore::new(), &SignalStore::new(), 0).is_none());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut cfg = low_iron();
        cfg.section = GroupSpec::new("", 1.0);
        assert_eq!(
            Rule::new(cfg, &EngineConfig::default()),
            Err(ValidationError::EmptyGroupName)
        );

        let mut limits = EngineConfig::default();
        limits.max_conditions_per_rule = 0;
        assert!(matches!(
            Rule::new(low_iron(), &limits),
            Err(ValidationError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let cfg = low_iron();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: RuleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_snapshot_restores_state() {
        let mut r = rule();
        r.observe(true, 7);
        let json = serde_json::to_string(&r.snapshot()).unwrap();
        let snap: RuleSnapshot = serde_json::from_str(&json).unwrap();
        let restored = Rule::restore(snap, &EngineConfig::default()).unwrap();
        assert_eq!(restored, r);

        let mut bad = r.snapshot();
        bad.config.section.group_name.clear();
        assert!(Rule::restore(bad, &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_remove_rule_clears() {
        let mut cfg = low_iron();
        cfg.action = RuleAction::Remove;
        let mut r = Rule::new(cfg, &EngineConfig::default()).unwrap();
        r.observe(true, 0);
        assert!(r.is_clearing());
        assert!(!r.is_injecting());
    }
}
