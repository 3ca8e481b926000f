//! Per-combinator state and the evaluation pass.
//!
//! One pass reads the circuit channels, steps every rule, and reconciles the
//! connected targets when something changed: a rule fired an edge, the
//! wiring changed, or the rules were replaced.
//!
//! The desired set is the union of the sections of the `Inject` rules that
//! currently hold, unless a `Remove` rule holds, in which case it is empty.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::condition::{Operand, SignalOperand};
use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::host::{SectionHost, SignalSource, WiringSource};
use crate::reconcile::{cleanup, reconcile, ReconcileReport, SectionRegistry};
use crate::rule::{Rule, RuleConfig, RuleEdge, RuleSnapshot};
use crate::section::{CombinatorId, GroupSpec, TargetId};
use crate::store::{Channel, SignalStore};

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    /// Combinator evaluated.
    pub combinator: CombinatorId,
    /// Tick of the pass.
    pub tick: u64,
    /// Edges fired, in rule order.
    pub edges: Vec<RuleEdge>,
    /// Desired set used, when reconciliation ran.
    pub desired: Option<BTreeSet<GroupSpec>>,
    /// Reconciliation result, when it ran.
    pub reconciliation: Option<ReconcileReport>,
}

impl PassReport {
    /// Returns true if reconciliation ran during the pass.
    #[must_use]
    pub fn reconciled(&self) -> bool {
        self.reconciliation.is_some()
    }
}

/// State owned by one combinator.
#[derive(Debug, Clone)]
pub struct CombinatorState {
    id: CombinatorId,
    rules: Vec<Rule>,
    targets: Option<Vec<TargetId>>,
    reconciled_targets: BTreeSet<TargetId>,
    rules_changed: bool,
    red: SignalStore,
    green: SignalStore,
}

impl CombinatorState {
    /// Creates a combinator without rules.
    #[must_use]
    pub fn new(id: CombinatorId) -> Self {
        Self {
            id,
            rules: Vec::new(),
            targets: None,
            reconciled_targets: BTreeSet::new(),
            rules_changed: false,
            red: SignalStore::new(),
            green: SignalStore::new(),
        }
    }

    /// Creates a combinator from validated rules, e.g. after a load.
    pub fn with_rules(
        id: CombinatorId,
        rules: Vec<Rule>,
        limits: &EngineConfig,
    ) -> Result<Self, ValidationError> {
        check_rule_count(rules.len(), limits)?;
        let mut state = Self::new(id);
        state.rules = rules;
        Ok(state)
    }

    /// Combinator ID.
    #[must_use]
    pub const fn id(&self) -> CombinatorId {
        self.id
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Channels read by the most recent pass.
    #[must_use]
    pub const fn channels(&self) -> (&SignalStore, &SignalStore) {
        (&self.red, &self.green)
    }

    /// Saved form of every rule, in evaluation order.
    #[must_use]
    pub fn rule_snapshots(&self) -> Vec<RuleSnapshot> {
        self.rules.iter().map(Rule::snapshot).collect()
    }

    /// Replaces the rule list.
    ///
    /// A rule whose configuration is unchanged keeps its identity and its
    /// remembered result. The next pass reconciles even without an edge.
    pub fn set_rules(
        &mut self,
        configs: Vec<RuleConfig>,
        limits: &EngineConfig,
    ) -> Result<(), ValidationError> {
        check_rule_count(configs.len(), limits)?;
        for config in &configs {
            config.validate(limits)?;
        }

        let mut old: Vec<Option<Rule>> = self.rules.drain(..).map(Some).collect();
        let mut next = Vec::with_capacity(configs.len());
        for config in configs {
            let kept = old
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|r| *r.config() == config))
                .and_then(Option::take);
            match kept {
                Some(rule) => next.push(rule),
                None => next.push(Rule::new(config, limits)?),
            }
        }
        self.rules = next;
        self.rules_changed = true;
        Ok(())
    }

    /// Drops the cached target list; the next pass re-reads the wiring.
    pub fn invalidate_targets(&mut self) {
        self.targets = None;
    }

    /// Cached targets, refreshing from the wiring when invalidated.
    pub fn targets(&mut self, wiring: &dyn WiringSource) -> &[TargetId] {
        let id = self.id;
        self.targets
            .get_or_insert_with(|| wiring.connected_targets(id))
            .as_slice()
    }

    /// Sections this combinator wants on its targets right now.
    #[must_use]
    pub fn desired_sections(&self) -> BTreeSet<GroupSpec> {
        if self.rules.iter().any(Rule::is_clearing) {
            return BTreeSet::new();
        }
        self.rules
            .iter()
            .filter(|r| r.is_injecting())
            .map(|r| r.config().section.clone())
            .collect()
    }

    fn reads_channel(&self, channel: Channel) -> bool {
        let reads = |op: &SignalOperand| op.channels.reads(channel);
        self.rules.iter().flat_map(|r| r.config().conditions.iter()).any(|c| {
            reads(&c.left) || matches!(&c.right, Operand::Signal(op) if reads(op))
        })
    }

    fn read_channels(&mut self, signals: &dyn SignalSource) {
        self.red = if self.reads_channel(Channel::Red) {
            signals.channel_signals(self.id, Channel::Red)
        } else {
            SignalStore::new()
        };
        self.green = if self.reads_channel(Channel::Green) {
            signals.channel_signals(self.id, Channel::Green)
        } else {
            SignalStore::new()
        };
    }

    /// Runs one evaluate-and-reconcile pass.
    pub fn evaluate(
        &mut self,
        tick: u64,
        signals: &dyn SignalSource,
        wiring: &dyn WiringSource,
        host: &dyn SectionHost,
        registry: &mut SectionRegistry,
    ) -> PassReport {
        self.read_channels(signals);

        let (red, green) = (&self.red, &self.green);
        let edges: Vec<RuleEdge> = self
            .rules
            .iter_mut()
            .filter_map(|rule| rule.step(red, green, tick))
            .collect();
        for edge in &edges {
            debug!(
                combinator = %self.id,
                rule = %edge.rule_id,
                rising = edge.rising,
                section = %edge.section,
                "rule edge"
            );
        }

        let targets: Vec<TargetId> = self.targets(wiring).to_vec();
        let current: BTreeSet<TargetId> = targets.iter().copied().collect();
        let wiring_changed = current != self.reconciled_targets;

        let mut report = PassReport {
            combinator: self.id,
            tick,
            edges,
            desired: None,
            reconciliation: None,
        };
        if report.edges.is_empty() && !wiring_changed && !self.rules_changed {
            return report;
        }

        let desired = self.desired_sections();
        let mut outcome = reconcile(host, registry, self.id, &targets, &desired, tick);

        // Owned sections on targets outside the wiring are never desired,
        // including ones left behind by an earlier failed removal or a load.
        let dropped: Vec<TargetId> = registry
            .owned_targets(self.id)
            .difference(&current)
            .copied()
            .collect();
        if !dropped.is_empty() {
            debug!(combinator = %self.id, dropped = dropped.len(), "clearing unwired targets");
            outcome.extend(reconcile(host, registry, self.id, &dropped, &BTreeSet::new(), tick));
        }

        self.reconciled_targets = current;
        self.rules_changed = false;
        report.desired = Some(desired);
        report.reconciliation = Some(outcome);
        report
    }

    /// Removes every section this combinator injected.
    pub fn teardown(
        &mut self,
        host: &dyn SectionHost,
        registry: &mut SectionRegistry,
        tick: u64,
    ) -> ReconcileReport {
        let report = cleanup(host, registry, self.id, tick);
        info!(
            combinator = %self.id,
            removed = report.removed_count(),
            failed = report.failures().count(),
            "combinator torn down"
        );
        self.reconciled_targets.clear();
        report
    }
}

fn check_rule_count(count: usize, limits: &EngineConfig) -> Result<(), ValidationError> {
    if count > limits.max_rules_per_combinator {
        return Err(ValidationError::LimitExceeded {
            what: "rules".to_string(),
            max: limits.max_rules_per_combinator,
            actual: count,
        });
    }
    Ok(())
}
