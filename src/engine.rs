//! Engine facade.
//!
//! [`InjectorEngine`] owns every combinator's state and the single
//! [`SectionRegistry`], and drives them against the host collaborators.
//! Passes run one combinator at a time.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::combinator::{CombinatorState, PassReport};
use crate::config::EngineConfig;
use crate::error::{ExecutionError, InjectorResult};
use crate::host::{SectionHost, SignalSource, WiringSource};
use crate::reconcile::{ReconcileReport, SectionRegistry, TrackedSection};
use crate::rule::{Rule, RuleConfig, RuleSnapshot};
use crate::section::{CombinatorId, TargetId};

/// Group injection engine.
pub struct InjectorEngine {
    config: EngineConfig,
    registry: SectionRegistry,
    combinators: BTreeMap<CombinatorId, CombinatorState>,
    signals: Arc<dyn SignalSource>,
    wiring: Arc<dyn WiringSource>,
    host: Arc<dyn SectionHost>,
}

impl InjectorEngine {
    /// Creates an engine with default limits.
    #[must_use]
    pub fn new(
        signals: Arc<dyn SignalSource>,
        wiring: Arc<dyn WiringSource>,
        host: Arc<dyn SectionHost>,
    ) -> Self {
        Self {
            config: EngineConfig::default(),
            registry: SectionRegistry::new(),
            combinators: BTreeMap::new(),
            signals,
            wiring,
            host,
        }
    }

    /// Creates an engine with explicit limits.
    pub fn with_config(
        config: EngineConfig,
        signals: Arc<dyn SignalSource>,
        wiring: Arc<dyn WiringSource>,
        host: Arc<dyn SectionHost>,
    ) -> InjectorResult<Self> {
        config.validate()?;
        let mut engine = Self::new(signals, wiring, host);
        engine.config = config;
        Ok(engine)
    }

    /// Convenience constructor for a host that implements every collaborator.
    #[must_use]
    pub fn from_host<H>(host: Arc<H>) -> Self
    where
        H: SignalSource + WiringSource + SectionHost + 'static,
    {
        Self::new(host.clone(), host.clone(), host)
    }

    /// Engine limits.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tracked sections across every combinator.
    #[must_use]
    pub const fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    /// Replaces the registry, e.g. with entries from a save.
    pub fn restore_registry(&mut self, entries: impl IntoIterator<Item = TrackedSection>) {
        self.registry = SectionRegistry::from_entries(entries);
    }

    /// State of one combinator.
    #[must_use]
    pub fn combinator(&self, id: CombinatorId) -> Option<&CombinatorState> {
        self.combinators.get(&id)
    }

    /// IDs of the registered combinators, ascending.
    pub fn combinator_ids(&self) -> impl Iterator<Item = CombinatorId> + '_ {
        self.combinators.keys().copied()
    }

    /// Registers a combinator with its rules.
    pub fn add_combinator(&mut self, id: CombinatorId, rules: Vec<RuleConfig>) -> InjectorResult<()> {
        if self.combinators.contains_key(&id) {
            return Err(ExecutionError::DuplicateCombinator { id }.into());
        }
        let mut state = CombinatorState::new(id);
        state.set_rules(rules, &self.config)?;
        self.combinators.insert(id, state);
        debug!(combinator = %id, "combinator added");
        Ok(())
    }

    /// Registers a combinator from saved rules, keeping their remembered results.
    ///
    /// Restore the registry alongside so the first pass finds the sections
    /// the rules already injected instead of adding them again.
    pub fn add_restored_combinator(
        &mut self,
        id: CombinatorId,
        snapshots: Vec<RuleSnapshot>,
    ) -> InjectorResult<()> {
        if self.combinators.contains_key(&id) {
            return Err(ExecutionError::DuplicateCombinator { id }.into());
        }
        let rules = snapshots
            .into_iter()
            .map(|snapshot| Rule::restore(snapshot, &self.config))
            .collect::<Result<Vec<_>, _>>()?;
        let state = CombinatorState::with_rules(id, rules, &self.config)?;
        self.combinators.insert(id, state);
        debug!(combinator = %id, "combinator restored");
        Ok(())
    }

    /// Saved form of a combinator's rules.
    pub fn rule_snapshots(&self, id: CombinatorId) -> InjectorResult<Vec<RuleSnapshot>> {
        self.combinators
            .get(&id)
            .map(CombinatorState::rule_snapshots)
            .ok_or_else(|| ExecutionError::CombinatorNotFound { id }.into())
    }

    /// Replaces the rules of a combinator.
    pub fn set_rules(&mut self, id: CombinatorId, rules: Vec<RuleConfig>) -> InjectorResult<()> {
        let config = &self.config;
        let state = self
            .combinators
            .get_mut(&id)
            .ok_or(ExecutionError::CombinatorNotFound { id })?;
        state.set_rules(rules, config)?;
        Ok(())
    }

    /// Unregisters a combinator, removing every section it injected.
    pub fn remove_combinator(&mut self, id: CombinatorId, tick: u64) -> InjectorResult<ReconcileReport> {
        let mut state = self
            .combinators
            .remove(&id)
            .ok_or(ExecutionError::CombinatorNotFound { id })?;
        Ok(state.teardown(self.host.as_ref(), &mut self.registry, tick))
    }

    /// Marks the wiring of a combinator as changed.
    pub fn notify_wiring_changed(&mut self, id: CombinatorId) -> InjectorResult<()> {
        self.combinators
            .get_mut(&id)
            .ok_or(ExecutionError::CombinatorNotFound { id })?
            .invalidate_targets();
        Ok(())
    }

    /// Drops every tracked section on a destroyed target.
    ///
    /// Wiring caches are invalidated as well so the target leaves every
    /// combinator's target list on the next pass.
    pub fn notify_target_destroyed(&mut self, target: TargetId) -> usize {
        let dropped = self.registry.forget_target(target).len();
        for state in self.combinators.values_mut() {
            state.invalidate_targets();
        }
        if dropped > 0 {
            info!(%target, dropped, "target destroyed, dropped tracking");
        }
        dropped
    }

    /// Runs one pass of one combinator.
    pub fn evaluate(&mut self, id: CombinatorId, tick: u64) -> InjectorResult<PassReport> {
        let state = self
            .combinators
            .get_mut(&id)
            .ok_or(ExecutionError::CombinatorNotFound { id })?;
        Ok(state.evaluate(
            tick,
            self.signals.as_ref(),
            self.wiring.as_ref(),
            self.host.as_ref(),
            &mut self.registry,
        ))
    }

    /// Runs one pass of every combinator, in ascending ID order.
    pub fn evaluate_all(&mut self, tick: u64) -> Vec<PassReport> {
        let mut reports = Vec::with_capacity(self.combinators.len());
        for state in self.combinators.values_mut() {
            reports.push(state.evaluate(
                tick,
                self.signals.as_ref(),
                self.wiring.as_ref(),
                self.host.as_ref(),
                &mut self.registry,
            ));
        }
        reports
    }
}

impl std::fmt::Debug for InjectorEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectorEngine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("combinators", &self.combinators.len())
            .finish_non_exhaustive()
    }
}
