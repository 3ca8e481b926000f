use std::sync::Arc;

use serde_json::json;

use group_injector::condition::SignalSelector;
use group_injector::{
    Channel, CombinatorId, EngineConfig, GroupSpec, InMemoryHost, InjectorEngine, InjectorError,
    Rule, RuleConfig, RuleSnapshot, SignalId, TargetId, TrackedSection, ValidationError,
};

fn gui_rules() -> serde_json::Value {
    json!([
        {
            "conditions": [
                {
                    "left": {"selector": {"type": "signal", "signal": {"kind": "item", "name": "iron-plate"}}},
                    "comparator": "<",
                    "right": {"type": "constant", "value": 100}
                },
                {
                    "left": {
                        "selector": {"type": "signal", "signal": {"kind": "item", "name": "iron-ore", "quality": "rare"}},
                        "channels": "green",
                        "any_quality": true
                    },
                    "comparator": ">=",
                    "right": {"type": "constant", "value": 1},
                    "combine": "and"
                }
            ],
            "action": "inject",
            "section": {"group_name": "smelting", "multiplier": 2.0}
        },
        {
            "conditions": [
                {
                    "left": {"selector": {"type": "everything"}, "channels": "red"},
                    "comparator": "=",
                    "right": {"type": "constant", "value": 0}
                }
            ],
            "action": "remove",
            "section": {"group_name": "unused", "multiplier": 1.0}
        }
    ])
}

#[test]
fn gui_document_drives_engine() {
    let rules: Vec<RuleConfig> = serde_json::from_value(gui_rules()).unwrap();
    assert_eq!(rules.len(), 2);
    assert!(rules[0].conditions[1].left.any_quality);
    assert_eq!(rules[1].conditions[0].left.selector, SignalSelector::Everything);

    // Exact round trip.
    let back: Vec<RuleConfig> =
        serde_json::from_value(serde_json::to_value(&rules).unwrap()).unwrap();
    assert_eq!(back, rules);

    let host = Arc::new(InMemoryHost::new());
    let (comb, furnace) = (CombinatorId::new(1), TargetId::new(2));
    host.add_target(furnace);
    host.connect(comb, furnace);
    let mut engine = InjectorEngine::from_host(host.clone());
    engine.add_combinator(comb, rules).unwrap();

    // Red is empty, so the cleanup rule (everything = 0) holds.
    host.set_signal(comb, Channel::Green, SignalId::item("iron-ore"), 3);
    engine.evaluate(comb, 1).unwrap();
    assert_eq!(host.section_count(furnace), 0);

    // Any red signal turns cleanup off; iron-plate is still 0 < 100.
    host.set_signal(comb, Channel::Red, SignalId::item("coal"), 10);
    engine.evaluate(comb, 2).unwrap();
    assert_eq!(host.sections(furnace), vec![GroupSpec::new("smelting", 2.0)]);
}

#[test]
fn invalid_documents_are_rejected_at_configuration() {
    let each_on_right = json!([{
        "conditions": [{
            "left": {"selector": {"type": "signal", "signal": {"kind": "item", "name": "gear"}}},
            "comparator": ">",
            "right": {"type": "signal", "value": {"selector": {"type": "each"}}}
        }],
        "action": "inject",
        "section": {"group_name": "g", "multiplier": 1.0}
    }]);
    let rules: Vec<RuleConfig> = serde_json::from_value(each_on_right).unwrap();

    let host = Arc::new(InMemoryHost::new());
    let mut engine = InjectorEngine::from_host(host);
    let err = engine.add_combinator(CombinatorId::new(1), rules).unwrap_err();
    assert!(matches!(
        err,
        InjectorError::Validation(ValidationError::EachWithoutEach { index: 0 })
    ));

    let zero_multiplier = json!({"group_name": "g", "multiplier": 0.0});
    let spec: GroupSpec = serde_json::from_value(zero_multiplier).unwrap();
    assert!(spec.validate().is_err());
}

#[test]
fn rule_and_section_state_survive_a_save() {
    let rules: Vec<RuleConfig> = serde_json::from_value(gui_rules()).unwrap();
    let limits = EngineConfig::default();
    let mut rule = Rule::new(rules[0].clone(), &limits).unwrap();
    rule.observe(true, 42);

    let saved = serde_json::to_string(&rule.snapshot()).unwrap();
    let snapshot: RuleSnapshot = serde_json::from_str(&saved).unwrap();
    let restored = Rule::restore(snapshot, &limits).unwrap();
    assert_eq!(restored.id(), rule.id());
    assert!(restored.is_injecting());
    assert_eq!(restored.last_fired_tick(), Some(42));

    let tracked = TrackedSection {
        target: TargetId::new(5),
        spec: GroupSpec::new("smelting", 2.0),
        owner: CombinatorId::new(1),
        handle: group_injector::SectionHandle::new(9),
        injected_at: 42,
    };
    let saved = serde_json::to_string(&vec![tracked.clone()]).unwrap();
    let entries: Vec<TrackedSection> = serde_json::from_str(&saved).unwrap();

    let host = Arc::new(InMemoryHost::new());
    let mut engine = InjectorEngine::from_host(host);
    engine.restore_registry(entries);
    assert_eq!(
        engine.registry().get(TargetId::new(5), &GroupSpec::new("smelting", 2.0)),
        Some(&tracked)
    );
}

#[test]
fn engine_config_from_json() {
    let cfg = EngineConfig::from_json_str(r#"{"max_rules_per_combinator": 2}"#).unwrap();
    let host = Arc::new(InMemoryHost::new());
    let mut engine =
        InjectorEngine::with_config(cfg, host.clone(), host.clone(), host).unwrap();

    let rules: Vec<RuleConfig> = serde_json::from_value(gui_rules()).unwrap();
    let mut three = rules.clone();
    three.push(rules[0].clone());
    let err = engine.add_combinator(CombinatorId::new(1), three).unwrap_err();
    assert!(matches!(
        err,
        InjectorError::Validation(ValidationError::LimitExceeded { max: 2, actual: 3, .. })
    ));
}
