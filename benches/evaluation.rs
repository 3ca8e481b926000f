use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use group_injector::condition::{evaluate_all, Comparator, Condition, SignalOperand};
use group_injector::{
    merge, Channel, CombinatorId, GroupSpec, InMemoryHost, InjectorEngine, RuleAction,
    RuleConfig, SignalId, SignalStore, TargetId,
};

fn wide_store(n: i32, offset: i32) -> SignalStore {
    (0..n)
        .map(|i| (SignalId::item(format!("item-{i}")), i + offset))
        .collect()
}

fn quantified_conditions() -> Vec<Condition> {
    vec![
        Condition::new(SignalOperand::everything(), Comparator::Greater, 0),
        Condition::new(SignalOperand::each(), Comparator::Less, SignalOperand::each()).and(),
        Condition::new(
            SignalOperand::signal(SignalId::item("item-7")).any_quality(),
            Comparator::GreaterOrEqual,
            5,
        )
        .or(),
    ]
}

fn bench_merge(c: &mut Criterion) {
    let red = wide_store(256, 1);
    let green = wide_store(256, 3);
    let mut group = c.benchmark_group("store");
    group.throughput(Throughput::Elements(512));
    group.bench_function("merge_256x256", |b| b.iter(|| merge(&red, &green)));
    group.finish();
}

fn bench_conditions(c: &mut Criterion) {
    let red = wide_store(256, 1);
    let green = wide_store(256, 3);
    let conditions = quantified_conditions();
    c.bench_function("condition/quantified_256", |b| {
        b.iter(|| evaluate_all(&conditions, &red, &green));
    });
}

fn bench_engine_pass(c: &mut Criterion) {
    c.bench_function("engine/toggle_pass_16_targets", |b| {
        b.iter_batched(
            || {
                let host = Arc::new(InMemoryHost::new());
                let comb = CombinatorId::new(1);
                for t in 0..16 {
                    host.add_target(TargetId::new(100 + t));
                    host.connect(comb, TargetId::new(100 + t));
                }
                let rules = (0..8)
                    .map(|i| {
                        RuleConfig::new(
                            vec![Condition::new(
                                SignalOperand::signal(SignalId::item("iron-plate")),
                                Comparator::Less,
                                100 * (i + 1),
                            )],
                            RuleAction::Inject,
                            GroupSpec::new(format!("tier-{i}"), 1.0),
                        )
                    })
                    .collect();
                let mut engine = InjectorEngine::from_host(host.clone());
                let _ = engine.add_combinator(comb, rules);
                (host, engine, comb)
            },
            |(host, mut engine, comb)| {
                host.set_signal(comb, Channel::Red, SignalId::item("iron-plate"), 50);
                let _ = engine.evaluate(comb, 1);
                host.set_signal(comb, Channel::Red, SignalId::item("iron-plate"), 5000);
                let _ = engine.evaluate(comb, 2);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_merge, bench_conditions, bench_engine_pass);
criterion_main!(benches);
