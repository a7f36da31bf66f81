use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vizij_counter_core::{CounterConfig, Engine, Inputs, VisibilityEvent};

fn bench_update(c: &mut Criterion) {
    c.bench_function("update_256_running_counters", |b| {
        let mut eng = Engine::default();
        let mut events = Vec::new();
        for i in 0..256 {
            let cfg = if i % 2 == 0 {
                CounterConfig::stat_card()
            } else {
                CounterConfig::data_count()
            };
            let text = format!("{}%", i * 37);
            if let Some(id) = eng.register_with(&format!("c{i}"), &text, cfg) {
                events.push(VisibilityEvent::visible(id));
            }
        }
        eng.update(0.0, Inputs { visibility: events });

        // Stay inside the shortest duration so every counter keeps running.
        let mut now = 0.0;
        b.iter(|| {
            now = (now + 0.01) % 1400.0;
            black_box(eng.update(black_box(now), Inputs::default()).changes.len());
        });
    });
}

criterion_group!(benches, bench_update);
criterion_main!(benches);
