use vizij_counter_core::{
    AnimationState, CompletionKind, CounterConfig, CounterEvent, DigitRun, Easing, Engine,
    Inputs, TargetId, VisibilityEvent,
};

fn text_at(eng: &mut Engine, now: f64, id: TargetId) -> Option<String> {
    eng.update(now, Inputs::default())
        .changes
        .iter()
        .find(|c| c.target == id)
        .map(|c| c.text.clone())
}

#[test]
fn stat_card_linear_percent() {
    let mut eng = Engine::default();
    let id = eng
        .register_with("stat", "85%", CounterConfig::stat_card())
        .expect("registered");

    let out = eng.update(0.0, Inputs::visible(id));
    assert_eq!(out.changes[0].text, "0%");

    assert_eq!(text_at(&mut eng, 750.0, id).as_deref(), Some("42%"));
    assert_eq!(text_at(&mut eng, 1500.0, id).as_deref(), Some("85%"));
    assert_eq!(eng.state(id), Some(AnimationState::Completed));
    // Completed counters produce no further frames.
    assert_eq!(text_at(&mut eng, 3000.0, id), None);
}

#[test]
fn data_count_ease_out_quad() {
    let mut eng = Engine::default();
    let cfg = CounterConfig::data_count();
    let id = eng.register_with("count", "50", cfg).unwrap();

    eng.update(0.0, Inputs::visible(id));
    assert_eq!(text_at(&mut eng, 1000.0, id).as_deref(), Some("37"));
    assert_eq!(text_at(&mut eng, 2000.0, id).as_deref(), Some("50"));
}

#[test]
fn final_frame_is_exact_even_when_ticks_skip_past_the_end() {
    // Large target where floor(N * 0.999..) would fall short.
    let mut eng = Engine::default();
    let id = eng.register("big", "1000003+").unwrap();
    eng.update(100.0, Inputs::visible(id));
    assert_eq!(text_at(&mut eng, 1599.9, id).as_deref(), Some("999936+"));
    let out = eng.update(1733.0, Inputs::default());
    assert_eq!(out.changes[0].text, "1000003+");
    assert!(out.events.contains(&CounterEvent::Completed {
        target: id,
        value: 1_000_003
    }));
    assert!(!out.needs_frame());
    assert_eq!(
        eng.target(id).unwrap().outcome(),
        Some(CompletionKind::Finished)
    );
}

#[test]
fn end_value_is_exact_for_many_targets_and_durations() {
    for n in [0u64, 1, 7, 42, 99, 100, 12_345, 9_007_199_254_740_992] {
        for d in [1.0, 16.0, 1500.0, 2000.0] {
            for easing in [Easing::Linear, Easing::EaseOutQuad] {
                let mut eng = Engine::default();
                let cfg = CounterConfig::default()
                    .with_duration(d)
                    .with_easing(easing);
                let id = eng.register_with("n", &n.to_string(), cfg).unwrap();
                let first = eng.update(0.0, Inputs::visible(id)).changes[0].text.clone();
                assert_eq!(first, "0");
                assert_eq!(text_at(&mut eng, d, id), Some(n.to_string()));
            }
        }
    }
}

#[test]
fn double_trigger_runs_once() {
    let mut eng = Engine::default();
    let id = eng.register("a", "50+").unwrap();

    let out = eng.update(0.0, Inputs::visible(id));
    assert_eq!(out.events.len(), 1);

    // Fast scroll: leave and re-enter mid-animation.
    let inputs = Inputs {
        visibility: vec![VisibilityEvent::hidden(id), VisibilityEvent::visible(id)],
    };
    let out = eng.update(750.0, inputs);
    assert!(out.events.is_empty());
    assert_eq!(out.changes.len(), 1);
    assert_eq!(out.changes[0].text, "25+");
    assert_eq!(eng.target(id).unwrap().started_at_ms(), Some(0.0));

    assert!(!eng.trigger(id, 800.0));
    eng.update(1500.0, Inputs::default());
    assert_eq!(eng.state(id), Some(AnimationState::Completed));

    // Re-entering after completion never restarts the counter.
    let out = eng.update(5000.0, Inputs::visible(id));
    assert!(out.is_empty());
}

#[test]
fn linear_frames_are_monotonic() {
    let mut eng = Engine::default();
    let id = eng.register("m", "97%").unwrap();
    eng.update(0.0, Inputs::visible(id));
    let mut prev = 0u64;
    let mut t = 0.0;
    while t <= 1500.0 {
        if let Some(text) = text_at(&mut eng, t, id) {
            assert!(text.ends_with('%'));
            assert_eq!(text.matches('%').count(), 1);
            let v: u64 = text.trim_end_matches('%').parse().unwrap();
            assert!(v >= prev, "{v} < {prev} at {t}");
            prev = v;
        }
        t += 16.7;
    }
    assert!(prev < 97);
    assert_eq!(text_at(&mut eng, 1500.0, id).as_deref(), Some("97%"));
    assert_eq!(text_at(&mut eng, 1516.7, id), None);
}

#[test]
fn malformed_text_is_never_registered() {
    let mut eng = Engine::default();
    assert_eq!(eng.register("na", "N/A"), None);
    assert_eq!(eng.register("neg", "-40%"), None);
    assert!(eng.is_empty());
    let out = eng.update(0.0, Inputs::visible(TargetId(0)));
    assert!(out.is_empty());
}

#[test]
fn zero_target_renders_zero_on_every_frame() {
    let mut eng = Engine::default();
    let id = eng.register("z", "0%").unwrap();
    assert_eq!(eng.update(0.0, Inputs::visible(id)).changes[0].text, "0%");
    assert_eq!(text_at(&mut eng, 700.0, id).as_deref(), Some("0%"));
    assert_eq!(text_at(&mut eng, 1500.0, id).as_deref(), Some("0%"));
}

#[test]
fn last_digit_run_configuration() {
    let mut eng = Engine::default();
    let cfg = CounterConfig::default().with_digit_run(DigitRun::Last);
    let id = eng.register_with("l", "Since 2019: 340+", cfg).unwrap();
    assert_eq!(eng.target(id).unwrap().target_value, 340);
}

#[test]
fn independent_counters_interleave() {
    let mut eng = Engine::default();
    let a = eng.register("a", "100").unwrap();
    let b = eng
        .register_with("b", "100", CounterConfig::data_count())
        .unwrap();

    eng.update(0.0, Inputs::visible(a));
    let out = eng.update(500.0, Inputs::visible(b));
    assert_eq!(out.changes.len(), 2);
    assert_eq!(out.running, 2);

    let out = eng.update(1500.0, Inputs::default());
    let a_text = &out.changes.iter().find(|c| c.target == a).unwrap().text;
    let b_text = &out.changes.iter().find(|c| c.target == b).unwrap().text;
    assert_eq!(a_text, "100");
    // b: progress 0.5 under ease-out-quad
    assert_eq!(b_text, "75");
    assert_eq!(out.running, 1);
}

#[test]
fn detach_stops_frames_and_reports_once() {
    let mut eng = Engine::default();
    let id = eng.register("gone", "60").unwrap();
    eng.update(0.0, Inputs::visible(id));
    assert!(eng.detach(id));
    assert!(!eng.detach(id));

    let out = eng.update(100.0, Inputs::default());
    assert!(out.changes.is_empty());
    assert_eq!(out.events, vec![CounterEvent::Detached { target: id }]);
    assert_eq!(
        eng.target(id).unwrap().outcome(),
        Some(CompletionKind::Detached)
    );
}
