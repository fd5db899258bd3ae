use vizij_animator_core::{
    normalized_time, Condition, ConditionMode, Controller, EvalContext, ManualPlayback,
    ParameterKind, ParameterStore, StateId, TransitionId,
};

const TIMES: [f32; 7] = [0.0, 0.1, 0.49, 0.5, 0.51, 0.99, 3.0];
const SPEEDS: [f32; 5] = [-1.0, 0.0, 0.1, 0.2, 5.0];

/// Base layer with Idle -> Run guarded by speed > 0.1 and grounded.
fn mk_controller() -> (Controller, TransitionId, StateId, StateId) {
    let mut c = Controller::default();
    let base = c.add_layer("Base").unwrap();
    let idle = c.add_state(base, "Idle", Some("idle")).unwrap();
    let run = c.add_state(base, "Run", Some("run")).unwrap();
    c.add_parameter("speed", ParameterKind::Float, 0.0).unwrap();
    c.add_parameter("grounded", ParameterKind::Bool, true).unwrap();
    let t = c.add_transition(idle, run).unwrap();
    c.add_condition(t, ConditionMode::Greater, 0.1, "speed")
        .unwrap();
    c.add_condition(t, ConditionMode::If, 0.0, "grounded")
        .unwrap();
    (c, t, idle, run)
}

fn ctx(store: &ParameterStore, time: f32, len: Option<f32>) -> EvalContext<'_> {
    EvalContext {
        parameters: store,
        layer: None,
        current_time: time,
        clip_length: len,
    }
}

/// it should never report a muted transition eligible
#[test]
fn muted_is_never_eligible() {
    let (mut c, t, _, _) = mk_controller();
    for has_exit in [false, true] {
        let tr = c.transition_mut(t).unwrap();
        tr.set_mute(true);
        tr.set_has_exit_time(has_exit);
        for speed in SPEEDS {
            for grounded in [false, true] {
                c.set_float("speed", speed).unwrap();
                c.set_bool("grounded", grounded).unwrap();
                for time in TIMES {
                    let tr = c.transition(t).unwrap();
                    assert!(!tr.check_conditions(&ctx(c.parameters(), time, Some(1.0))));
                }
            }
        }
    }
}

/// it should equal the conjunction of conditions when exit time is off
#[test]
fn without_exit_time_result_is_condition_conjunction() {
    let (mut c, t, _, _) = mk_controller();
    for speed in SPEEDS {
        for grounded in [false, true] {
            c.set_float("speed", speed).unwrap();
            c.set_bool("grounded", grounded).unwrap();
            let expected = c
                .transition(t)
                .unwrap()
                .conditions()
                .all(|cond| cond.evaluate(c.parameters()));
            assert_eq!(expected, speed > 0.1 && grounded);
            for time in TIMES {
                for len in [Some(1.0), Some(0.0), None] {
                    let tr = c.transition(t).unwrap();
                    assert_eq!(tr.check_conditions(&ctx(c.parameters(), time, len)), expected);
                }
            }
        }
    }
}

/// it should gate on current/length > exit time when conditions hold
#[test]
fn exit_time_gate_matches_normalized_time() {
    let (mut c, t, _, _) = mk_controller();
    c.set_float("speed", 1.0).unwrap();
    {
        let tr = c.transition_mut(t).unwrap();
        tr.set_has_exit_time(true);
        tr.set_exit_time(0.5).unwrap();
    }
    for len in [0.5f32, 1.0, 2.0] {
        for time in TIMES {
            let tr = c.transition(t).unwrap();
            let expected = time / len > 0.5;
            assert_eq!(
                tr.check_conditions(&ctx(c.parameters(), time, Some(len))),
                expected,
                "time={time} len={len}"
            );
        }
    }
    // degenerate lengths never satisfy the gate
    for len in [Some(0.0), Some(-1.0), Some(f32::NAN), Some(f32::INFINITY), None] {
        let tr = c.transition(t).unwrap();
        assert!(!tr.check_conditions(&ctx(c.parameters(), 100.0, len)));
        assert!(normalized_time(100.0, len).is_none());
    }
}

/// it should treat comparisons as strict and ignore thresholds for If/IfNot
#[test]
fn comparison_modes() {
    let mut store = ParameterStore::new();
    store.add("x", ParameterKind::Float, 0.0).unwrap();
    store.add("n", ParameterKind::Int, 0).unwrap();
    store.add("b", ParameterKind::Bool, false).unwrap();

    for value in [-1.0f32, 0.0, 0.5, 1.0, 2.0] {
        store.set_float("x", value).unwrap();
        for threshold in [-1.0f32, 0.0, 1.0] {
            let eval = |mode| {
                Condition::new(mode, threshold, "x", &store)
                    .unwrap()
                    .evaluate(&store)
            };
            assert_eq!(eval(ConditionMode::Greater), value > threshold);
            assert_eq!(eval(ConditionMode::Less), value < threshold);
            assert_eq!(eval(ConditionMode::Equals), value == threshold);
            assert_eq!(eval(ConditionMode::NotEqual), value != threshold);
        }
    }

    store.set_int("n", 4).unwrap();
    let eq = Condition::new(ConditionMode::Equals, 4.0, "n", &store).unwrap();
    assert!(eq.evaluate(&store));

    for b in [false, true] {
        store.set_bool("b", b).unwrap();
        for threshold in [-100.0f32, 0.0, 1.0, f32::NAN] {
            let if_c = Condition::new(ConditionMode::If, threshold, "b", &store).unwrap();
            let if_not = Condition::new(ConditionMode::IfNot, threshold, "b", &store).unwrap();
            assert_eq!(if_c.evaluate(&store), b);
            assert_eq!(if_not.evaluate(&store), !b);
        }
    }
}

/// it should select at most one transition per layer per tick, the first eligible one
#[test]
fn at_most_one_switch_per_layer_per_tick() {
    let mut c = Controller::default();
    let base = c.add_layer("Base").unwrap();
    let a = c.add_state(base, "A", None).unwrap();
    let b = c.add_state(base, "B", None).unwrap();
    let cc = c.add_state(base, "C", None).unwrap();
    c.add_parameter("go", ParameterKind::Bool, true).unwrap();
    // A -> B -> C -> A, all permanently eligible
    for (from, to) in [(a, b), (b, cc), (cc, a)] {
        let t = c.add_transition(from, to).unwrap();
        c.add_condition(t, ConditionMode::If, 0.0, "go").unwrap();
    }
    // A lower-priority edge A -> C must never win over A -> B
    let t = c.add_transition(a, cc).unwrap();
    c.add_condition(t, ConditionMode::If, 0.0, "go").unwrap();

    let mut pb = ManualPlayback::new();
    let expected = [b, cc, a, b, cc, a];
    for want in expected {
        let out = c.update(&mut pb);
        assert_eq!(out.switches().count(), 1);
        assert_eq!(c.active_state(base), Some(want));
    }
    assert_eq!(pb.crossfades.len(), expected.len());
}

/// it should keep an unconsumed trigger set indefinitely
#[test]
fn unconsumed_trigger_stays_set() {
    let (mut c, _, _, _) = mk_controller();
    c.add_parameter("fire", ParameterKind::Trigger, false)
        .unwrap();
    c.set_trigger("fire").unwrap();
    let mut pb = ManualPlayback::new();
    for _ in 0..10 {
        c.update(&mut pb);
    }
    assert_eq!(
        c.parameters().value("fire"),
        Some(vizij_animator_core::ParameterValue::Trigger(true))
    );
}
