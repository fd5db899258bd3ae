use vizij_animator_core::{
    AnimatorConfig, AnimatorEvent, ConditionMode, Controller, LayerId, ManualPlayback,
    ParameterKind, ParameterValue, StateId, TriggerConsumption,
};

struct Rig {
    c: Controller,
    base: LayerId,
    upper: LayerId,
    base_idle: StateId,
    base_jump: StateId,
    upper_idle: StateId,
    upper_wave: StateId,
}

/// Two layers that both react to the "jump" trigger.
fn mk_rig(policy: TriggerConsumption) -> Rig {
    let cfg = AnimatorConfig {
        trigger_consumption: policy,
        ..AnimatorConfig::default()
    };
    let mut c = Controller::new(cfg).unwrap();
    c.add_parameter("jump", ParameterKind::Trigger, false)
        .unwrap();
    let base = c.add_layer("Base").unwrap();
    let upper = c.add_layer("Upper").unwrap();
    let base_idle = c.add_state(base, "Idle", Some("idle")).unwrap();
    let base_jump = c.add_state(base, "Jump", Some("jump")).unwrap();
    let upper_idle = c.add_state(upper, "Idle", Some("arms_idle")).unwrap();
    let upper_wave = c.add_state(upper, "Wave", Some("wave")).unwrap();

    let t = c.add_transition(base_idle, base_jump).unwrap();
    c.add_condition(t, ConditionMode::If, 0.0, "jump").unwrap();
    let t = c.add_transition(upper_idle, upper_wave).unwrap();
    c.add_condition(t, ConditionMode::If, 0.0, "jump").unwrap();

    Rig {
        c,
        base,
        upper,
        base_idle,
        base_jump,
        upper_idle,
        upper_wave,
    }
}

/// it should let every reading layer consume the trigger under the per-layer policy
#[test]
fn per_layer_trigger_reaches_every_layer() {
    let mut rig = mk_rig(TriggerConsumption::PerLayer);
    let mut pb = ManualPlayback::new();
    rig.c.set_trigger("jump").unwrap();

    let out = rig.c.update(&mut pb);
    let consumed: Vec<&str> = out
        .events
        .iter()
        .filter_map(|e| match e {
            AnimatorEvent::TriggerConsumed { layer, .. } => Some(layer.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(consumed, vec!["Base", "Upper"]);
    assert_eq!(rig.c.active_state(rig.base), Some(rig.base_jump));
    assert_eq!(rig.c.active_state(rig.upper), Some(rig.upper_wave));
    assert_eq!(
        rig.c.parameters().value("jump"),
        Some(ParameterValue::Trigger(false))
    );
}

/// it should hide the trigger from later layers once consumed controller-wide
#[test]
fn controller_trigger_is_consumed_by_first_layer() {
    let mut rig = mk_rig(TriggerConsumption::Controller);
    let mut pb = ManualPlayback::new();
    rig.c.set_trigger("jump").unwrap();

    rig.c.update(&mut pb);
    assert_eq!(rig.c.active_state(rig.base), Some(rig.base_jump));
    assert_eq!(rig.c.active_state(rig.upper), Some(rig.upper_idle));
    assert_eq!(
        rig.c.parameters().value("jump"),
        Some(ParameterValue::Trigger(false))
    );
}

/// it should keep the trigger pending for a layer that could not consume it yet
#[test]
fn per_layer_trigger_waits_for_blocked_layer() {
    let mut rig = mk_rig(TriggerConsumption::PerLayer);
    rig.c.add_parameter("armsFree", ParameterKind::Bool, false)
        .unwrap();
    let upper_t = rig.c.transitions_from(rig.upper_idle).next().unwrap().id();
    rig.c.add_condition(upper_t, ConditionMode::If, 0.0, "armsFree")
        .unwrap();

    let mut pb = ManualPlayback::new();
    rig.c.set_trigger("jump").unwrap();
    rig.c.update(&mut pb);
    assert_eq!(rig.c.active_state(rig.base), Some(rig.base_jump));
    assert_eq!(rig.c.active_state(rig.upper), Some(rig.upper_idle));
    // still pending for Upper, already spent for Base
    assert_eq!(
        rig.c.parameters().value_on("jump", Some(rig.upper)),
        Some(ParameterValue::Trigger(true))
    );
    assert_eq!(
        rig.c.parameters().value_on("jump", Some(rig.base)),
        Some(ParameterValue::Trigger(false))
    );

    rig.c.set_bool("armsFree", true).unwrap();
    rig.c.update(&mut pb);
    assert_eq!(rig.c.active_state(rig.upper), Some(rig.upper_wave));
    assert_eq!(
        rig.c.parameters().value("jump"),
        Some(ParameterValue::Trigger(false))
    );
}

/// it should not re-fire a consumed trigger on the following tick
#[test]
fn consumed_trigger_is_false_next_tick() {
    let mut c = Controller::default();
    c.add_parameter("attack", ParameterKind::Trigger, false)
        .unwrap();
    let base = c.add_layer("Base").unwrap();
    let idle = c.add_state(base, "Idle", None).unwrap();
    let swing = c.add_state(base, "Swing", None).unwrap();
    let t = c.add_transition(idle, swing).unwrap();
    c.add_condition(t, ConditionMode::If, 0.0, "attack").unwrap();
    // Swing returns to Idle unconditionally, so a lingering trigger would loop
    c.add_transition(swing, idle).unwrap();

    let mut pb = ManualPlayback::new();
    c.set_trigger("attack").unwrap();
    c.update(&mut pb);
    assert_eq!(c.active_state(base), Some(swing));
    c.update(&mut pb);
    assert_eq!(c.active_state(base), Some(idle));
    c.update(&mut pb);
    assert_eq!(c.active_state(base), Some(idle));
    assert_eq!(pb.crossfades.len(), 2);
}

/// it should leave a trigger alone when the winning transition does not read it
#[test]
fn trigger_not_read_by_winner_is_kept() {
    let mut rig = mk_rig(TriggerConsumption::PerLayer);
    rig.c.add_parameter("speed", ParameterKind::Float, 1.0)
        .unwrap();
    let t = rig.c.add_transition(rig.base_jump, rig.base_idle).unwrap();
    rig.c.add_condition(t, ConditionMode::Greater, 0.5, "speed")
        .unwrap();
    let upper_t = rig.c.transitions_from(rig.upper_idle).next().unwrap().id();
    rig.c.transition_mut(upper_t).unwrap().set_mute(true);

    let mut pb = ManualPlayback::new();
    rig.c.play(rig.base, rig.base_jump, &mut pb).unwrap();
    rig.c.set_trigger("jump").unwrap();

    rig.c.update(&mut pb);
    assert_eq!(rig.c.active_state(rig.base), Some(rig.base_idle));
    assert_eq!(
        rig.c.parameters().value("jump"),
        Some(ParameterValue::Trigger(true))
    );
}

/// it should re-query the clip length every tick instead of caching it
#[test]
fn exit_time_uses_current_clip_length() {
    let mut c = Controller::default();
    let base = c.add_layer("Base").unwrap();
    let stream = c.add_state(base, "Stream", Some("stream")).unwrap();
    let done = c.add_state(base, "Done", None).unwrap();
    let t = c.add_transition(stream, done).unwrap();
    c.transition_mut(t).unwrap().set_has_exit_time(true);

    let mut pb = ManualPlayback::new().with_clip("stream", 1.0);
    pb.set_time("Base", 0.6);
    c.update(&mut pb);
    assert_eq!(c.active_state(base), Some(stream));

    // clip grows while streaming; 0.6 / 4.0 is still below 0.75
    pb.set_clip_length("stream", 4.0);
    pb.set_time("Base", 0.9);
    c.update(&mut pb);
    assert_eq!(c.active_state(base), Some(stream));

    pb.set_time("Base", 3.5);
    c.update(&mut pb);
    assert_eq!(c.active_state(base), Some(done));
}

/// it should keep ticking when a state's clip is missing or has no motion
#[test]
fn degenerate_clips_never_satisfy_exit_time() {
    let mut c = Controller::default();
    let base = c.add_layer("Base").unwrap();
    let unset = c.add_state(base, "Unset", None).unwrap();
    let missing = c.add_state(base, "Missing", Some("not_loaded")).unwrap();
    let t = c.add_transition(unset, missing).unwrap();
    c.transition_mut(t).unwrap().set_has_exit_time(true);

    let mut pb = ManualPlayback::new().with_clip("zero", 0.0);
    for step in 0..20 {
        pb.set_time("Base", step as f32);
        c.update(&mut pb);
    }
    assert_eq!(c.active_state(base), Some(unset));

    c.play(base, missing, &mut pb).unwrap();
    let back = c.add_transition(missing, unset).unwrap();
    c.transition_mut(back).unwrap().set_has_exit_time(true);
    c.update(&mut pb);
    assert_eq!(c.active_state(base), Some(missing));

    c.state_mut(missing).unwrap().set_motion(Some("zero"));
    pb.set_time("Base", 5.0);
    c.update(&mut pb);
    assert_eq!(c.active_state(base), Some(missing));
}

/// it should evaluate layers independently
#[test]
fn layers_are_independent() {
    let mut c = Controller::default();
    c.add_parameter("speed", ParameterKind::Float, 0.0).unwrap();
    c.add_parameter("aim", ParameterKind::Bool, false).unwrap();
    let base = c.add_layer("Base").unwrap();
    let upper = c.add_layer("Upper").unwrap();
    let idle = c.add_state(base, "Idle", None).unwrap();
    let run = c.add_state(base, "Run", None).unwrap();
    let rest = c.add_state(upper, "Rest", None).unwrap();
    let aim = c.add_state(upper, "Aim", None).unwrap();
    let t = c.add_transition(idle, run).unwrap();
    c.add_condition(t, ConditionMode::Greater, 0.1, "speed")
        .unwrap();
    let t = c.add_transition(rest, aim).unwrap();
    c.add_condition(t, ConditionMode::If, 0.0, "aim").unwrap();

    let mut pb = ManualPlayback::new();
    c.set_bool("aim", true).unwrap();
    let out = c.update(&mut pb);
    assert_eq!(out.switches().collect::<Vec<_>>(), vec![("Upper", "Aim")]);
    assert_eq!(c.active_state(base), Some(idle));
    assert_eq!(c.active_state(upper), Some(aim));

    c.set_float("speed", 2.0).unwrap();
    c.update(&mut pb);
    assert_eq!(c.active_state(base), Some(run));
    assert_eq!(c.active_state_name(upper), Some("Aim"));
}

/// it should clear a partly consumed trigger when its last pending reader is removed
#[test]
fn removing_pending_reader_clears_trigger() {
    let mut rig = mk_rig(TriggerConsumption::PerLayer);
    rig.c.add_parameter("armsFree", ParameterKind::Bool, false)
        .unwrap();
    let upper_t = rig.c.transitions_from(rig.upper_idle).next().unwrap().id();
    rig.c.add_condition(upper_t, ConditionMode::If, 0.0, "armsFree")
        .unwrap();

    let mut pb = ManualPlayback::new();
    rig.c.set_trigger("jump").unwrap();
    rig.c.update(&mut pb);
    assert_eq!(
        rig.c.parameters().value("jump"),
        Some(ParameterValue::Trigger(true))
    );

    rig.c.remove_transition(upper_t).unwrap();
    assert_eq!(
        rig.c.parameters().value("jump"),
        Some(ParameterValue::Trigger(false))
    );
    let snap = rig.c.snapshot();
    assert!(snap
        .parameters
        .contains(&("jump".to_string(), ParameterValue::Trigger(false))));
}

/// it should clear a partly consumed trigger when the pending reader's condition is removed
#[test]
fn removing_pending_condition_clears_trigger() {
    let mut rig = mk_rig(TriggerConsumption::PerLayer);
    rig.c.add_parameter("armsFree", ParameterKind::Bool, false)
        .unwrap();
    let upper_t = rig.c.transitions_from(rig.upper_idle).next().unwrap().id();
    rig.c.add_condition(upper_t, ConditionMode::If, 0.0, "armsFree")
        .unwrap();

    let mut pb = ManualPlayback::new();
    rig.c.set_trigger("jump").unwrap();
    rig.c.update(&mut pb);

    // the first condition on the Upper edge is the one reading "jump"
    let tr = rig.c.transition(upper_t).unwrap();
    let ids: Vec<_> = tr.condition_ids().collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(tr.condition(ids[0]).unwrap().parameter(), "jump");

    assert_eq!(rig.c.remove_condition(upper_t, ids[0]), Ok(true));
    assert_eq!(
        rig.c.parameters().value("jump"),
        Some(ParameterValue::Trigger(false))
    );
    // Upper no longer reads the trigger and still waits on armsFree
    rig.c.update(&mut pb);
    assert_eq!(rig.c.active_state(rig.upper), Some(rig.upper_idle));
}

/// it should keep an unconsumed trigger set when an unrelated reader is removed
#[test]
fn removing_reader_keeps_unconsumed_trigger() {
    let mut rig = mk_rig(TriggerConsumption::PerLayer);
    rig.c.set_trigger("jump").unwrap();
    let upper_t = rig.c.transitions_from(rig.upper_idle).next().unwrap().id();
    rig.c.remove_transition(upper_t).unwrap();
    assert_eq!(
        rig.c.parameters().value("jump"),
        Some(ParameterValue::Trigger(true))
    );
    assert_eq!(rig.c.active_state(rig.base), Some(rig.base_idle));
}
