//! Controller: data ownership, configuration API and the per-tick evaluation loop.
//!
//! Methods:
//! - configuration: add_parameter, add_layer, add_state, add_transition, add_condition
//! - runtime: update (every layer), evaluate_layer, play, cross_fade, reset

use std::fmt::Debug;

use hashbrown::HashMap;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::condition::{Condition, ConditionMode};
use crate::config::AnimatorConfig;
use crate::error::AnimatorError;
use crate::ids::{ConditionId, ControllerId, IdAllocator, LayerId, StateId, TransitionId};
use crate::outputs::{AnimatorEvent, Outputs};
use crate::parameters::{Parameter, ParameterKind, ParameterStore, ParameterValue};
use crate::playback::{Crossfade, PlaybackAdapter};
use crate::state::State;
use crate::transition::{EvalContext, Transition};
use crate::Result;

/// Independent slot tracking its own active state.
#[derive(Clone, Debug)]
pub struct Layer {
    id: LayerId,
    name: String,
    states: Vec<StateId>,
    default_state: Option<StateId>,
    active_state: Option<StateId>,
    /// Set once the layer is evaluated or forced; until then it follows its default.
    started: bool,
}

impl Layer {
    #[inline]
    pub fn id(&self) -> LayerId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    #[inline]
    pub fn default_state(&self) -> Option<StateId> {
        self.default_state
    }

    #[inline]
    pub fn active_state(&self) -> Option<StateId> {
        self.active_state
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub name: String,
    pub active_state: Option<String>,
    pub default_state: Option<String>,
}

/// Diagnostic view of a controller: active state per layer and parameter values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub layers: Vec<LayerSnapshot>,
    pub parameters: Vec<(String, ParameterValue)>,
}

/// Owns every parameter, layer, state, transition and condition for its lifetime.
#[derive(Debug)]
pub struct Controller {
    cfg: AnimatorConfig,
    ids: IdAllocator,
    parameters: ParameterStore,
    layers: Vec<Layer>,
    layer_index: HashMap<String, usize>,
    states: Vec<State>,
    // Removed transitions leave a hole so ids stay valid slot indices.
    transitions: Vec<Option<Transition>>,

    // Per-tick outputs
    outputs: Outputs,
}

impl Default for Controller {
    fn default() -> Self {
        Self::with_config(AnimatorConfig::default())
    }
}

impl Controller {
    /// Create an empty controller with the given config.
    ///
    /// Fails with `InvalidValue` when the transition defaults carry a negative or
    /// non-finite offset, duration or exit time.
    pub fn new(cfg: AnimatorConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self::with_config(cfg))
    }

    fn with_config(cfg: AnimatorConfig) -> Self {
        Self {
            cfg,
            ids: IdAllocator::new(ControllerId::next()),
            parameters: ParameterStore::new(),
            layers: Vec::new(),
            layer_index: HashMap::new(),
            states: Vec::new(),
            transitions: Vec::new(),
            outputs: Outputs::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> ControllerId {
        self.ids.controller()
    }

    #[inline]
    pub fn config(&self) -> &AnimatorConfig {
        &self.cfg
    }

    /// Events produced by the last `update` plus any forced switches since.
    #[inline]
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    fn owns(&self, controller: ControllerId, handle: impl Debug) -> Result<()> {
        if controller == self.id() {
            Ok(())
        } else {
            Err(AnimatorError::ForeignHandle {
                handle: format!("{handle:?}"),
            })
        }
    }

    fn layer_slot(&self, id: LayerId) -> Result<usize> {
        self.owns(id.controller(), id)?;
        if id.slot() < self.layers.len() {
            Ok(id.slot())
        } else {
            Err(AnimatorError::UnknownLayer {
                layer: format!("{id:?}"),
            })
        }
    }

    fn state_ref(&self, id: StateId) -> Result<&State> {
        self.owns(id.controller(), id)?;
        self.states
            .get(id.slot())
            .ok_or_else(|| AnimatorError::UnknownState {
                state: format!("{id:?}"),
            })
    }

    fn transition_ref(&self, id: TransitionId) -> Result<&Transition> {
        self.owns(id.controller(), id)?;
        self.transitions
            .get(id.slot())
            .and_then(Option::as_ref)
            .ok_or_else(|| AnimatorError::UnknownTransition {
                transition: format!("{id:?}"),
            })
    }

    fn transition_slot_mut(&mut self, id: TransitionId) -> Result<&mut Transition> {
        self.owns(id.controller(), id)?;
        self.transitions
            .get_mut(id.slot())
            .and_then(Option::as_mut)
            .ok_or_else(|| AnimatorError::UnknownTransition {
                transition: format!("{id:?}"),
            })
    }

    // ---- parameters ----

    #[inline]
    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        kind: ParameterKind,
        default: impl Into<ParameterValue>,
    ) -> Result<()> {
        self.parameters.add(name, kind, default)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn set_parameter(&mut self, name: &str, value: impl Into<ParameterValue>) -> Result<()> {
        self.parameters.set(name, value)
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.parameters.set_float(name, value)
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> Result<()> {
        self.parameters.set_int(name, value)
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<()> {
        self.parameters.set_bool(name, value)
    }

    pub fn set_trigger(&mut self, name: &str) -> Result<()> {
        self.parameters.set_trigger(name)
    }

    pub fn reset_trigger(&mut self, name: &str) -> Result<()> {
        self.parameters.reset_trigger(name)
    }

    /// Unregister a parameter that no condition references.
    pub fn remove_parameter(&mut self, name: &str) -> Result<Parameter> {
        let conditions: usize = self
            .transitions
            .iter()
            .flatten()
            .map(|t| t.references_parameter(name))
            .sum();
        if conditions > 0 {
            return Err(AnimatorError::ParameterInUse {
                name: name.to_string(),
                conditions,
            });
        }
        self.parameters
            .remove(name)
            .ok_or_else(|| AnimatorError::UnknownParameter {
                name: name.to_string(),
            })
    }

    // ---- layers & states ----

    pub fn add_layer(&mut self, name: impl Into<String>) -> Result<LayerId> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AnimatorError::InvalidName {
                reason: "layer name is empty".into(),
            });
        }
        if self.layer_index.contains_key(&name) {
            return Err(AnimatorError::DuplicateLayer { name });
        }
        let id = self.ids.alloc_layer();
        self.layer_index.insert(name.clone(), self.layers.len());
        self.layers.push(Layer {
            id,
            name,
            states: Vec::new(),
            default_state: None,
            active_state: None,
            started: false,
        });
        Ok(id)
    }

    pub fn layer_id(&self, name: &str) -> Option<LayerId> {
        self.layer_index.get(name).map(|&i| self.layers[i].id)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layer_slot(id).ok().map(|slot| &self.layers[slot])
    }

    /// Layers in registration order (also the evaluation order).
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Add a state to `layer`. The first state of a layer becomes its default and active state.
    pub fn add_state(&mut self, layer: LayerId, name: &str, motion: Option<&str>) -> Result<StateId> {
        let slot = self.layer_slot(layer)?;
        if name.trim().is_empty() {
            return Err(AnimatorError::InvalidName {
                reason: "state name is empty".into(),
            });
        }
        if self.layers[slot]
            .states
            .iter()
            .any(|s| self.states[s.slot()].name() == name)
        {
            return Err(AnimatorError::DuplicateState {
                layer: self.layers[slot].name.clone(),
                name: name.to_string(),
            });
        }

        let id = self.ids.alloc_state();
        self.states.push(State::new(
            id,
            layer,
            name.to_string(),
            motion.map(str::to_string),
        ));
        let l = &mut self.layers[slot];
        l.states.push(id);
        if l.default_state.is_none() {
            l.default_state = Some(id);
            l.active_state = Some(id);
        }
        Ok(id)
    }

    /// Designate the layer's initial state, also the one it returns to on `reset`.
    ///
    /// A layer that has not been evaluated or forced yet starts from it directly.
    pub fn set_default_state(&mut self, layer: LayerId, state: StateId) -> Result<()> {
        let slot = self.layer_slot(layer)?;
        if self.state_ref(state)?.layer() != layer {
            return Err(AnimatorError::UnknownState {
                state: format!("{state:?} in layer {}", self.layers[slot].name),
            });
        }
        let l = &mut self.layers[slot];
        l.default_state = Some(state);
        if !l.started {
            l.active_state = Some(state);
        }
        Ok(())
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.state_ref(id).ok()
    }

    pub fn state_mut(&mut self, id: StateId) -> Option<&mut State> {
        if id.controller() != self.id() {
            return None;
        }
        self.states.get_mut(id.slot())
    }

    pub fn find_state(&self, layer: LayerId, name: &str) -> Option<StateId> {
        let layer = self.layer(layer)?;
        layer
            .states
            .iter()
            .copied()
            .find(|s| self.states[s.slot()].name() == name)
    }

    // ---- transitions & conditions ----

    /// Create a transition appended to `from`'s outgoing list (lowest priority so far).
    ///
    /// Both states must belong to this controller and to the same layer.
    pub fn add_transition(&mut self, from: StateId, to: StateId) -> Result<TransitionId> {
        let source_layer = self.state_ref(from)?.layer();
        let destination_layer = self.state_ref(to)?.layer();
        if source_layer != destination_layer {
            return Err(AnimatorError::CrossLayerTransition {
                source_layer: self.layers[source_layer.slot()].name.clone(),
                destination_layer: self.layers[destination_layer.slot()].name.clone(),
            });
        }
        let id = self.ids.alloc_transition();
        self.transitions.push(Some(Transition::new(
            id,
            from,
            to,
            self.cfg.transition_defaults,
        )));
        self.states[from.slot()].transitions.push(id);
        Ok(id)
    }

    pub fn remove_transition(&mut self, id: TransitionId) -> Result<()> {
        let tr = self.transition_ref(id)?;
        let source = tr.source();
        let read: Vec<String> = tr.conditions().map(|c| c.parameter().to_string()).collect();
        self.transitions[id.slot()] = None;
        self.states[source.slot()].transitions.retain(|t| *t != id);
        for name in read {
            self.settle_trigger(&name);
        }
        Ok(())
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transition_ref(id).ok()
    }

    /// Mutable access for the offset/duration/exit-time/mute setters.
    pub fn transition_mut(&mut self, id: TransitionId) -> Option<&mut Transition> {
        self.transition_slot_mut(id).ok()
    }

    /// Outgoing transitions of `state` in priority order.
    pub fn transitions_from(&self, state: StateId) -> impl Iterator<Item = &Transition> + '_ {
        let ids: &[TransitionId] = self.state(state).map(State::transitions).unwrap_or(&[]);
        ids.iter()
            .filter_map(move |id| self.transitions.get(id.slot()).and_then(Option::as_ref))
    }

    /// Add a condition to a transition.
    ///
    /// Fails without touching the transition when `parameter` is not registered or
    /// `mode` does not apply to its kind.
    pub fn add_condition(
        &mut self,
        transition: TransitionId,
        mode: ConditionMode,
        threshold: f32,
        parameter: &str,
    ) -> Result<ConditionId> {
        self.transition_ref(transition)?;
        let condition = Condition::new(mode, threshold, parameter, &self.parameters)?;
        let tr = self.transition_slot_mut(transition)?;
        Ok(tr.push_condition(condition))
    }

    /// Returns false when `condition` is not on `transition`.
    pub fn remove_condition(
        &mut self,
        transition: TransitionId,
        condition: ConditionId,
    ) -> Result<bool> {
        let tr = self.transition_slot_mut(transition)?;
        if condition.transition() != transition {
            return Ok(false);
        }
        let Some(name) = tr.condition(condition).map(|c| c.parameter().to_string()) else {
            return Ok(false);
        };
        tr.remove_condition(condition);
        self.settle_trigger(&name);
        Ok(true)
    }

    // ---- runtime ----

    pub fn active_state(&self, layer: LayerId) -> Option<StateId> {
        self.layer(layer)?.active_state
    }

    pub fn active_state_name(&self, layer: LayerId) -> Option<&str> {
        let state = self.active_state(layer)?;
        Some(self.states[state.slot()].name())
    }

    /// Run one evaluation tick over every layer, in registration order.
    ///
    /// Each layer switches at most once. Never fails: unusable clip lengths only
    /// leave exit-time transitions ineligible.
    pub fn update(&mut self, playback: &mut dyn PlaybackAdapter) -> &Outputs {
        self.outputs.clear();
        for slot in 0..self.layers.len() {
            self.tick_layer(slot, playback);
        }
        &self.outputs
    }

    /// Evaluate a single layer. Events are appended to the current outputs.
    pub fn evaluate_layer(
        &mut self,
        layer: LayerId,
        playback: &mut dyn PlaybackAdapter,
    ) -> Result<Option<TransitionId>> {
        let slot = self.layer_slot(layer)?;
        Ok(self.tick_layer(slot, playback))
    }

    fn tick_layer(&mut self, slot: usize, playback: &mut dyn PlaybackAdapter) -> Option<TransitionId> {
        self.layers[slot].started = true;
        let layer = &self.layers[slot];
        let layer_id = layer.id;
        let active = layer.active_state?;
        let state = &self.states[active.slot()];
        let ctx = EvalContext {
            parameters: &self.parameters,
            layer: Some(layer_id),
            current_time: playback.current_time(&layer.name),
            clip_length: state.motion().and_then(|m| playback.clip_length(m)),
        };
        trace!(
            "layer {}: evaluating {} transition(s) from {} at t={} len={:?}",
            layer.name,
            state.transitions.len(),
            state.name(),
            ctx.current_time,
            ctx.clip_length
        );

        // First eligible transition in declaration order wins.
        let winner = state
            .transitions
            .iter()
            .filter_map(|id| self.transitions.get(id.slot()).and_then(Option::as_ref))
            .find(|t| t.check_conditions(&ctx))?;
        let winner_id = winner.id();
        let destination = winner.destination();
        let settings = *winner.settings();
        let consumed = winner.consumable_triggers(&self.parameters, layer_id);

        let request = self.crossfade_request(
            slot,
            Some(active),
            destination,
            settings.offset,
            settings.duration,
            settings.has_fixed_duration,
        );
        playback.crossfade(&request);
        self.layers[slot].active_state = Some(destination);
        debug!(
            "layer {}: {} -> {} via transition {}",
            request.layer,
            request.from_state.as_deref().unwrap_or("-"),
            request.to_state,
            winner_id.index()
        );
        self.push_event(AnimatorEvent::TransitionTaken {
            layer: request.layer.clone(),
            transition: winner_id.index(),
            from: request.from_state.clone().unwrap_or_default(),
            to: request.to_state.clone(),
        });

        for name in consumed {
            let readers = self.trigger_readers(&name);
            if self.parameters.consume_trigger(
                &name,
                layer_id,
                self.cfg.trigger_consumption,
                &readers,
            ) {
                self.push_event(AnimatorEvent::TriggerConsumed {
                    layer: request.layer.clone(),
                    parameter: name,
                });
            }
        }

        Some(winner_id)
    }

    /// Hard switch to `state` (zero-length blend).
    pub fn play(
        &mut self,
        layer: LayerId,
        state: StateId,
        playback: &mut dyn PlaybackAdapter,
    ) -> Result<()> {
        self.cross_fade(layer, state, 0.0, true, playback)
    }

    /// Switch to `state` with a scripted blend, bypassing transitions.
    pub fn cross_fade(
        &mut self,
        layer: LayerId,
        state: StateId,
        duration: f32,
        fixed_duration: bool,
        playback: &mut dyn PlaybackAdapter,
    ) -> Result<()> {
        let slot = self.layer_slot(layer)?;
        let target_layer = self.state_ref(state)?.layer();
        if target_layer != layer {
            return Err(AnimatorError::CrossLayerTransition {
                source_layer: self.layers[slot].name.clone(),
                destination_layer: self.layers[target_layer.slot()].name.clone(),
            });
        }
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(AnimatorError::invalid_value("duration", duration));
        }

        let from = self.layers[slot].active_state;
        let request = self.crossfade_request(slot, from, state, 0.0, duration, fixed_duration);
        playback.crossfade(&request);
        self.layers[slot].active_state = Some(state);
        self.layers[slot].started = true;
        debug!(
            "layer {}: forced {} -> {}",
            request.layer,
            request.from_state.as_deref().unwrap_or("-"),
            request.to_state
        );
        self.push_event(AnimatorEvent::StateForced {
            layer: request.layer,
            from: request.from_state,
            to: request.to_state,
        });
        Ok(())
    }

    /// Return every layer to its default state. Playback is left to the host.
    pub fn reset(&mut self) {
        for layer in &mut self.layers {
            layer.active_state = layer.default_state;
            layer.started = false;
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let name_of = |s: Option<StateId>| s.map(|s| self.states[s.slot()].name().to_string());
        ControllerSnapshot {
            layers: self
                .layers
                .iter()
                .map(|l| LayerSnapshot {
                    name: l.name.clone(),
                    active_state: name_of(l.active_state),
                    default_state: name_of(l.default_state),
                })
                .collect(),
            parameters: self
                .parameters
                .iter()
                .map(|p| (p.name().to_string(), p.value()))
                .collect(),
        }
    }

    fn crossfade_request(
        &self,
        slot: usize,
        from: Option<StateId>,
        to: StateId,
        offset: f32,
        duration: f32,
        fixed_duration: bool,
    ) -> Crossfade {
        let from = from.map(|s| &self.states[s.slot()]);
        let to = &self.states[to.slot()];
        Crossfade {
            layer: self.layers[slot].name.clone(),
            from_state: from.map(|s| s.name().to_string()),
            to_state: to.name().to_string(),
            from_motion: from.and_then(|s| s.motion().map(str::to_string)),
            to_motion: to.motion().map(str::to_string),
            offset,
            duration,
            fixed_duration,
            speed: to.speed(),
        }
    }

    /// Layers whose transitions reference the parameter `name`.
    fn trigger_readers(&self, name: &str) -> Vec<LayerId> {
        let mut readers: Vec<LayerId> = Vec::new();
        for tr in self.transitions.iter().flatten() {
            if tr.references_parameter(name) > 0 {
                let layer = self.states[tr.source().slot()].layer();
                if !readers.contains(&layer) {
                    readers.push(layer);
                }
            }
        }
        readers
    }

    /// A pending reader may have gone away; clear the trigger if nobody left can see it.
    fn settle_trigger(&mut self, name: &str) {
        let readers = self.trigger_readers(name);
        if self.parameters.settle_trigger(name, &readers) {
            trace!("trigger {name} cleared: every remaining reader consumed it");
        }
    }

    fn push_event(&mut self, event: AnimatorEvent) {
        if self.outputs.events.len() >= self.cfg.max_events_per_tick {
            warn!(
                "animator event cap ({}) reached; dropping {:?}",
                self.cfg.max_events_per_tick, event
            );
            return;
        }
        self.outputs.push_event(event);
    }
}
