//! Transitions: guarded edges between two states of the same layer.
//!
//! Eligibility depends only on `mute`, the conditions and the exit-time gate.
//! Offset and duration are consumed once a transition is selected, to build the
//! [`Crossfade`] request for the playback adapter.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::error::AnimatorError;
use crate::ids::{ConditionId, LayerId, StateId, TransitionId};
use crate::parameters::ParameterStore;
use crate::Result;

/// Blend timing and gating for a transition.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionSettings {
    /// Start time in the destination clip, in the same unit as `duration`.
    pub offset: f32,
    /// Blend duration; seconds when `has_fixed_duration`, else a fraction of the destination clip.
    pub duration: f32,
    pub has_fixed_duration: bool,
    /// Normalized source time past which the transition may fire.
    pub exit_time: f32,
    pub has_exit_time: bool,
    /// A muted transition never fires.
    pub mute: bool,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            offset: 0.0,
            duration: 0.25,
            has_fixed_duration: true,
            exit_time: 0.75,
            has_exit_time: false,
            mute: false,
        }
    }
}

impl TransitionSettings {
    pub fn validate(&self) -> Result<()> {
        check_non_negative("offset", self.offset)?;
        check_non_negative("duration", self.duration)?;
        check_non_negative("exit_time", self.exit_time)?;
        Ok(())
    }
}

fn check_non_negative(field: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AnimatorError::invalid_value(field, value))
    }
}

/// Inputs for one eligibility check.
#[derive(Clone, Copy, Debug)]
pub struct EvalContext<'a> {
    pub parameters: &'a ParameterStore,
    /// Layer doing the evaluation; `None` reads controller-wide trigger values.
    pub layer: Option<LayerId>,
    /// Playback time of the source clip, in seconds.
    pub current_time: f32,
    /// Length of the source clip, queried at evaluation time.
    pub clip_length: Option<f32>,
}

/// `current_time / clip_length`, or `None` when the clip length is missing, zero,
/// negative or not finite.
pub fn normalized_time(current_time: f32, clip_length: Option<f32>) -> Option<f32> {
    let length = clip_length.filter(|l| l.is_finite() && *l > 0.0)?;
    if !current_time.is_finite() {
        return None;
    }
    Some(current_time / length)
}

#[derive(Clone, Debug)]
pub struct Transition {
    id: TransitionId,
    source: StateId,
    destination: StateId,
    conditions: Vec<(ConditionId, Condition)>,
    next_condition: u32,
    settings: TransitionSettings,
}

impl Transition {
    /// Only the owning controller constructs transitions.
    pub(crate) fn new(
        id: TransitionId,
        source: StateId,
        destination: StateId,
        settings: TransitionSettings,
    ) -> Self {
        Self {
            id,
            source,
            destination,
            conditions: Vec::new(),
            next_condition: 0,
            settings,
        }
    }

    #[inline]
    pub fn id(&self) -> TransitionId {
        self.id
    }

    #[inline]
    pub fn source(&self) -> StateId {
        self.source
    }

    #[inline]
    pub fn destination(&self) -> StateId {
        self.destination
    }

    #[inline]
    pub fn settings(&self) -> &TransitionSettings {
        &self.settings
    }

    /// Conditions in declaration order.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter().map(|(_, c)| c)
    }

    pub fn condition_ids(&self) -> impl Iterator<Item = ConditionId> + '_ {
        self.conditions.iter().map(|(id, _)| *id)
    }

    pub fn condition(&self, id: ConditionId) -> Option<&Condition> {
        self.conditions
            .iter()
            .find_map(|(cid, c)| if *cid == id { Some(c) } else { None })
    }

    #[inline]
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    pub(crate) fn push_condition(&mut self, condition: Condition) -> ConditionId {
        let id = ConditionId::new(self.id, self.next_condition);
        self.next_condition = self.next_condition.wrapping_add(1);
        self.conditions.push((id, condition));
        id
    }

    /// Remove a condition; returns false when it is not on this transition.
    pub fn remove_condition(&mut self, id: ConditionId) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|(cid, _)| *cid != id);
        self.conditions.len() != before
    }

    pub fn offset(&self) -> f32 {
        self.settings.offset
    }

    pub fn set_offset(&mut self, offset: f32) -> Result<()> {
        check_non_negative("offset", offset)?;
        self.settings.offset = offset;
        Ok(())
    }

    pub fn duration(&self) -> f32 {
        self.settings.duration
    }

    pub fn set_duration(&mut self, duration: f32) -> Result<()> {
        check_non_negative("duration", duration)?;
        self.settings.duration = duration;
        Ok(())
    }

    pub fn has_fixed_duration(&self) -> bool {
        self.settings.has_fixed_duration
    }

    pub fn set_has_fixed_duration(&mut self, fixed: bool) {
        self.settings.has_fixed_duration = fixed;
    }

    pub fn exit_time(&self) -> f32 {
        self.settings.exit_time
    }

    pub fn set_exit_time(&mut self, exit_time: f32) -> Result<()> {
        check_non_negative("exit_time", exit_time)?;
        self.settings.exit_time = exit_time;
        Ok(())
    }

    pub fn has_exit_time(&self) -> bool {
        self.settings.has_exit_time
    }

    pub fn set_has_exit_time(&mut self, has_exit_time: bool) {
        self.settings.has_exit_time = has_exit_time;
    }

    pub fn is_mute(&self) -> bool {
        self.settings.mute
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.settings.mute = mute;
    }

    /// Decide whether this transition may fire.
    ///
    /// 1. muted -> false
    /// 2. any condition false -> false (stops at the first false one)
    /// 3. no exit time -> true
    /// 4. exit time -> `current_time / clip_length > exit_time`; a degenerate clip
    ///    length never satisfies the gate
    pub fn check_conditions(&self, ctx: &EvalContext<'_>) -> bool {
        if self.settings.mute {
            return false;
        }
        if !self
            .conditions
            .iter()
            .all(|(_, c)| c.evaluate_on(ctx.parameters, ctx.layer))
        {
            return false;
        }
        if !self.settings.has_exit_time {
            return true;
        }
        match normalized_time(ctx.current_time, ctx.clip_length) {
            Some(t) => t > self.settings.exit_time,
            None => {
                trace!(
                    "transition {:?}: exit time unsatisfied, clip length {:?} unusable",
                    self.id,
                    ctx.clip_length
                );
                false
            }
        }
    }

    /// Names of triggers read by `If`/`IfNot` conditions that currently hold for `layer`.
    pub(crate) fn consumable_triggers(
        &self,
        store: &ParameterStore,
        layer: LayerId,
    ) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (_, c) in &self.conditions {
            if c.reads_trigger(store)
                && c.evaluate_on(store, Some(layer))
                && !names.iter().any(|n| n == c.parameter())
            {
                names.push(c.parameter().to_string());
            }
        }
        names
    }

    pub(crate) fn references_parameter(&self, name: &str) -> usize {
        self.conditions().filter(|c| c.parameter() == name).count()
    }
}
