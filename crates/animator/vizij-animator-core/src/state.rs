//! States: passive containers of a motion reference and ordered outgoing transitions.

use crate::error::AnimatorError;
use crate::ids::{LayerId, StateId, TransitionId};
use crate::Result;

#[derive(Clone, Debug)]
pub struct State {
    id: StateId,
    layer: LayerId,
    name: String,
    /// Clip name understood by the playback adapter; `None` when unset.
    motion: Option<String>,
    speed: f32,
    /// Priority order: the first eligible transition wins.
    pub(crate) transitions: Vec<TransitionId>,
}

impl State {
    pub(crate) fn new(id: StateId, layer: LayerId, name: String, motion: Option<String>) -> Self {
        Self {
            id,
            layer,
            name,
            motion,
            speed: 1.0,
            transitions: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> StateId {
        self.id
    }

    #[inline]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn motion(&self) -> Option<&str> {
        self.motion.as_deref()
    }

    pub fn set_motion(&mut self, motion: Option<&str>) {
        self.motion = motion.map(str::to_string);
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        if !speed.is_finite() {
            return Err(AnimatorError::invalid_value("speed", speed));
        }
        self.speed = speed;
        Ok(())
    }

    /// Outgoing transitions in priority order.
    #[inline]
    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }
}
