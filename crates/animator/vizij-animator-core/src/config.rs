//! Core configuration for vizij-animator-core.

use serde::{Deserialize, Serialize};

use crate::error::AnimatorError;
use crate::transition::TransitionSettings;

/// Scope in which a trigger is cleared after it contributes to a taken transition.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerConsumption {
    /// The consuming layer stops seeing the trigger. Layers that also read it keep
    /// seeing it until they consume it; the stored value drops to false once every
    /// reading layer has done so.
    #[default]
    PerLayer,
    /// The stored value drops to false for every layer as soon as one consumes it.
    Controller,
}

/// Configuration for a controller.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub trigger_consumption: TriggerConsumption,

    /// Settings copied into every transition created by `Controller::add_transition`.
    pub transition_defaults: TransitionSettings,

    /// Maximum events to retain per tick; later events are dropped.
    pub max_events_per_tick: usize,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            trigger_consumption: TriggerConsumption::default(),
            transition_defaults: TransitionSettings::default(),
            max_events_per_tick: 256,
        }
    }
}

impl AnimatorConfig {
    /// Parse a config from JSON. Missing fields fall back to defaults.
    pub fn from_json(text: &str) -> Result<Self, AnimatorError> {
        let cfg: AnimatorConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject transition defaults the property setters would refuse.
    pub fn validate(&self) -> Result<(), AnimatorError> {
        self.transition_defaults.validate()
    }
}
