//! Output contracts from the controller.
//!
//! Each tick produces a list of semantic events describing state switches and
//! trigger consumption. Adapters transport or log them; the controller does not
//! depend on anyone reading them.

use serde::{Deserialize, Serialize};

/// Discrete signals emitted while evaluating.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimatorEvent {
    TransitionTaken {
        layer: String,
        transition: u32,
        from: String,
        to: String,
    },
    TriggerConsumed {
        layer: String,
        parameter: String,
    },
    /// Switch requested through `play`/`cross_fade` rather than a transition.
    StateForced {
        layer: String,
        from: Option<String>,
        to: String,
    },
}

/// Outputs returned by Controller::update().
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<AnimatorEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    #[inline]
    pub fn push_event(&mut self, event: AnimatorEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Transitions taken this tick as `(layer, to)` pairs.
    pub fn switches(&self) -> impl Iterator<Item = (&str, &str)> {
        self.events.iter().filter_map(|e| match e {
            AnimatorEvent::TransitionTaken { layer, to, .. } => Some((layer.as_str(), to.as_str())),
            _ => None,
        })
    }
}
