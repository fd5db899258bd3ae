//! Vizij Animator Core (engine-agnostic)
//!
//! Runtime for animation state machines. A [`Controller`] owns a parameter store
//! and one or more layers of states linked by guarded transitions. Once per
//! simulation tick, [`Controller::update`] evaluates the outgoing transitions of
//! each layer's active state and asks a [`PlaybackAdapter`] to crossfade when one
//! fires. Clip playback itself stays with the host.

pub mod condition;
pub mod config;
pub mod controller;
pub mod error;
pub mod ids;
pub mod outputs;
pub mod parameters;
pub mod playback;
pub mod state;
pub mod transition;

// Re-exports for consumers (adapters)
pub use condition::{Condition, ConditionMode};
pub use config::{AnimatorConfig, TriggerConsumption};
pub use controller::{Controller, ControllerSnapshot, Layer, LayerSnapshot};
pub use error::AnimatorError;
pub use ids::{ConditionId, ControllerId, LayerId, StateId, TransitionId};
pub use outputs::{AnimatorEvent, Outputs};
pub use parameters::{Parameter, ParameterKind, ParameterStore, ParameterValue};
pub use playback::{Crossfade, ManualPlayback, PlaybackAdapter};
pub use state::State;
pub use transition::{normalized_time, EvalContext, Transition, TransitionSettings};

/// Animator result type
pub type Result<T> = core::result::Result<T, AnimatorError>;
