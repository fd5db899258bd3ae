//! Error types for animator configuration.
//!
//! Every variant is raised at configuration time. The evaluation tick never fails.

use serde::{Deserialize, Serialize};

use crate::condition::ConditionMode;
use crate::parameters::ParameterKind;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimatorError {
    /// A parameter name is not registered on the controller
    #[error("Animator parameter not found: {name}")]
    UnknownParameter { name: String },

    #[error("Animator parameter already registered: {name}")]
    DuplicateParameter { name: String },

    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    /// Typed access did not match the declared kind
    #[error("Parameter {name} is {actual:?}, expected {expected:?}")]
    ParameterKindMismatch {
        name: String,
        expected: ParameterKind,
        actual: ParameterKind,
    },

    /// e.g. `Greater` against a Bool parameter
    #[error("Condition mode {mode:?} cannot be applied to {kind:?} parameter {name}")]
    ConditionModeMismatch {
        name: String,
        mode: ConditionMode,
        kind: ParameterKind,
    },

    #[error("Parameter {name} is still referenced by {conditions} condition(s)")]
    ParameterInUse { name: String, conditions: usize },

    #[error("Layer not found: {layer}")]
    UnknownLayer { layer: String },

    #[error("Layer already exists: {name}")]
    DuplicateLayer { name: String },

    #[error("State not found: {state}")]
    UnknownState { state: String },

    #[error("State {name} already exists in layer {layer}")]
    DuplicateState { layer: String, name: String },

    #[error("Transition not found: {transition}")]
    UnknownTransition { transition: String },

    /// Handle minted by a different controller
    #[error("Handle {handle} belongs to another controller")]
    ForeignHandle { handle: String },

    #[error("Transition crosses layers: {source_layer} -> {destination_layer}")]
    CrossLayerTransition {
        source_layer: String,
        destination_layer: String,
    },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: f32 },

    #[error("Invalid animator config: {reason}")]
    InvalidConfig { reason: String },
}

impl AnimatorError {
    pub(crate) fn invalid_value(field: &str, value: f32) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            value,
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownParameter { .. }
            | Self::DuplicateParameter { .. }
            | Self::ParameterKindMismatch { .. }
            | Self::ParameterInUse { .. } => "parameter",
            Self::ConditionModeMismatch { .. } => "condition",
            Self::UnknownLayer { .. }
            | Self::DuplicateLayer { .. }
            | Self::UnknownState { .. }
            | Self::DuplicateState { .. }
            | Self::UnknownTransition { .. }
            | Self::ForeignHandle { .. }
            | Self::CrossLayerTransition { .. } => "graph",
            Self::InvalidName { .. } | Self::InvalidValue { .. } => "validation",
            Self::InvalidConfig { .. } => "config",
        }
    }
}

impl From<serde_json::Error> for AnimatorError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig {
            reason: err.to_string(),
        }
    }
}
