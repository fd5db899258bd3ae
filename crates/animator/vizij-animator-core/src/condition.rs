//! Conditions: a single predicate over one parameter.

use serde::{Deserialize, Serialize};

use crate::error::AnimatorError;
use crate::ids::LayerId;
use crate::parameters::{ParameterKind, ParameterStore};
use crate::Result;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionMode {
    Greater,
    Less,
    Equals,
    NotEqual,
    /// Bool/Trigger is true; threshold ignored
    If,
    /// Bool/Trigger is false; threshold ignored
    IfNot,
}

impl ConditionMode {
    /// Whether this mode can read a parameter of `kind`.
    #[inline]
    pub fn accepts(self, kind: ParameterKind) -> bool {
        match self {
            ConditionMode::Greater
            | ConditionMode::Less
            | ConditionMode::Equals
            | ConditionMode::NotEqual => {
                matches!(kind, ParameterKind::Float | ParameterKind::Int)
            }
            ConditionMode::If | ConditionMode::IfNot => {
                matches!(kind, ParameterKind::Bool | ParameterKind::Trigger)
            }
        }
    }

    #[inline]
    pub fn uses_threshold(self) -> bool {
        !matches!(self, ConditionMode::If | ConditionMode::IfNot)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    mode: ConditionMode,
    threshold: f32,
    parameter: String,
}

impl Condition {
    /// Build a condition against a registered parameter.
    ///
    /// Fails when `parameter` is not in `store`, or when `mode` cannot read its kind.
    pub fn new(
        mode: ConditionMode,
        threshold: f32,
        parameter: impl Into<String>,
        store: &ParameterStore,
    ) -> Result<Self> {
        let parameter = parameter.into();
        let Some(kind) = store.kind(&parameter) else {
            return Err(AnimatorError::UnknownParameter { name: parameter });
        };
        if !mode.accepts(kind) {
            return Err(AnimatorError::ConditionModeMismatch {
                name: parameter,
                mode,
                kind,
            });
        }
        Ok(Self {
            mode,
            threshold,
            parameter,
        })
    }

    #[inline]
    pub fn mode(&self) -> ConditionMode {
        self.mode
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[inline]
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// Evaluate against the controller-wide parameter values.
    pub fn evaluate(&self, store: &ParameterStore) -> bool {
        self.evaluate_on(store, None)
    }

    /// Evaluate as seen by `layer` (consumed triggers read false).
    /// A parameter removed after construction reads as an unmet condition.
    pub fn evaluate_on(&self, store: &ParameterStore, layer: Option<LayerId>) -> bool {
        let Some(value) = store.value_on(&self.parameter, layer) else {
            return false;
        };
        match self.mode {
            ConditionMode::Greater => value.as_f32() > self.threshold,
            ConditionMode::Less => value.as_f32() < self.threshold,
            ConditionMode::Equals => value.as_f32() == self.threshold,
            ConditionMode::NotEqual => value.as_f32() != self.threshold,
            ConditionMode::If => value.as_bool(),
            ConditionMode::IfNot => !value.as_bool(),
        }
    }

    /// True when this condition reads a trigger through `If`/`IfNot`.
    pub(crate) fn reads_trigger(&self, store: &ParameterStore) -> bool {
        !self.mode.uses_threshold() && store.kind(&self.parameter) == Some(ParameterKind::Trigger)
    }
}
