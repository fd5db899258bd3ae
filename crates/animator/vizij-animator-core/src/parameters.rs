//! Parameter store: named, typed values that drive condition evaluation.
//!
//! Values are a tagged variant with an explicit kind. Writes are coerced to the
//! declared kind of the parameter; reads for a given layer honour trigger
//! consumption marks (see [`TriggerConsumption`]).

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::TriggerConsumption;
use crate::error::AnimatorError;
use crate::ids::LayerId;
use crate::Result;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    Float,
    Int,
    Bool,
    /// Bool-like one-shot event
    Trigger,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ParameterValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Trigger(bool),
}

impl ParameterValue {
    #[inline]
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::Float(_) => ParameterKind::Float,
            ParameterValue::Int(_) => ParameterKind::Int,
            ParameterValue::Bool(_) => ParameterKind::Bool,
            ParameterValue::Trigger(_) => ParameterKind::Trigger,
        }
    }

    /// Zero value for a kind.
    pub fn default_for(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Float => ParameterValue::Float(0.0),
            ParameterKind::Int => ParameterValue::Int(0),
            ParameterKind::Bool => ParameterValue::Bool(false),
            ParameterKind::Trigger => ParameterValue::Trigger(false),
        }
    }

    /// Numeric view used by comparison conditions. Booleans read as 1.0 / 0.0.
    #[inline]
    pub fn as_f32(&self) -> f32 {
        match *self {
            ParameterValue::Float(f) => f,
            ParameterValue::Int(i) => i as f32,
            ParameterValue::Bool(b) | ParameterValue::Trigger(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Boolean view used by `If`/`IfNot`. Numbers are true when non-zero.
    #[inline]
    pub fn as_bool(&self) -> bool {
        match *self {
            ParameterValue::Float(f) => f != 0.0,
            ParameterValue::Int(i) => i != 0,
            ParameterValue::Bool(b) | ParameterValue::Trigger(b) => b,
        }
    }

    /// Convert into `kind`.
    /// Rules:
    /// - Float <- Int/Bool: numeric view
    /// - Int <- Float: truncated toward zero, saturating (NaN becomes 0)
    /// - Bool/Trigger <- anything: boolean view
    pub fn coerce_to(self, kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Float => ParameterValue::Float(self.as_f32()),
            ParameterKind::Int => match self {
                ParameterValue::Int(i) => ParameterValue::Int(i),
                other => ParameterValue::Int(other.as_f32() as i32),
            },
            ParameterKind::Bool => ParameterValue::Bool(self.as_bool()),
            ParameterKind::Trigger => ParameterValue::Trigger(self.as_bool()),
        }
    }
}

impl From<f32> for ParameterValue {
    fn from(v: f32) -> Self {
        ParameterValue::Float(v)
    }
}

/// Narrowed to f32; lets untyped float literals and JSON numbers convert directly.
impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Float(v as f32)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        ParameterValue::Int(v)
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        ParameterValue::Bool(v)
    }
}

/// One registered parameter.
#[derive(Clone, Debug)]
pub struct Parameter {
    name: String,
    value: ParameterValue,
    /// Layers that already consumed the current trigger pulse.
    consumed_by: Vec<LayerId>,
}

impl Parameter {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> ParameterKind {
        self.value.kind()
    }

    /// Stored value, ignoring per-layer trigger consumption.
    #[inline]
    pub fn value(&self) -> ParameterValue {
        self.value
    }

    fn value_on(&self, layer: Option<LayerId>) -> ParameterValue {
        match (self.value, layer) {
            (ParameterValue::Trigger(true), Some(l)) if self.consumed_by.contains(&l) => {
                ParameterValue::Trigger(false)
            }
            (v, _) => v,
        }
    }
}

/// Named parameters, unique per controller, kept in registration order.
#[derive(Clone, Debug, Default)]
pub struct ParameterStore {
    params: Vec<Parameter>,
    index: HashMap<String, usize>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter; `default` is coerced to `kind`.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        kind: ParameterKind,
        default: impl Into<ParameterValue>,
    ) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AnimatorError::InvalidName {
                reason: "parameter name is empty".into(),
            });
        }
        if self.index.contains_key(&name) {
            return Err(AnimatorError::DuplicateParameter { name });
        }
        self.index.insert(name.clone(), self.params.len());
        self.params.push(Parameter {
            name,
            value: default.into().coerce_to(kind),
            consumed_by: Vec::new(),
        });
        Ok(())
    }

    /// Lookup by name; `None` is the not-found signal.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Parameter> {
        match self.index.get(name) {
            Some(&i) => Ok(&mut self.params[i]),
            None => Err(AnimatorError::UnknownParameter {
                name: name.to_string(),
            }),
        }
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<ParameterKind> {
        self.get(name).map(Parameter::kind)
    }

    /// Stored value (controller-wide view).
    pub fn value(&self, name: &str) -> Option<ParameterValue> {
        self.get(name).map(Parameter::value)
    }

    /// Value as seen by `layer`. A trigger the layer already consumed reads false.
    pub fn value_on(&self, name: &str, layer: Option<LayerId>) -> Option<ParameterValue> {
        self.get(name).map(|p| p.value_on(layer))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Write a value, coerced to the parameter's declared kind.
    /// Any write to a trigger starts a new pulse and clears consumption marks.
    pub fn set(&mut self, name: &str, value: impl Into<ParameterValue>) -> Result<()> {
        let param = self.get_mut(name)?;
        param.value = value.into().coerce_to(param.kind());
        param.consumed_by.clear();
        Ok(())
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.set(name, value)
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> Result<()> {
        self.set(name, value)
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<()> {
        self.set(name, value)
    }

    /// Fire a trigger. It stays set until consumed by a taken transition.
    pub fn set_trigger(&mut self, name: &str) -> Result<()> {
        self.write_trigger(name, true)
    }

    pub fn reset_trigger(&mut self, name: &str) -> Result<()> {
        self.write_trigger(name, false)
    }

    fn write_trigger(&mut self, name: &str, value: bool) -> Result<()> {
        let param = self.get_mut(name)?;
        if param.kind() != ParameterKind::Trigger {
            return Err(AnimatorError::ParameterKindMismatch {
                name: name.to_string(),
                expected: ParameterKind::Trigger,
                actual: param.kind(),
            });
        }
        param.value = ParameterValue::Trigger(value);
        param.consumed_by.clear();
        Ok(())
    }

    /// Unregister a parameter. Callers are responsible for reference checks.
    pub fn remove(&mut self, name: &str) -> Option<Parameter> {
        let idx = self.index.remove(name)?;
        let removed = self.params.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Consume a set trigger on behalf of `layer`.
    ///
    /// `readers` lists every layer whose transitions reference the trigger; under
    /// `PerLayer` the stored value clears once all of them have consumed it.
    /// Returns false when the trigger was not visible to `layer`.
    pub(crate) fn consume_trigger(
        &mut self,
        name: &str,
        layer: LayerId,
        policy: TriggerConsumption,
        readers: &[LayerId],
    ) -> bool {
        let Ok(param) = self.get_mut(name) else {
            return false;
        };
        if param.value_on(Some(layer)) != ParameterValue::Trigger(true) {
            return false;
        }
        match policy {
            TriggerConsumption::Controller => {
                param.value = ParameterValue::Trigger(false);
                param.consumed_by.clear();
            }
            TriggerConsumption::PerLayer => {
                param.consumed_by.push(layer);
                if readers.iter().all(|r| param.consumed_by.contains(r)) {
                    param.value = ParameterValue::Trigger(false);
                    param.consumed_by.clear();
                }
            }
        }
        true
    }

    /// Clear a partly consumed trigger once every remaining reader has consumed it.
    ///
    /// Called after the set of reading layers shrinks. Returns true when the stored
    /// value was cleared.
    pub(crate) fn settle_trigger(&mut self, name: &str, readers: &[LayerId]) -> bool {
        let Ok(param) = self.get_mut(name) else {
            return false;
        };
        if param.value != ParameterValue::Trigger(true) || param.consumed_by.is_empty() {
            return false;
        }
        param.consumed_by.retain(|l| readers.contains(l));
        if readers.iter().all(|r| param.consumed_by.contains(r)) {
            param.value = ParameterValue::Trigger(false);
            param.consumed_by.clear();
            return true;
        }
        false
    }
}
