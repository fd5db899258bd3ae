//! Identifiers and simple allocators for animator entities.
//!
//! Layer, state and transition handles carry the id of the controller that minted
//! them, so a handle passed to the wrong controller is rejected instead of aliasing
//! an unrelated slot.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_CONTROLLER: AtomicU32 = AtomicU32::new(0);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ControllerId(pub u32);

impl ControllerId {
    /// Process-unique id for a freshly constructed controller.
    pub(crate) fn next() -> Self {
        ControllerId(NEXT_CONTROLLER.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LayerId {
    controller: ControllerId,
    index: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StateId {
    controller: ControllerId,
    index: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TransitionId {
    controller: ControllerId,
    index: u32,
}

/// A condition handle is scoped to the transition that owns it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ConditionId {
    transition: TransitionId,
    index: u32,
}

macro_rules! owned_handle {
    ($ty:ident) => {
        impl $ty {
            #[inline]
            pub fn controller(&self) -> ControllerId {
                self.controller
            }

            #[inline]
            pub fn index(&self) -> u32 {
                self.index
            }

            #[inline]
            pub(crate) fn slot(&self) -> usize {
                self.index as usize
            }
        }
    };
}

owned_handle!(LayerId);
owned_handle!(StateId);
owned_handle!(TransitionId);

impl ConditionId {
    pub(crate) fn new(transition: TransitionId, index: u32) -> Self {
        Self { transition, index }
    }

    #[inline]
    pub fn transition(&self) -> TransitionId {
        self.transition
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Monotonic allocator for LayerId, StateId and TransitionId within one controller.
/// Indices double as slots into the controller's dense storage.
#[derive(Debug)]
pub struct IdAllocator {
    controller: ControllerId,
    next_layer: u32,
    next_state: u32,
    next_transition: u32,
}

impl IdAllocator {
    pub fn new(controller: ControllerId) -> Self {
        Self {
            controller,
            next_layer: 0,
            next_state: 0,
            next_transition: 0,
        }
    }

    #[inline]
    pub fn controller(&self) -> ControllerId {
        self.controller
    }

    #[inline]
    pub fn alloc_layer(&mut self) -> LayerId {
        let id = LayerId {
            controller: self.controller,
            index: self.next_layer,
        };
        self.next_layer = self.next_layer.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_state(&mut self) -> StateId {
        let id = StateId {
            controller: self.controller,
            index: self.next_state,
        };
        self.next_state = self.next_state.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_transition(&mut self) -> TransitionId {
        let id = TransitionId {
            controller: self.controller,
            index: self.next_transition,
        };
        self.next_transition = self.next_transition.wrapping_add(1);
        id
    }
}
