//! Playback adapter contract and an in-memory implementation.
//!
//! The controller never owns clips. It asks the adapter for the active clip's time
//! and length each tick, and hands it a [`Crossfade`] once a transition is taken.
//! Hosts (Bevy/WASM) implement [`PlaybackAdapter`] over their own clip players.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Blend command issued when a layer switches state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Crossfade {
    pub layer: String,
    /// `None` when the layer had no active state yet.
    pub from_state: Option<String>,
    pub to_state: String,
    pub from_motion: Option<String>,
    pub to_motion: Option<String>,
    pub offset: f32,
    pub duration: f32,
    /// Seconds when true, otherwise fractions of the destination clip length.
    pub fixed_duration: bool,
    /// Playback speed of the destination state.
    pub speed: f32,
}

impl Crossfade {
    /// Blend length in seconds given the destination clip length.
    pub fn duration_seconds(&self, destination_length: Option<f32>) -> f32 {
        self.to_seconds(self.duration, destination_length)
    }

    /// Time in seconds at which the destination clip starts.
    pub fn start_time_seconds(&self, destination_length: Option<f32>) -> f32 {
        self.to_seconds(self.offset, destination_length)
    }

    fn to_seconds(&self, value: f32, destination_length: Option<f32>) -> f32 {
        if self.fixed_duration {
            return value;
        }
        match destination_length {
            Some(len) if len.is_finite() && len > 0.0 => value * len,
            _ => 0.0,
        }
    }
}

/// Supplies clip timing and performs blends on behalf of the controller.
pub trait PlaybackAdapter {
    /// Elapsed playback time of the active clip on `layer`, in seconds.
    fn current_time(&self, layer: &str) -> f32;

    /// Total length of a named clip; `None` when the clip is unknown or not loaded.
    fn clip_length(&self, motion: &str) -> Option<f32>;

    /// Start blending toward `request.to_state`.
    fn crossfade(&mut self, request: &Crossfade);
}

/// Per-layer clocks and a clip length table, recording every crossfade.
#[derive(Clone, Debug, Default)]
pub struct ManualPlayback {
    clips: HashMap<String, f32>,
    clocks: HashMap<String, LayerClock>,
    pub crossfades: Vec<Crossfade>,
}

#[derive(Clone, Copy, Debug)]
struct LayerClock {
    time: f32,
    speed: f32,
}

impl Default for LayerClock {
    fn default() -> Self {
        Self {
            time: 0.0,
            speed: 1.0,
        }
    }
}

impl ManualPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip(mut self, motion: &str, length: f32) -> Self {
        self.set_clip_length(motion, length);
        self
    }

    pub fn set_clip_length(&mut self, motion: &str, length: f32) {
        self.clips.insert(motion.to_string(), length);
    }

    pub fn remove_clip(&mut self, motion: &str) -> Option<f32> {
        self.clips.remove(motion)
    }

    /// Seek the clip playing on `layer`.
    pub fn set_time(&mut self, layer: &str, time: f32) {
        self.clocks.entry(layer.to_string()).or_default().time = time;
    }

    /// Advance every layer clock by `dt * speed`.
    pub fn advance(&mut self, dt: f32) {
        for clock in self.clocks.values_mut() {
            clock.time += dt * clock.speed;
        }
    }

    pub fn last_crossfade(&self) -> Option<&Crossfade> {
        self.crossfades.last()
    }
}

impl PlaybackAdapter for ManualPlayback {
    fn current_time(&self, layer: &str) -> f32 {
        self.clocks.get(layer).map(|c| c.time).unwrap_or(0.0)
    }

    fn clip_length(&self, motion: &str) -> Option<f32> {
        self.clips.get(motion).copied()
    }

    fn crossfade(&mut self, request: &Crossfade) {
        let length = request
            .to_motion
            .as_deref()
            .and_then(|m| self.clips.get(m).copied());
        let clock = self.clocks.entry(request.layer.clone()).or_default();
        clock.time = request.start_time_seconds(length);
        clock.speed = request.speed;
        self.crossfades.push(request.clone());
    }
}
