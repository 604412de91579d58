//! Game settings
//!
//! UI pacing, preload behavior and the default round rules. Loaded from JSON
//! handed over by the shell; every field falls back to its default.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::GameError;
use crate::sim::RoundRules;

/// Delays used to pace the round and reveal choreography (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Panorama settle time before `nextRound` fires
    pub ui_settle_ms: f64,
    /// Overview slide-in before the reveal starts
    pub overview_delay_ms: f64,
    /// "Loading..." label hold after the overview slides away
    pub label_restore_ms: f64,
    /// Guess marker drop before the line starts moving
    pub marker_drop_ms: f64,
    /// Full reveal duration; the actual marker drops at the end
    pub line_animation_ms: f64,
    /// Line sweep frame rate
    pub frame_rate: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            ui_settle_ms: UI_SETTLE_MS,
            overview_delay_ms: OVERVIEW_DELAY_MS,
            label_restore_ms: LABEL_RESTORE_MS,
            marker_drop_ms: MARKER_DROP_MS,
            line_animation_ms: LINE_ANIMATION_MS,
            frame_rate: REVEAL_FPS,
        }
    }
}

impl Timings {
    /// Interval between two sweep frames
    ///
    /// Only meaningful for validated timings (`frame_rate > 0`).
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.frame_rate as f64
    }

    /// Number of sweep frames in one reveal (at least one)
    pub fn sweep_steps(&self) -> u32 {
        ((self.frame_rate as f64 * self.line_animation_ms / 1000.0).round() as u32).max(1)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timings: Timings,
    /// Zoom level handed to the location source
    pub preload_zoom: u8,
    /// Candidates checked per `update` while a location is pending
    pub lookup_attempts_per_update: u32,
    /// Fixed RNG seed; random when absent
    pub seed: Option<u64>,
    /// Rules used when a new game does not supply its own
    pub rules: RoundRules,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            preload_zoom: PRELOAD_ZOOM,
            lookup_attempts_per_update: LOOKUP_ATTEMPTS_PER_UPDATE,
            seed: None,
            rules: RoundRules::default(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        let t = &self.timings;
        let delays = [
            t.ui_settle_ms,
            t.overview_delay_ms,
            t.label_restore_ms,
            t.marker_drop_ms,
            t.line_animation_ms,
        ];
        if delays.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(GameError::InvalidSettings("delays must be non-negative"));
        }
        if t.frame_rate == 0 {
            return Err(GameError::InvalidSettings("frame_rate must be positive"));
        }
        if self.lookup_attempts_per_update == 0 {
            return Err(GameError::InvalidSettings(
                "lookup_attempts_per_update must be positive",
            ));
        }
        if self.rules.round_count() == 0 {
            return Err(GameError::InvalidRoundCount);
        }
        Ok(())
    }
}
