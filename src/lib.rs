//! Geo Guess - round controller for a panorama location-guessing game
//!
//! Core modules:
//! - `sim`: Deterministic round/game state machine, event bus, timers, reveal pacing
//! - `geo`: Coordinates, great-circle distance, distance formatting
//! - `scoring`: Scenarios, playable regions and pluggable score curves
//! - `view`: Commands emitted for the map/panorama shell to render
//! - `settings`: Data-driven timings and default rules
//! - `web`: wasm-bindgen facade for the browser shell

pub mod error;
pub mod geo;
pub mod scoring;
pub mod settings;
pub mod sim;
pub mod view;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::GameError;
pub use geo::{Bounds, Coordinate, format_distance, measure_distance};
pub use scoring::{Curve, Distribution, Region, Scenario, ScenarioConfig, ScoreCurve};
pub use settings::{Settings, Timings};
pub use view::ViewCommand;

/// Game configuration constants
pub mod consts {
    /// Mean earth radius used for spherical distance (meters)
    pub const EARTH_RADIUS_M: f64 = 6_378_137.0;
    /// Earth circumference at the equator (meters)
    pub const EARTH_CIRCUMFERENCE_M: f64 = 2.0 * std::f64::consts::PI * EARTH_RADIUS_M;

    /// Default number of rounds per game
    pub const DEFAULT_ROUND_COUNT: u32 = 5;
    /// Zoom level handed to the location source when preloading
    pub const PRELOAD_ZOOM: u8 = 14;

    /// Guess map view restored at the start of every round
    pub const GUESS_MAP_ZOOM: u8 = 0;

    /// Delay before `nextRound` fires so the panorama can settle (ms)
    pub const UI_SETTLE_MS: f64 = 500.0;
    /// Delay between showing the overview and starting the reveal (ms)
    pub const OVERVIEW_DELAY_MS: f64 = 300.0;
    /// Delay before a "Loading..." button label is restored (ms)
    pub const LABEL_RESTORE_MS: f64 = 300.0;
    /// Guess marker drop time before the line starts sweeping (ms)
    pub const MARKER_DROP_MS: f64 = 250.0;
    /// Total reveal duration; the actual marker drops at the end (ms)
    pub const LINE_ANIMATION_MS: f64 = 600.0;
    /// Line sweep frame rate
    pub const REVEAL_FPS: u32 = 30;

    /// Candidate locations tried per `update` call
    pub const LOOKUP_ATTEMPTS_PER_UPDATE: u32 = 4;
    /// Rejection-sampling tries for a point inside a playable region
    pub const REGION_SAMPLE_TRIES: u32 = 64;
}
