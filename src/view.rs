//! Presentation commands
//!
//! The controller never touches a map or panorama widget directly. It queues
//! [`ViewCommand`]s which the shell drains after each call and applies to its
//! map/imagery widgets.

use serde::Serialize;

use crate::geo::{Bounds, Coordinate};
use crate::scoring::Region;
use crate::sim::location::Destination;
use crate::sim::reveal::OverviewSummary;

/// Buttons whose labels are driven by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    NextRound,
    PlayAgain,
}

impl Button {
    /// Label shown while the button is idle
    pub fn idle_label(&self) -> &'static str {
        match self {
            Button::NextRound => "Next Round",
            Button::PlayAgain => "Play Again",
        }
    }
}

/// Label shown while a round is loading
pub const LOADING_LABEL: &str = "Loading...";

/// Marker flavors drawn on the overview map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// "Your guess"
    Guess,
    /// "Actual location"
    Actual,
}

/// Identifies one result line (and its two markers) on the overview map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineId(pub u32);

/// Effects for the shell to apply, in order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewCommand {
    /// Enable or grey out the guess button
    SetGuessEnabled { enabled: bool },
    /// Recenter the guess map
    ResetGuessMap { center: Coordinate, zoom: u8 },
    /// Show (or move) the candidate guess marker on the guess map
    PlaceCandidate { at: Coordinate },
    ClearCandidate,
    /// Point the panorama viewer at a destination
    ShowPanorama { destination: Destination },
    /// Replace the playable region polygons drawn on the guess map
    SetRegions { regions: Vec<Region> },
    /// Show or hide the playable region polygon on the guess map
    SetRegionOverlay { visible: bool },
    SetButtonLabel { button: Button, label: &'static str },
    /// Slide the overview panel in with the given summary
    ShowOverview { summary: OverviewSummary },
    /// Slide the overview panel away
    HideOverview,
    FitOverview { bounds: Bounds },
    /// Score bar width in percent
    SetScoreProgress { percent: f64 },
    /// Create a result line, both ends at `from`
    DrawLine { line: LineId, from: Coordinate, to: Coordinate },
    /// Move a result line's end point
    SetLinePath { line: LineId, from: Coordinate, to: Coordinate },
    /// Place a marker with a drop animation
    DropMarker { line: LineId, kind: MarkerKind, at: Coordinate },
    /// Remove a line together with its markers
    RemoveLine { line: LineId },
}
