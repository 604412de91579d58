//! Deterministic game module
//!
//! All round sequencing lives here. This module must be pure and deterministic:
//! - Virtual clock only, advanced by the shell
//! - Seeded RNG only
//! - No widget or platform dependencies; effects leave as view commands

pub mod events;
pub mod game;
pub mod location;
pub mod reveal;
pub mod state;
pub mod timeline;

pub use events::{EventBus, Subscription};
pub use game::{Game, GameEvent};
pub use location::{Destination, ImageryService, LocationRequest, LocationSource, Panorama, search_radius_m};
pub use reveal::{Overview, OverviewSummary, RevealLine, SummaryKind, Totals, points, summarize};
pub use state::{GamePhase, GameSession, GuessResult, RoundRules};
pub use timeline::{TaskHandle, Timeline};
