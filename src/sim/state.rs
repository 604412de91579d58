//! Game session state and round rules
//!
//! Everything that is reset wholesale by a new game lives in [`GameSession`].

use serde::{Deserialize, Serialize};

use super::location::Destination;
use crate::consts::DEFAULT_ROUND_COUNT;
use crate::error::GameError;
use crate::geo::Coordinate;
use crate::scoring::Distribution;

/// Current phase of the round/game state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Session reset, first destination not requested yet
    Initializing,
    /// Waiting for the location source to resolve the next destination
    AwaitingDestination,
    /// Panorama shown, waiting for the player to submit a guess
    AwaitingGuess,
    /// Round scored, overview shown, waiting for `next_round`
    RoundResolved,
    /// Final round scored; only a new game leaves this phase
    GameResolved,
}

/// Rules fixed for the duration of one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRoundRules")]
pub struct RoundRules {
    round_count: u32,
    distribution: Distribution,
}

#[derive(Deserialize)]
struct RawRoundRules {
    round_count: u32,
    #[serde(default)]
    distribution: Distribution,
}

impl TryFrom<RawRoundRules> for RoundRules {
    type Error = GameError;

    fn try_from(raw: RawRoundRules) -> Result<Self, Self::Error> {
        RoundRules::new(raw.round_count, raw.distribution)
    }
}

impl Default for RoundRules {
    fn default() -> Self {
        Self {
            round_count: DEFAULT_ROUND_COUNT,
            distribution: Distribution::Weighted,
        }
    }
}

impl RoundRules {
    pub fn new(round_count: u32, distribution: Distribution) -> Result<Self, GameError> {
        if round_count == 0 {
            return Err(GameError::InvalidRoundCount);
        }
        Ok(Self {
            round_count,
            distribution,
        })
    }

    pub fn round_count(&self) -> u32 {
        self.round_count
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }
}

/// Outcome of one round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuessResult {
    pub guess: Coordinate,
    pub actual: Coordinate,
    /// Great-circle distance between guess and actual (meters)
    pub distance_m: f64,
    pub score: u32,
}

/// The single live session of a game
#[derive(Debug, Clone, Default)]
pub struct GameSession {
    current_round: u32,
    map_loaded: bool,
    current_destination: Option<Destination>,
    next_destination: Option<Destination>,
    /// Append-only; cleared only by replacing the session
    previous_guesses: Vec<GuessResult>,
}

impl GameSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1-based index of the round in play, 0 before the first round
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Whether a preloaded destination is ready to be promoted
    pub fn map_loaded(&self) -> bool {
        self.map_loaded
    }

    pub fn current_destination(&self) -> Option<&Destination> {
        self.current_destination.as_ref()
    }

    pub fn next_destination(&self) -> Option<&Destination> {
        self.next_destination.as_ref()
    }

    pub fn previous_guesses(&self) -> &[GuessResult] {
        &self.previous_guesses
    }

    pub fn total_score(&self) -> u64 {
        self.previous_guesses.iter().map(|r| r.score as u64).sum()
    }

    pub(crate) fn mark_preloading(&mut self) {
        self.map_loaded = false;
    }

    pub(crate) fn store_preloaded(&mut self, destination: Destination) {
        self.next_destination = Some(destination);
        self.map_loaded = true;
    }

    /// Promote the preloaded destination and advance the round counter
    ///
    /// Returns the new current destination, or `None` when nothing is loaded
    /// or the counter is already at `round_count`.
    pub(crate) fn promote_next(&mut self, round_count: u32) -> Option<&Destination> {
        if !self.map_loaded || self.current_round >= round_count {
            return None;
        }
        let next = self.next_destination.take()?;
        self.map_loaded = false;
        self.current_destination = Some(next);
        self.current_round += 1;
        self.current_destination.as_ref()
    }

    pub(crate) fn record(&mut self, result: GuessResult) {
        self.previous_guesses.push(result);
    }
}
