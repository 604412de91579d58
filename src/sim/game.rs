//! Round/game state machine
//!
//! Owns the single live [`GameSession`] and sequences rounds:
//! new game → preload → start round → guess → overview → next round or game
//! summary. The shell drives it with [`Game::update`] and applies the queued
//! [`ViewCommand`]s after every call.

use std::task::Poll;

use super::events::{EventBus, Subscription};
use super::location::{Destination, ImageryService, LocationSource};
use super::reveal::{Overview, SummaryKind, summarize};
use super::state::{GamePhase, GameSession, GuessResult, RoundRules};
use super::timeline::Timeline;
use crate::consts::GUESS_MAP_ZOOM;
use crate::error::GameError;
use crate::geo::{Coordinate, measure_distance};
use crate::scoring::Scenario;
use crate::settings::Settings;
use crate::view::{Button, LOADING_LABEL, ViewCommand};

/// Notifications published to subscribers (no payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEvent {
    /// A destination finished preloading
    Preload,
    /// A round started and its panorama had time to settle
    NextRound,
}

/// Deferred steps the controller subscribes for itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reaction {
    StartRound,
    /// Slide the overview away and restore the button's label later
    CloseOverview(Button),
}

enum Handler {
    Listener(Box<dyn FnMut()>),
    Reaction(Reaction),
}

/// Round pacing timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timed {
    AnnounceRound,
    RestoreLabel(Button),
}

/// The game controller
pub struct Game<S> {
    settings: Settings,
    scenario: Scenario,
    rules: RoundRules,
    session: GameSession,
    phase: GamePhase,
    locations: LocationSource<S>,
    bus: EventBus<GameEvent, Handler>,
    timeline: Timeline<Timed>,
    overview: Overview,
    commands: Vec<ViewCommand>,
    candidate: Option<Coordinate>,
    /// Round advance waiting on `Preload`
    pending_advance: Option<Subscription<GameEvent>>,
    overlay_visible: bool,
}

impl<S: ImageryService> Game<S> {
    /// Create a controller and immediately start a game with `settings.rules`
    ///
    /// Fails if `settings` do not pass [`Settings::validate`].
    pub fn new(settings: Settings, scenario: Scenario, imagery: S) -> Result<Self, GameError> {
        settings.validate()?;
        let seed = settings.seed.unwrap_or_else(rand::random);
        log::info!("Game initialized with seed: {}", seed);
        let mut game = Self {
            rules: settings.rules,
            scenario,
            session: GameSession::new(),
            phase: GamePhase::Initializing,
            locations: LocationSource::new(imagery, seed, settings.lookup_attempts_per_update),
            bus: EventBus::new(),
            timeline: Timeline::new(),
            overview: Overview::new(settings.timings),
            commands: Vec::new(),
            candidate: None,
            pending_advance: None,
            overlay_visible: true,
            settings,
        };
        game.new_game(None, None);
        Ok(game)
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn rules(&self) -> RoundRules {
        self.rules
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn overview(&self) -> &Overview {
        &self.overview
    }

    pub fn locations(&self) -> &LocationSource<S> {
        &self.locations
    }

    /// Candidate guess placed on the guess map, if any
    pub fn candidate(&self) -> Option<Coordinate> {
        self.candidate
    }

    /// Round pacing plus reveal timers still pending
    pub fn active_timers(&self) -> usize {
        self.timeline.active_count() + self.overview.active_timers()
    }

    /// Take every view command queued since the last drain
    pub fn drain_commands(&mut self) -> Vec<ViewCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Subscribe to a notification until [`off`](Self::off)
    pub fn on(&mut self, event: GameEvent, listener: impl FnMut() + 'static) -> Subscription<GameEvent> {
        self.bus.on(event, Handler::Listener(Box::new(listener)))
    }

    /// Subscribe to the next occurrence of a notification only
    ///
    /// One-shot subscriptions belong to the current game and are dropped by
    /// [`new_game`](Self::new_game).
    pub fn once(&mut self, event: GameEvent, listener: impl FnMut() + 'static) -> Subscription<GameEvent> {
        self.bus.once(event, Handler::Listener(Box::new(listener)))
    }

    pub fn off(&mut self, subscription: Subscription<GameEvent>) -> bool {
        self.bus.off(subscription)
    }

    /// Reset the session and start over, optionally on a new scenario/rules
    pub fn new_game(&mut self, scenario: Option<Scenario>, rules: Option<RoundRules>) {
        self.overview.reset(&mut self.commands);
        self.timeline.cancel_all();
        // Persistent shell listeners survive; everything tied to the old session goes
        self.bus
            .retain(|_, once, handler| !once && matches!(handler, Handler::Listener(_)));
        self.pending_advance = None;
        if self.locations.cancel().is_some() {
            log::debug!("Dropped location search from the previous game");
        }

        if let Some(rules) = rules {
            self.rules = rules;
        }
        if let Some(scenario) = scenario {
            self.scenario = scenario;
        }
        self.locations
            .set_regions(self.scenario.regions(), self.rules.distribution());
        self.commands.push(ViewCommand::SetRegions {
            regions: self.scenario.regions().to_vec(),
        });

        self.session = GameSession::new();
        self.phase = GamePhase::Initializing;
        if self.candidate.take().is_some() {
            self.commands.push(ViewCommand::ClearCandidate);
        }
        log::info!(
            "New game on {} ({} rounds)",
            self.scenario.name(),
            self.rules.round_count()
        );

        self.commands.push(ViewCommand::SetGuessEnabled { enabled: false });
        self.commands.push(ViewCommand::SetButtonLabel {
            button: Button::PlayAgain,
            label: LOADING_LABEL,
        });
        self.preload_next();
        self.start_round();
        self.bus.once(
            GameEvent::NextRound,
            Handler::Reaction(Reaction::CloseOverview(Button::PlayAgain)),
        );
    }

    /// Advance from a round overview to the next round
    ///
    /// Ignored unless the last round was resolved and more rounds remain.
    pub fn next_round(&mut self) -> bool {
        if self.phase != GamePhase::RoundResolved {
            log::debug!("next_round ignored while {:?}", self.phase);
            return false;
        }
        self.commands.push(ViewCommand::SetButtonLabel {
            button: Button::NextRound,
            label: LOADING_LABEL,
        });
        self.bus.once(
            GameEvent::NextRound,
            Handler::Reaction(Reaction::CloseOverview(Button::NextRound)),
        );
        self.start_round();
        true
    }

    /// Place or move the candidate guess
    pub fn place_guess(&mut self, at: Coordinate) -> bool {
        if self.phase != GamePhase::AwaitingGuess {
            return false;
        }
        self.candidate = Some(at);
        self.commands.push(ViewCommand::PlaceCandidate { at });
        self.commands.push(ViewCommand::SetGuessEnabled { enabled: true });
        true
    }

    /// Submit the candidate guess for the current round
    ///
    /// A no-op (returning `None`) when no candidate is placed or no round is
    /// awaiting a guess, so double clicks are harmless.
    pub fn make_guess(&mut self) -> Option<GuessResult> {
        if self.phase != GamePhase::AwaitingGuess {
            return None;
        }
        let actual = self.session.current_destination()?.coordinate;
        let guess = self.candidate.take()?;
        self.commands.push(ViewCommand::ClearCandidate);
        self.commands.push(ViewCommand::SetGuessEnabled { enabled: false });

        let distance_m = measure_distance(guess, actual);
        let result = GuessResult {
            guess,
            actual,
            distance_m,
            score: self.scenario.score(distance_m),
        };
        self.session.record(result);

        let round_count = self.rules.round_count();
        let kind = if self.session.current_round() >= round_count {
            self.phase = GamePhase::GameResolved;
            SummaryKind::Game
        } else {
            self.phase = GamePhase::RoundResolved;
            SummaryKind::Round
        };
        log::info!(
            "Round {}/{}: {:.0} m off, {} points",
            self.session.current_round(),
            round_count,
            distance_m,
            result.score
        );

        let results = self.session.previous_guesses();
        if let Some(summary) = summarize(kind, results, self.scenario.max_score(), round_count) {
            let shown = match kind {
                SummaryKind::Round => &results[results.len() - 1..],
                SummaryKind::Game => results,
            };
            self.overview.present(summary, shown, &mut self.commands);
        }
        Some(result)
    }

    /// Point the panorama back at the round's start location
    pub fn return_home(&mut self) {
        if let Some(destination) = self.session.current_destination() {
            self.commands.push(ViewCommand::ShowPanorama {
                destination: destination.clone(),
            });
        }
    }

    /// Show/hide the playable region on the guess map; returns the new state
    pub fn toggle_region_overlay(&mut self) -> bool {
        self.overlay_visible = !self.overlay_visible;
        self.commands.push(ViewCommand::SetRegionOverlay {
            visible: self.overlay_visible,
        });
        self.overlay_visible
    }

    /// Advance the controller by `dt_ms` of wall time
    pub fn update(&mut self, dt_ms: f64) {
        if let Poll::Ready(destination) = self.locations.poll() {
            self.on_destination_ready(destination);
        }

        let until = self.timeline.now_ms() + dt_ms.max(0.0);
        while let Some((_, task)) = self.timeline.pop_due(until) {
            match task {
                Timed::AnnounceRound => self.fire(GameEvent::NextRound),
                Timed::RestoreLabel(button) => self.commands.push(ViewCommand::SetButtonLabel {
                    button,
                    label: button.idle_label(),
                }),
            }
        }
        self.timeline.settle(until);

        self.overview.advance(dt_ms, &mut self.commands);
    }

    fn preload_next(&mut self) {
        log::info!("Loading new location");
        self.session.mark_preloading();
        self.locations.request(self.settings.preload_zoom);
    }

    fn on_destination_ready(&mut self, destination: Destination) {
        log::info!("New location found: {}", destination.panorama_id);
        self.session.store_preloaded(destination);
        self.fire(GameEvent::Preload);
    }

    /// Run `reaction` now if a destination is loaded, else on the next `Preload`
    fn when_preloaded(&mut self, reaction: Reaction) {
        if self.session.map_loaded() {
            self.react(reaction);
            return;
        }
        if self.pending_advance.is_some() {
            log::debug!("Round advance already waiting for a location");
            return;
        }
        log::info!("Waiting for location to load");
        self.pending_advance = Some(self.bus.once(GameEvent::Preload, Handler::Reaction(reaction)));
    }

    fn start_round(&mut self) {
        if !self.session.map_loaded() {
            self.phase = GamePhase::AwaitingDestination;
            self.when_preloaded(Reaction::StartRound);
            return;
        }

        let round_count = self.rules.round_count();
        let Some(destination) = self.session.promote_next(round_count).cloned() else {
            return;
        };
        self.commands.push(ViewCommand::SetGuessEnabled { enabled: false });
        self.commands.push(ViewCommand::ResetGuessMap {
            center: Coordinate::ORIGIN,
            zoom: GUESS_MAP_ZOOM,
        });
        if self.candidate.take().is_some() {
            self.commands.push(ViewCommand::ClearCandidate);
        }

        if self.session.current_round() < round_count {
            self.preload_next();
        }

        self.timeline
            .schedule(self.settings.timings.ui_settle_ms, Timed::AnnounceRound);
        self.commands.push(ViewCommand::ShowPanorama { destination });
        self.phase = GamePhase::AwaitingGuess;
        log::info!("Round {}/{} started", self.session.current_round(), round_count);
    }

    fn react(&mut self, reaction: Reaction) {
        match reaction {
            Reaction::StartRound => {
                self.pending_advance = None;
                self.start_round();
            }
            Reaction::CloseOverview(button) => {
                self.commands.push(ViewCommand::HideOverview);
                self.timeline.schedule(
                    self.settings.timings.label_restore_ms,
                    Timed::RestoreLabel(button),
                );
            }
        }
    }

    /// Notify every subscriber of `event`
    ///
    /// Shell listeners run inside the pass; the controller's own reactions
    /// run after it, so nothing they (un)subscribe changes the running pass.
    fn fire(&mut self, event: GameEvent) {
        let mut reactions = Vec::new();
        self.bus.fire(event, |handler| match handler {
            Handler::Listener(listener) => listener(),
            Handler::Reaction(reaction) => reactions.push(*reaction),
        });
        for reaction in reactions {
            self.react(reaction);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::scoring::{Distribution, ScoreCurve};
    use crate::sim::location::tests::{AnyImagery, NoImagery};

    const FRAME_MS: f64 = 16.0;

    fn settings(rounds: u32) -> Settings {
        Settings {
            seed: Some(42),
            rules: RoundRules::new(rounds, Distribution::Uniform).unwrap(),
            ..Settings::default()
        }
    }

    fn game(rounds: u32) -> Game<AnyImagery> {
        Game::new(settings(rounds), Scenario::world(), AnyImagery { lookups: 0 }).unwrap()
    }

    /// 1000 under 1 km, 750 under 100 km, 500 beyond
    struct Banded;

    impl ScoreCurve for Banded {
        fn score(&self, distance_m: f64) -> u32 {
            if distance_m < 1_000.0 {
                1000
            } else if distance_m < 100_000.0 {
                750
            } else {
                500
            }
        }

        fn max_score(&self) -> u32 {
            1000
        }
    }

    fn run_until(game: &mut Game<impl ImageryService>, phase: GamePhase) {
        for _ in 0..1000 {
            if game.phase() == phase {
                return;
            }
            game.update(FRAME_MS);
        }
        panic!("never reached {phase:?}, stuck in {:?}", game.phase());
    }

    fn actual(game: &Game<impl ImageryService>) -> Coordinate {
        game.session().current_destination().unwrap().coordinate
    }

    /// `actual` moved `dlat` degrees toward the equator
    fn offset(at: Coordinate, dlat: f64) -> Coordinate {
        let lat = if at.lat() > 0.0 { at.lat() - dlat } else { at.lat() + dlat };
        Coordinate::new(lat, at.lng()).unwrap()
    }

    fn guess_at(game: &mut Game<impl ImageryService>, at: Coordinate) -> GuessResult {
        run_until(game, GamePhase::AwaitingGuess);
        assert!(game.place_guess(at));
        game.make_guess().expect("guess should be accepted")
    }

    #[test]
    fn test_new_game_waits_for_destination() {
        let mut game = game(5);
        assert_eq!(game.phase(), GamePhase::AwaitingDestination);
        assert_eq!(game.session().current_round(), 0);
        assert!(game.locations().pending().is_some());
        assert_eq!(game.active_timers(), 0);

        game.update(FRAME_MS);
        assert_eq!(game.phase(), GamePhase::AwaitingGuess);
        assert_eq!(game.session().current_round(), 1);
        let commands = game.drain_commands();
        assert!(commands.contains(&ViewCommand::SetGuessEnabled { enabled: false }));
        assert!(commands.iter().any(|c| matches!(c, ViewCommand::ShowPanorama { .. })));
    }

    #[test]
    fn test_full_game_of_five_rounds() {
        let mut game = game(5);
        for round in 1..=5 {
            let target = {
                run_until(&mut game, GamePhase::AwaitingGuess);
                actual(&game)
            };
            guess_at(&mut game, offset(target, 1.0));
            assert_eq!(game.session().previous_guesses().len(), round);
            assert_eq!(game.session().current_round(), round as u32);
            if round < 5 {
                assert_eq!(game.phase(), GamePhase::RoundResolved);
                assert!(game.next_round());
            }
        }
        assert_eq!(game.phase(), GamePhase::GameResolved);
        assert_eq!(game.session().previous_guesses().len(), 5);
        // One preload per round, none issued ahead of the final round
        assert!(game.locations().pending().is_none());
        assert_eq!(game.locations().imagery().lookups, 5);
        assert!(!game.next_round());
    }

    #[test]
    fn test_running_totals() {
        let settings = settings(3);
        let scenario = Scenario::new("Bands", Vec::new(), Banded);
        let mut game = Game::new(settings, scenario, AnyImagery { lookups: 0 }).unwrap();

        run_until(&mut game, GamePhase::AwaitingGuess);
        let far = offset(actual(&game), 5.0);
        assert_eq!(guess_at(&mut game, far).score, 500);
        game.next_round();

        run_until(&mut game, GamePhase::AwaitingGuess);
        let near = offset(actual(&game), 0.05);
        assert_eq!(guess_at(&mut game, near).score, 750);
        assert_eq!(game.session().total_score(), 1250);
        let summary = game.drain_commands().into_iter().rev().find_map(|c| match c {
            ViewCommand::ShowOverview { summary } => Some(summary),
            _ => None,
        });
        let summary = summary.expect("round overview shown");
        assert_eq!(summary.kind, SummaryKind::Round);
        assert_eq!(summary.totals.total, 1250);
        assert_eq!(summary.totals.max_possible, 3000);
        game.next_round();

        run_until(&mut game, GamePhase::AwaitingGuess);
        let exact = actual(&game);
        assert_eq!(guess_at(&mut game, exact).score, 1000);
        assert_eq!(game.session().total_score(), 2250);
        assert_eq!(game.phase(), GamePhase::GameResolved);
        let summary = game.drain_commands().into_iter().rev().find_map(|c| match c {
            ViewCommand::ShowOverview { summary } => Some(summary),
            _ => None,
        });
        let summary = summary.expect("game overview shown");
        assert_eq!(summary.kind, SummaryKind::Game);
        assert_eq!(
            summary.score_line,
            "You scored 1000 points, which brings your total score to 2250 points"
        );
    }

    #[test]
    fn test_guess_without_candidate_is_noop() {
        let mut game = game(3);
        run_until(&mut game, GamePhase::AwaitingGuess);
        let round = game.session().current_round();
        assert!(game.make_guess().is_none());
        assert!(game.make_guess().is_none());
        assert_eq!(game.session().current_round(), round);
        assert!(game.session().previous_guesses().is_empty());
        assert_eq!(game.phase(), GamePhase::AwaitingGuess);
    }

    #[test]
    fn test_double_submit_counts_once() {
        let mut game = game(3);
        run_until(&mut game, GamePhase::AwaitingGuess);
        let target = actual(&game);
        game.place_guess(target);
        assert!(game.make_guess().is_some());
        assert!(game.make_guess().is_none());
        assert_eq!(game.session().previous_guesses().len(), 1);
    }

    #[test]
    fn test_once_listener_fires_once() {
        let mut game = game(3);
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        game.once(GameEvent::NextRound, move || seen.set(seen.get() + 1));

        for _ in 0..2 {
            let target = {
                run_until(&mut game, GamePhase::AwaitingGuess);
                actual(&game)
            };
            guess_at(&mut game, target);
            game.next_round();
            for _ in 0..60 {
                game.update(FRAME_MS);
            }
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_persistent_listener_survives_new_game() {
        let mut game = game(2);
        let preloads = Rc::new(Cell::new(0));
        let seen = preloads.clone();
        let subscription = game.on(GameEvent::Preload, move || seen.set(seen.get() + 1));

        run_until(&mut game, GamePhase::AwaitingGuess);
        game.new_game(None, None);
        run_until(&mut game, GamePhase::AwaitingGuess);
        assert_eq!(preloads.get(), 2);

        assert!(game.off(subscription));
        game.new_game(None, None);
        run_until(&mut game, GamePhase::AwaitingGuess);
        assert_eq!(preloads.get(), 2);
    }

    #[test]
    fn test_new_game_during_reveal_cancels_timers() {
        let mut game = game(3);
        let target = {
            run_until(&mut game, GamePhase::AwaitingGuess);
            actual(&game)
        };
        guess_at(&mut game, offset(target, 2.0));
        for _ in 0..25 {
            game.update(FRAME_MS);
        }
        assert!(game.overview().is_animating());

        game.new_game(None, None);
        assert_eq!(game.active_timers(), 0);
        assert!(game.overview().lines().is_empty());
        assert!(game.session().previous_guesses().is_empty());
        assert_eq!(game.session().current_round(), 0);

        game.drain_commands();
        for _ in 0..200 {
            game.update(FRAME_MS);
        }
        let stale = game.drain_commands().into_iter().any(|c| {
            matches!(
                c,
                ViewCommand::DrawLine { .. } | ViewCommand::SetLinePath { .. } | ViewCommand::DropMarker { .. }
            )
        });
        assert!(!stale);
        assert_eq!(game.phase(), GamePhase::AwaitingGuess);
        assert_eq!(game.session().current_round(), 1);
    }

    #[test]
    fn test_stalled_location_stays_suspended() {
        let mut game = Game::new(settings(3), Scenario::world(), NoImagery).unwrap();
        for _ in 0..500 {
            game.update(FRAME_MS);
        }
        assert_eq!(game.phase(), GamePhase::AwaitingDestination);
        assert_eq!(game.session().current_round(), 0);
        assert!(!game.place_guess(Coordinate::ORIGIN));
        assert!(game.make_guess().is_none());
        assert!(!game.next_round());
        assert!(game.locations().pending().is_some());
    }

    #[test]
    fn test_next_round_waits_for_preload() {
        let mut game = game(3);
        run_until(&mut game, GamePhase::AwaitingGuess);
        // The second destination is requested but not polled yet
        assert!(!game.session().map_loaded());
        let target = actual(&game);
        guess_at(&mut game, target);

        assert!(game.next_round());
        assert_eq!(game.phase(), GamePhase::AwaitingDestination);
        assert!(!game.next_round());
        assert_eq!(game.session().current_round(), 1);

        game.update(FRAME_MS);
        assert_eq!(game.phase(), GamePhase::AwaitingGuess);
        assert_eq!(game.session().current_round(), 2);
    }

    #[test]
    fn test_no_preload_for_final_round() {
        let mut game = game(2);
        let target = {
            run_until(&mut game, GamePhase::AwaitingGuess);
            actual(&game)
        };
        guess_at(&mut game, target);
        game.update(FRAME_MS);
        game.next_round();
        assert_eq!(game.session().current_round(), 2);
        assert!(game.locations().pending().is_none());
        assert!(!game.session().map_loaded());
    }

    #[test]
    fn test_button_label_choreography() {
        let mut game = game(3);
        let commands = game.drain_commands();
        assert!(commands.contains(&ViewCommand::SetButtonLabel {
            button: Button::PlayAgain,
            label: LOADING_LABEL,
        }));

        // Round starts on the first update, `nextRound` fires after the settle delay
        game.update(FRAME_MS);
        for _ in 0..31 {
            game.update(FRAME_MS);
        }
        let commands = game.drain_commands();
        assert!(commands.contains(&ViewCommand::HideOverview));
        assert!(!commands.iter().any(|c| matches!(c, ViewCommand::SetButtonLabel { .. })));

        for _ in 0..20 {
            game.update(FRAME_MS);
        }
        assert!(game.drain_commands().contains(&ViewCommand::SetButtonLabel {
            button: Button::PlayAgain,
            label: "Play Again",
        }));

        let target = actual(&game);
        guess_at(&mut game, target);
        game.update(FRAME_MS);
        game.next_round();
        for _ in 0..60 {
            game.update(FRAME_MS);
        }
        let commands = game.drain_commands();
        assert!(commands.contains(&ViewCommand::SetButtonLabel {
            button: Button::NextRound,
            label: LOADING_LABEL,
        }));
        assert!(commands.contains(&ViewCommand::SetButtonLabel {
            button: Button::NextRound,
            label: "Next Round",
        }));
    }

    #[test]
    fn test_new_game_replaces_rules() {
        let mut game = game(5);
        game.new_game(None, Some(RoundRules::new(1, Distribution::Weighted).unwrap()));
        let target = {
            run_until(&mut game, GamePhase::AwaitingGuess);
            actual(&game)
        };
        guess_at(&mut game, target);
        assert_eq!(game.phase(), GamePhase::GameResolved);
        assert_eq!(game.rules().round_count(), 1);
    }

    #[test]
    fn test_return_home_and_overlay() {
        let mut game = game(3);
        game.return_home();
        assert!(!game.drain_commands().iter().any(|c| matches!(c, ViewCommand::ShowPanorama { .. })));

        run_until(&mut game, GamePhase::AwaitingGuess);
        game.drain_commands();
        game.return_home();
        let destination = game.session().current_destination().cloned().unwrap();
        assert_eq!(game.drain_commands(), vec![ViewCommand::ShowPanorama { destination }]);

        assert!(!game.toggle_region_overlay());
        assert!(game.toggle_region_overlay());
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let mut zero_fps = settings(3);
        zero_fps.timings.frame_rate = 0;
        let result = Game::new(zero_fps, Scenario::world(), AnyImagery { lookups: 0 });
        assert!(matches!(result, Err(GameError::InvalidSettings(_))));

        let mut negative_delay = settings(3);
        negative_delay.timings.marker_drop_ms = -1.0;
        let result = Game::new(negative_delay, Scenario::world(), AnyImagery { lookups: 0 });
        assert!(result.is_err());
    }

    #[test]
    fn test_new_game_drops_waiting_round_advance() {
        let mut game = game(3);
        run_until(&mut game, GamePhase::AwaitingGuess);
        let target = actual(&game);
        guess_at(&mut game, target);

        // Second destination is still unresolved, so the advance waits on `Preload`
        assert!(game.next_round());
        assert_eq!(game.phase(), GamePhase::AwaitingDestination);
        let stale = game.pending_advance.expect("advance waits on preload");

        game.new_game(None, None);
        assert!(!game.bus.is_subscribed(stale));
        assert_eq!(game.bus.handler_count(GameEvent::Preload), 1);
        assert_eq!(game.active_timers(), 0);
        game.drain_commands();

        for _ in 0..120 {
            game.update(FRAME_MS);
        }
        assert_eq!(game.phase(), GamePhase::AwaitingGuess);
        assert_eq!(game.session().current_round(), 1);
        let started = game
            .drain_commands()
            .into_iter()
            .filter(|c| matches!(c, ViewCommand::ShowPanorama { .. }))
            .count();
        assert_eq!(started, 1);
    }
}
