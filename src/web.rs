//! Browser facade
//!
//! Exposes the controller to the page script. The page owns the map and
//! panorama widgets: it calls `update` from `requestAnimationFrame`, drains the
//! queued view commands as JSON and applies them.

use js_sys::Function;
use wasm_bindgen::prelude::*;

use crate::error::GameError;
use crate::geo::Coordinate;
use crate::scoring::{Scenario, ScenarioConfig};
use crate::settings::Settings;
use crate::sim::{Game, GameEvent, ImageryService, Panorama, RoundRules, Subscription};

/// Imagery lookups answered by a page callback
///
/// The callback is `(lat, lng, radiusMeters) => ({ id, position: { lat, lng } } | null)`
/// and must answer synchronously, e.g. from a coverage index.
struct JsImagery {
    lookup: Function,
}

impl ImageryService for JsImagery {
    fn find_panorama(&mut self, near: Coordinate, radius_m: f64) -> Option<Panorama> {
        let found = match self.lookup.call3(
            &JsValue::NULL,
            &near.lat().into(),
            &near.lng().into(),
            &radius_m.into(),
        ) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("Imagery lookup threw: {:?}", e);
                return None;
            }
        };
        if found.is_null() || found.is_undefined() {
            return None;
        }
        let json: String = js_sys::JSON::stringify(&found).ok()?.into();
        match serde_json::from_str(&json) {
            Ok(panorama) => Some(panorama),
            Err(e) => {
                log::warn!("Ignoring malformed panorama {}: {}", json, e);
                None
            }
        }
    }
}

fn parse_event(name: &str) -> Result<GameEvent, JsError> {
    match name {
        "preload" => Ok(GameEvent::Preload),
        "nextRound" => Ok(GameEvent::NextRound),
        _ => Err(JsError::new(&format!("unknown event: {name}"))),
    }
}

fn parse_scenario(json: Option<String>) -> Result<Option<Scenario>, GameError> {
    json.map(|json| ScenarioConfig::from_json(&json)?.into_scenario())
        .transpose()
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game<JsImagery>,
    /// Page subscriptions by the id handed out from `on`
    subscriptions: Vec<Option<Subscription<GameEvent>>>,
}

#[wasm_bindgen]
impl WebGame {
    /// `settings` and `scenario` are optional JSON documents
    #[wasm_bindgen(constructor)]
    pub fn new(
        settings: Option<String>,
        scenario: Option<String>,
        lookup: Function,
    ) -> Result<WebGame, JsError> {
        let mut settings = match settings {
            Some(json) => Settings::from_json(&json)?,
            None => Settings::default(),
        };
        if settings.seed.is_none() {
            settings.seed = Some(js_sys::Date::now() as u64);
        }
        let scenario = parse_scenario(scenario)?.unwrap_or_else(Scenario::world);
        Ok(WebGame {
            game: Game::new(settings, scenario, JsImagery { lookup })?,
            subscriptions: Vec::new(),
        })
    }

    /// Start over; keeps the current scenario/round count when omitted
    #[wasm_bindgen(js_name = newGame)]
    pub fn new_game(&mut self, scenario: Option<String>, round_count: Option<u32>) -> Result<(), JsError> {
        let scenario = parse_scenario(scenario)?;
        let rules = round_count
            .map(|n| RoundRules::new(n, self.game.rules().distribution()))
            .transpose()?;
        self.game.new_game(scenario, rules);
        Ok(())
    }

    #[wasm_bindgen(js_name = nextRound)]
    pub fn next_round(&mut self) -> bool {
        self.game.next_round()
    }

    #[wasm_bindgen(js_name = placeGuess)]
    pub fn place_guess(&mut self, lat: f64, lng: f64) -> Result<bool, JsError> {
        Ok(self.game.place_guess(Coordinate::new(lat, lng)?))
    }

    /// Result of the guess as JSON, or `undefined` if it was ignored
    #[wasm_bindgen(js_name = makeGuess)]
    pub fn make_guess(&mut self) -> Result<Option<String>, JsError> {
        let Some(result) = self.game.make_guess() else {
            return Ok(None);
        };
        Ok(Some(serde_json::to_string(&result).map_err(GameError::from)?))
    }

    #[wasm_bindgen(js_name = returnHome)]
    pub fn return_home(&mut self) {
        self.game.return_home();
    }

    #[wasm_bindgen(js_name = toggleRegionOverlay)]
    pub fn toggle_region_overlay(&mut self) -> bool {
        self.game.toggle_region_overlay()
    }

    pub fn update(&mut self, dt_ms: f64) {
        self.game.update(dt_ms);
    }

    /// Queued view commands as a JSON array
    #[wasm_bindgen(js_name = drainCommands)]
    pub fn drain_commands(&mut self) -> Result<String, JsError> {
        let commands = self.game.drain_commands();
        Ok(serde_json::to_string(&commands).map_err(GameError::from)?)
    }

    #[wasm_bindgen(js_name = currentRound)]
    pub fn current_round(&self) -> u32 {
        self.game.session().current_round()
    }

    #[wasm_bindgen(js_name = totalScore)]
    pub fn total_score(&self) -> f64 {
        self.game.session().total_score() as f64
    }

    /// Subscribe to `"preload"` or `"nextRound"`; returns an id for `off`
    pub fn on(&mut self, event: &str, callback: Function) -> Result<u32, JsError> {
        let event = parse_event(event)?;
        let subscription = self.game.on(event, js_listener(callback));
        Ok(self.track(subscription))
    }

    /// Like `on`, but only for the next occurrence within the current game
    pub fn once(&mut self, event: &str, callback: Function) -> Result<u32, JsError> {
        let event = parse_event(event)?;
        let subscription = self.game.once(event, js_listener(callback));
        Ok(self.track(subscription))
    }

    pub fn off(&mut self, id: u32) -> bool {
        match self.subscriptions.get_mut(id as usize).and_then(Option::take) {
            Some(subscription) => self.game.off(subscription),
            None => false,
        }
    }
}

impl WebGame {
    fn track(&mut self, subscription: Subscription<GameEvent>) -> u32 {
        self.subscriptions.push(Some(subscription));
        (self.subscriptions.len() - 1) as u32
    }
}

fn js_listener(callback: Function) -> impl FnMut() + 'static {
    move || {
        if let Err(e) = callback.call0(&JsValue::NULL) {
            log::warn!("Event listener threw: {:?}", e);
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
    log::info!("Geo Guess controller loaded");
}
