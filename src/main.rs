//! Geo Guess entry point
//!
//! The browser build is driven from the page through `geo_guess::web`. The
//! native binary plays one scripted game against synthetic imagery coverage
//! and logs every round.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::DVec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use geo_guess::sim::{Game, GamePhase, ImageryService, Panorama};
    use geo_guess::{Coordinate, GameError, ScenarioConfig, Settings, format_distance};

    const SCENARIO: &str = r#"{
        "name": "Western Europe",
        "regions": [[
            { "lat": 43.0, "lng": -5.0 },
            { "lat": 54.0, "lng": -5.0 },
            { "lat": 54.0, "lng": 15.0 },
            { "lat": 43.0, "lng": 15.0 }
        ]],
        "curve": { "kind": "exponential", "max_score": 5000, "falloff_m": 2000000.0 }
    }"#;

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const MAX_FRAMES: u32 = 100_000;

    /// Panoramas exist for a fixed share of candidate points
    struct PatchyImagery {
        rng: Pcg32,
        coverage: f64,
    }

    impl ImageryService for PatchyImagery {
        fn find_panorama(&mut self, near: Coordinate, _radius_m: f64) -> Option<Panorama> {
            if !self.rng.random_bool(self.coverage) {
                return None;
            }
            Some(Panorama {
                id: format!("demo-{:08x}", self.rng.random::<u32>()),
                position: near,
            })
        }
    }

    pub fn run() -> Result<(), GameError> {
        let scenario = ScenarioConfig::from_json(SCENARIO)?.into_scenario()?;
        let settings = Settings {
            seed: Some(2024),
            ..Settings::default()
        };
        let imagery = PatchyImagery {
            rng: Pcg32::seed_from_u64(7),
            coverage: 0.35,
        };
        let mut game = Game::new(settings, scenario, imagery)?;
        let mut player = Pcg32::seed_from_u64(11);

        for _ in 0..MAX_FRAMES {
            game.update(FRAME_MS);
            for command in game.drain_commands() {
                log::debug!("{}", serde_json::to_string(&command)?);
            }

            match game.phase() {
                GamePhase::AwaitingGuess => {
                    let Some(actual) = game.session().current_destination().map(|d| d.coordinate) else {
                        continue;
                    };
                    let miss = DVec2::new(player.random_range(-4.0..4.0), player.random_range(-6.0..6.0));
                    game.place_guess(Coordinate::from_dvec2(actual.as_dvec2() + miss));
                    if let Some(result) = game.make_guess() {
                        println!(
                            "Round {}: {} off, {} points",
                            game.session().current_round(),
                            format_distance(result.distance_m),
                            result.score
                        );
                    }
                }
                GamePhase::RoundResolved if !game.overview().is_animating() => {
                    game.next_round();
                }
                GamePhase::GameResolved if !game.overview().is_animating() => {
                    println!(
                        "Game over: {} of {} points",
                        game.session().total_score(),
                        game.rules().round_count() as u64 * game.scenario().max_score() as u64
                    );
                    return Ok(());
                }
                _ => {}
            }
        }
        log::warn!("Demo stopped after {} frames", MAX_FRAMES);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Geo Guess (native) starting...");
    if let Err(e) = demo::run() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is geo_guess::web::start, this is just to satisfy the compiler
}
