use thiserror::Error;

/// Errors raised while building game inputs.
///
/// Runtime operations on a running game never fail; misuse there is logged
/// and ignored.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("latitude {lat} / longitude {lng} is outside [-90, 90] x [-180, 180]")]
    InvalidCoordinate { lat: f64, lng: f64 },
    #[error("a game needs at least one round")]
    InvalidRoundCount,
    #[error("a playable region needs at least three vertices, got {0}")]
    DegenerateRegion(usize),
    #[error("invalid score curve: {0}")]
    InvalidCurve(&'static str),
    #[error("invalid settings: {0}")]
    InvalidSettings(&'static str),
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}
