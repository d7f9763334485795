// File: src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JoinError {
    // Configuration errors
    #[error("Invalid parameter `{key}={value}`: {reason}")]
    Configuration {
        key: String,
        value: String,
        reason: String,
    },

    /// The feature expects request data that the scope did not supply.
    #[error("Missing request data for `{0}`")]
    MissingRequestData(String),

    // Invariant violations
    #[error("Invalid juncture value: {prev} {curr}")]
    InvalidJuncture { prev: i32, curr: i32 },

    #[error("Number of morphemes ({len}) exceeds max ({max})")]
    WindowOverflow { len: usize, max: usize },

    #[error("Placeholder index mismatch: expected {expected}, found {found}")]
    PlaceholderMismatch { expected: usize, found: usize },

    // Request-level errors
    #[error("Invalid placeholder index={index} (table holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Zero denominator at {position}: smoothing={smoothing} over an empty map")]
    DivisionByZero { position: String, smoothing: f32 },

    // Input errors
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl JoinError {
    /// Invariant violations mean the model or the caller is broken; the
    /// current run must stop instead of carrying on with wrong scores.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            JoinError::InvalidJuncture { .. }
                | JoinError::WindowOverflow { .. }
                | JoinError::PlaceholderMismatch { .. }
        )
    }

    pub(crate) fn config(key: &str, value: &str, reason: impl Into<String>) -> Self {
        JoinError::Configuration {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = JoinError> = std::result::Result<T, E>;
