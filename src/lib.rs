// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod nonterm;
pub mod persistence;
pub mod phrase_table;
pub mod provision;

pub use crate::config::JoinScoreConfig;
pub use crate::core::engine::JoinScorer;
pub use crate::core::state::{compare_states, JoinState};
pub use crate::core::types::{Interner, TokenId, Vocabulary};
pub use crate::error::{JoinError, Result};

/// Installs a `tracing` subscriber filtered by `RUST_LOG` (default `warn`).
/// Safe to call more than once.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
