//! # Worldgen Errors
//!
//! Error taxonomy for map generation and the automaton engines. Pass-level
//! failures from the worker pool pass through unchanged so callers can keep
//! reacting to them the same way regardless of which engine raised them.

use stratus_core::{CoreError, PassError};
use thiserror::Error;

/// Errors surfaced by world generation.
#[derive(Error, Debug)]
pub enum WorldGenError {
    /// Grid layout or addressing failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A generation pass failed; the previous state was kept.
    #[error(transparent)]
    Pass(#[from] PassError),

    /// Configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but describes an unusable world.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// What the validation pass rejected.
        reason: String,
    },
}

/// Result alias for worldgen operations.
pub type WorldGenResult<T> = Result<T, WorldGenError>;
