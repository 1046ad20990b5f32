//! Error types for the dispatch engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and the annual run.

use std::path::PathBuf;

/// Top-level error for the dispatch engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: biosolid_core::ConfigError,
    },

    /// Registry construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: biosolid_world::WorldError,
    },

    /// The annual run failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: biosolid_core::RunnerError,
    },

    /// The demonstration region could not be built.
    #[error("region error: {message}")]
    Region {
        /// Description of the failure.
        message: String,
    },

    /// The summary or the delivery table could not be serialized.
    #[error("JSON serialization failed: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// An output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Output {
        /// File being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
