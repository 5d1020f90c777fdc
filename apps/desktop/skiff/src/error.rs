use common::ErrorLocation;
use shell_core::error::CoreError;

use std::panic::Location;

use thiserror::Error;

/// Application-level errors for the Skiff shell.
///
/// Bridge-level failures never surface here; they travel through the
/// reply envelope. These variants cover the application wiring around
/// the core: configuration, logging, and loop lifecycle.
#[derive(Debug, Error)]
pub enum SkiffError {
    /// Error from this app's own wiring
    #[error("Skiff Error: {message} {location}")]
    Skiff {
        message: String,
        location: ErrorLocation,
    },

    /// Malformed or unreadable configuration file
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Error from shell-core operations (loop, windows)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}

impl SkiffError {
    /// Wrap a shell-core failure with context and call-site provenance.
    #[track_caller]
    pub fn core(context: &str, error: impl Into<CoreError>) -> Self {
        Self::Core {
            message: format!("{context}: {}", error.into()),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
