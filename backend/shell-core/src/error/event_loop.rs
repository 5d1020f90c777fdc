use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failures of the event loop backend.
///
/// These are the only fatal conditions in the core: a loop whose backend
/// cannot be built must not exist in a partial-running state. Everything
/// the router or a handler can fail at travels through the reply envelope
/// instead.
#[derive(Debug, ThisError)]
pub enum LoopError {
    #[error("Backend Error: {message} {location}")]
    Backend {
        message: String,
        location: ErrorLocation,
    },

    #[error("State Error: {message} {location}")]
    State {
        message: String,
        location: ErrorLocation,
    },
}
