use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failures of window-table management. Capacity refusals for lookup
/// paths are `None`, not errors; explicit creation at a bad index is the
/// programming error surfaced here.
#[derive(Debug, ThisError)]
pub enum WindowError {
    #[error("Window index out of range: {message} {location}")]
    OutOfRange {
        message: String,
        location: ErrorLocation,
    },

    #[error("Window state error: {message} {location}")]
    State {
        message: String,
        location: ErrorLocation,
    },
}
