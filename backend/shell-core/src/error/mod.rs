pub mod event_loop;
pub mod window;

pub use event_loop::LoopError;
pub use window::WindowError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Loop(#[from] event_loop::LoopError),

    #[error(transparent)]
    Window(#[from] window::WindowError),
}
