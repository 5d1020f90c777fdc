//! Process exit supervision.
//!
//! The exit callback is owned by an explicit object installed once at
//! startup, and OS signal delivery is marshalled onto the event loop.
//! No user code ever runs inside the signal context itself; the signal
//! listener only enqueues.

use crate::error::SkiffError;

use common::ErrorLocation;
use shell_core::event_loop::EventLoop;

use std::panic::Location;
use std::sync::{Arc, Mutex};

use log::{error, info};

pub type ExitCallback = Arc<dyn Fn(i32) + Send + Sync + 'static>;

#[derive(Clone)]
pub struct Supervisor {
    event_loop: EventLoop,
    callback: Arc<Mutex<Option<ExitCallback>>>,
}

impl Supervisor {
    pub fn new(event_loop: EventLoop) -> Self {
        Self {
            event_loop,
            callback: Arc::new(Mutex::new(None)),
        }
    }

    /// Install the exit callback. Installed once at startup; a second
    /// install replaces the first.
    pub fn set_exit_callback<F>(&self, callback: F)
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        *self.callback.lock().unwrap() = Some(Arc::new(callback));
    }

    /// Request shutdown with `code`. The callback runs on the event
    /// loop, never on the caller's thread.
    pub fn exit(&self, code: i32) {
        let callback = self.callback.lock().unwrap().clone();
        let Some(callback) = callback else {
            error!("exit({code}) requested before a callback was installed");
            return;
        };

        self.event_loop.dispatch(move || callback(code));
    }

    /// Listen for Ctrl-C and translate it into `exit(0)`.
    ///
    /// # Errors
    ///
    /// Returns [`SkiffError::Core`] when the event loop cannot start or
    /// its backend handle is unavailable.
    pub fn listen_for_signals(&self) -> Result<(), SkiffError> {
        self.event_loop
            .start()
            .map_err(|e| SkiffError::core("Failed to start event loop", e))?;

        let handle = self.event_loop.handle().ok_or_else(|| SkiffError::Core {
            message: "Event loop backend unavailable".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let supervisor = self.clone();
        handle.spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, shutting down");
                    supervisor.exit(0);
                }
                Err(e) => error!("Signal listener failed: {e}"),
            }
        });

        Ok(())
    }
}
