//! Fixed-capacity window table and lifecycle state machine.
//!
//! One mutex around the whole table serializes structural mutation and
//! status transitions. Internal helpers never call back into locking
//! methods, so the lock stays non-reentrant. Window indices are dense
//! small integers shared with the renderer side; a slot can be reused
//! only after its previous occupant was destroyed.

use crate::MAX_WINDOWS;
use crate::error::WindowError;
use crate::event_loop::EventLoop;
use crate::window::{RendererSurface, Window, WindowOptions};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::debug;

/// Lifecycle states. Discriminants are part of the renderer-visible
/// contract; transitions are monotonic except the showing/hiding cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
pub enum WindowStatus {
    None = 0,
    Creating = 10,
    Created = 11,
    Hiding = 20,
    Hidden = 21,
    Showing = 30,
    Shown = 31,
    Closing = 40,
    Closed = 41,
    Exiting = 50,
    Exited = 51,
    Killing = 60,
    Killed = 61,
}

/// Builds a renderer surface for a window about to be created.
pub type SurfaceFactory =
    Arc<dyn Fn(i32, &WindowOptions) -> Arc<dyn RendererSurface> + Send + Sync + 'static>;

struct ManagedWindow {
    window: Arc<Window>,
    status: WindowStatus,
}

pub struct WindowManager {
    event_loop: EventLoop,
    factory: SurfaceFactory,
    slots: Mutex<Vec<Option<ManagedWindow>>>,
}

impl WindowManager {
    pub fn new(event_loop: EventLoop, factory: SurfaceFactory) -> Self {
        let mut slots = Vec::with_capacity(MAX_WINDOWS);
        slots.resize_with(MAX_WINDOWS, || None);

        Self {
            event_loop,
            factory,
            slots: Mutex::new(slots),
        }
    }

    /// Create the window at `options.index`, or return the existing one
    /// (idempotent per slot).
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::OutOfRange`] for a negative or
    /// out-of-range index.
    pub fn create_window(&self, options: WindowOptions) -> Result<Arc<Window>, WindowError> {
        let index = options.index;
        let slot = slot_for(index).ok_or_else(|| WindowError::OutOfRange {
            message: format!("index {index} exceeds capacity {MAX_WINDOWS}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let mut slots = self.slots.lock().unwrap();

        if let Some(managed) = &slots[slot]
            && managed.status < WindowStatus::Exiting
        {
            return Ok(Arc::clone(&managed.window));
        }

        let started_at = Instant::now();
        let surface = (self.factory)(index, &options);
        let window = Arc::new(Window::new(
            index,
            options,
            self.event_loop.clone(),
            surface,
        ));

        slots[slot] = Some(ManagedWindow {
            window: Arc::clone(&window),
            status: WindowStatus::Created,
        });

        debug!(
            "Window#{index} created in {}ms",
            started_at.elapsed().as_millis()
        );

        Ok(window)
    }

    /// Fetch the window at `index`, creating it with default options
    /// when the slot is empty. Out-of-range or negative indices are
    /// refused with `None`, never an error.
    pub fn get_or_create_window(&self, index: i32) -> Option<Arc<Window>> {
        slot_for(index)?;

        if let Some(window) = self.get_window(index) {
            return Some(window);
        }

        self.create_window(WindowOptions {
            index,
            ..WindowOptions::default()
        })
        .ok()
    }

    /// The live (pre-exit) window at `index`, if any.
    pub fn get_window(&self, index: i32) -> Option<Arc<Window>> {
        let slot = slot_for(index)?;
        let slots = self.slots.lock().unwrap();

        slots[slot]
            .as_ref()
            .filter(|managed| managed.status < WindowStatus::Exiting)
            .map(|managed| Arc::clone(&managed.window))
    }

    pub fn status(&self, index: i32) -> WindowStatus {
        let Some(slot) = slot_for(index) else {
            return WindowStatus::None;
        };

        self.slots.lock().unwrap()[slot]
            .as_ref()
            .map(|managed| managed.status)
            .unwrap_or(WindowStatus::None)
    }

    /// Show the window. No-op at or after closing.
    pub fn show_window(&self, index: i32) {
        self.transition(index, WindowStatus::Showing, WindowStatus::Shown, |window| {
            window.surface().show();
        });
    }

    /// Hide the window. No-op at or after closing.
    pub fn hide_window(&self, index: i32) {
        self.transition(index, WindowStatus::Hiding, WindowStatus::Hidden, |window| {
            window.surface().hide();
        });
    }

    /// Close the window's surface and mark it closed.
    pub fn close_window(&self, index: i32) {
        let Some(slot) = slot_for(index) else {
            return;
        };

        let started_at = Instant::now();
        let mut slots = self.slots.lock().unwrap();
        let Some(managed) = slots[slot].as_mut() else {
            return;
        };

        if managed.status >= WindowStatus::Closed {
            return;
        }

        managed.status = WindowStatus::Closing;
        managed.window.surface().close();
        managed.status = WindowStatus::Closed;

        debug!(
            "Window#{index} closed in {}ms",
            started_at.elapsed().as_millis()
        );
    }

    /// Run the window's exit hook with `code` and mark it exited.
    pub fn exit_window(&self, index: i32, code: i32) {
        let Some(slot) = slot_for(index) else {
            return;
        };

        let window = {
            let mut slots = self.slots.lock().unwrap();
            let Some(managed) = slots[slot].as_mut() else {
                return;
            };

            if managed.status >= WindowStatus::Exited {
                return;
            }

            managed.status = WindowStatus::Exiting;
            let window = Arc::clone(&managed.window);
            managed.status = WindowStatus::Exited;
            window
        };

        // hook runs outside the table lock; it may re-enter the manager
        window.exit(code);
        debug!("Window#{index} exited with code {code}");
    }

    /// Force the window through closing and killing, evict its staged
    /// buffers and payloads, and free the slot. Total from any state.
    pub fn destroy_window(&self, index: i32) {
        let Some(slot) = slot_for(index) else {
            return;
        };

        let started_at = Instant::now();
        let mut slots = self.slots.lock().unwrap();
        let Some(mut managed) = slots[slot].take() else {
            return;
        };

        if managed.status < WindowStatus::Closed {
            managed.status = WindowStatus::Closing;
            managed.window.surface().close();
            managed.status = WindowStatus::Closed;
        }

        managed.status = WindowStatus::Killing;
        managed.window.surface().kill();
        managed.window.router().clear_mapped_buffers(index);
        managed.window.router().data().clear();
        managed.status = WindowStatus::Killed;

        debug!(
            "Window#{index} destroyed in {}ms",
            started_at.elapsed().as_millis()
        );
    }

    /// Tear down every window.
    pub fn destroy(&self) {
        for index in 0..MAX_WINDOWS as i32 {
            self.destroy_window(index);
        }
    }

    fn transition<F>(&self, index: i32, during: WindowStatus, after: WindowStatus, apply: F)
    where
        F: FnOnce(&Window),
    {
        let Some(slot) = slot_for(index) else {
            return;
        };

        let started_at = Instant::now();
        let mut slots = self.slots.lock().unwrap();
        let Some(managed) = slots[slot].as_mut() else {
            return;
        };

        if managed.status >= WindowStatus::Closing {
            return;
        }

        managed.status = during;
        apply(&managed.window);
        managed.status = after;

        debug!(
            "Window#{index} {after:?} in {}ms",
            started_at.elapsed().as_millis()
        );
    }
}

fn slot_for(index: i32) -> Option<usize> {
    if index < 0 || index as usize >= MAX_WINDOWS {
        return None;
    }
    Some(index as usize)
}
