//! Timer registry bound to an [`EventLoop`].
//!
//! Registration and arming are separate steps so a batch of timers can be
//! declared up front and spun together. Stopping halts firing without
//! forgetting the registration; a later `start()` resumes repeating
//! timers on their repeat interval rather than replaying the initial
//! delay.

use crate::error::LoopError;
use crate::event_loop::EventLoop;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;

pub type TimerCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Declarative description of a timer.
#[derive(Debug, Clone, Copy)]
pub struct TimerSpec {
    /// Delay before the first fire.
    pub timeout: Duration,
    /// Repeat interval. `None` means one-shot.
    pub interval: Option<Duration>,
}

impl TimerSpec {
    pub fn once(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: None,
        }
    }

    /// Repeating timer whose interval equals its initial delay.
    pub fn repeating(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: Some(timeout),
        }
    }

    pub fn repeating_after(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: Some(interval),
        }
    }
}

struct Timer {
    spec: TimerSpec,
    callback: TimerCallback,
    /// Armed at least once. A started one-shot is spent and never
    /// re-armed; a started repeating timer resumes on its interval.
    started: bool,
    task: Option<JoinHandle<()>>,
}

impl Timer {
    fn is_active(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

/// Owns a batch of timers whose callbacks execute on the event loop's
/// worker thread. Cloneable handle over shared state.
#[derive(Clone)]
pub struct TimerRegistry {
    event_loop: EventLoop,
    timers: Arc<Mutex<Vec<Timer>>>,
}

impl TimerRegistry {
    pub fn new(event_loop: EventLoop) -> Self {
        Self {
            event_loop,
            timers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a timer without arming it.
    pub fn add<F>(&self, spec: TimerSpec, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.timers.lock().unwrap().push(Timer {
            spec,
            callback: Arc::new(callback),
            started: false,
            task: None,
        });
    }

    pub fn len(&self) -> usize {
        self.timers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.lock().unwrap().is_empty()
    }

    /// Arm every registered timer. Unstarted timers wait their initial
    /// delay; previously stopped repeating timers resume on their repeat
    /// interval. Starts the owning loop when necessary. Idempotent for
    /// already-active timers.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError`] when the owning loop cannot start.
    pub fn start(&self) -> Result<(), LoopError> {
        self.event_loop.start()?;

        let handle = self
            .event_loop
            .handle()
            .ok_or_else(|| LoopError::State {
                message: "Loop backend unavailable for timers".to_string(),
                location: common::ErrorLocation::from(std::panic::Location::caller()),
            })?;

        let mut timers = self.timers.lock().unwrap();
        let mut armed = 0usize;

        for timer in timers.iter_mut() {
            if timer.is_active() {
                continue;
            }

            let first = if !timer.started {
                timer.spec.timeout
            } else {
                // resume semantics for a stopped repeating timer
                match timer.spec.interval {
                    Some(interval) => interval,
                    None => continue, // spent one-shot
                }
            };

            let interval = timer.spec.interval;
            let callback = Arc::clone(&timer.callback);

            timer.started = true;
            timer.task = Some(handle.spawn(async move {
                tokio::time::sleep(first).await;
                callback();

                if let Some(interval) = interval {
                    loop {
                        tokio::time::sleep(interval).await;
                        callback();
                    }
                }
            }));

            armed += 1;
        }

        debug!("armed {armed} timer(s)");
        Ok(())
    }

    /// Halt every active timer, keeping registrations. Idempotent.
    pub fn stop(&self) {
        let mut timers = self.timers.lock().unwrap();
        let mut halted = 0usize;

        for timer in timers.iter_mut() {
            if let Some(task) = timer.task.take() {
                task.abort();
                halted += 1;
            }
        }

        debug!("halted {halted} timer(s)");
    }
}
