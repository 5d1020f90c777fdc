//! The single cooperative event loop.
//!
//! Exactly one loop serializes all native handler execution, independent
//! of which thread submitted the work. The backend poller is a tokio
//! current-thread runtime pinned to a dedicated worker thread; work items
//! arrive through a FIFO guarded by a short-held mutex and drain
//! exclusively on that thread.
//!
//! # Lifecycle
//!
//! The loop is an explicit state machine (`Uninitialized → Initialized →
//! Running → Stopped`, with `Stopped → Running` permitted after a full
//! backend reinit). Boolean running/init flags raced in earlier designs;
//! the single state enum under one mutex removes that class of bug.
//!
//! # Ordering
//!
//! Items dispatched from a single thread run in submission order. Across
//! threads only FIFO-per-queue plus the single-consumer property hold; no
//! global order is guaranteed without external synchronization.

pub mod timers;

use crate::error::LoopError;

use common::ErrorLocation;

use std::collections::VecDeque;
use std::panic::Location;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, error};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::Notify;

/// Upper bound on how long the poller sleeps between drain passes while
/// idle. Bounds dispatch latency without busy-spinning.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(32);

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
}

/// Cloneable handle to the loop. All clones share one queue, one state
/// machine, and one worker thread.
#[derive(Clone)]
pub struct EventLoop {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<LoopState>,
    queue: Mutex<VecDeque<Job>>,
    wake: Notify,
    /// Backend runtime built at init, consumed by the worker at start.
    runtime: Mutex<Option<Runtime>>,
    handle: Mutex<Option<Handle>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Count of completed drain cycles, for `wait()` rendezvous.
    drained: Mutex<u64>,
    drained_signal: Condvar,
}

impl EventLoop {
    /// Build a loop with its backend poller initialized.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Backend`] if the backend runtime cannot be
    /// built. That failure is fatal to this instance; no partial-running
    /// state exists.
    pub fn new() -> Result<Self, LoopError> {
        let event_loop = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(LoopState::Uninitialized),
                queue: Mutex::new(VecDeque::new()),
                wake: Notify::new(),
                runtime: Mutex::new(None),
                handle: Mutex::new(None),
                worker: Mutex::new(None),
                drained: Mutex::new(0),
                drained_signal: Condvar::new(),
            }),
        };

        event_loop.init()?;
        Ok(event_loop)
    }

    pub fn state(&self) -> LoopState {
        *self.inner.state.lock().unwrap()
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Handle to the backend runtime while the loop runs. Tasks spawned
    /// on it execute on the loop's worker thread.
    pub fn handle(&self) -> Option<Handle> {
        self.inner.handle.lock().unwrap().clone()
    }

    /// Build (or rebuild, after a stop) the backend runtime.
    fn init(&self) -> Result<(), LoopError> {
        let mut state = self.inner.state.lock().unwrap();
        match *state {
            LoopState::Initialized | LoopState::Running => return Ok(()),
            LoopState::Uninitialized | LoopState::Stopped => {}
        }

        let runtime = Builder::new_current_thread()
            .enable_time()
            .enable_io()
            .build()
            .map_err(|e| LoopError::Backend {
                message: format!("Failed to build loop backend: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        *self.inner.handle.lock().unwrap() = Some(runtime.handle().clone());
        *self.inner.runtime.lock().unwrap() = Some(runtime);
        *state = LoopState::Initialized;

        Ok(())
    }

    /// Spin the poller on its dedicated worker thread. Idempotent; a
    /// start after a stop fully reinitializes the backend.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Backend`] when a backend rebuild fails.
    pub fn start(&self) -> Result<(), LoopError> {
        self.init()?;

        {
            let mut state = self.inner.state.lock().unwrap();
            if *state == LoopState::Running {
                return Ok(());
            }
            *state = LoopState::Running;
        }

        let runtime = self
            .inner
            .runtime
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| LoopError::State {
                message: "Loop backend missing at start".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let inner = Arc::clone(&self.inner);
        let worker = std::thread::Builder::new()
            .name("event-loop".to_string())
            .spawn(move || poll_event_loop(inner, runtime))
            .map_err(|e| LoopError::Backend {
                message: format!("Failed to spawn loop worker: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        *self.inner.worker.lock().unwrap() = Some(worker);
        debug!("event loop started");
        Ok(())
    }

    /// Signal the poller to exit and join the worker thread. Idempotent.
    /// Queued-but-undrained items are dropped, not retried.
    pub fn stop(&self) {
        {
            let mut state = self.inner.state.lock().unwrap();
            if *state != LoopState::Running {
                return;
            }
            *state = LoopState::Stopped;
        }

        self.inner.wake.notify_one();

        let worker = self.inner.worker.lock().unwrap().take();
        if let Some(worker) = worker
            && worker.thread().id() != std::thread::current().id()
        {
            let _ = worker.join();
        }

        self.inner.handle.lock().unwrap().take();
        self.inner.queue.lock().unwrap().clear();
        debug!("event loop stopped");
    }

    /// Enqueue `callback` for execution on the loop's worker thread.
    ///
    /// Thread-safe and non-blocking; starts the loop on first use. The
    /// callback always eventually runs unless the loop is stopped first.
    pub fn dispatch<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.queue.lock().unwrap().push_back(Box::new(callback));

        if let Err(e) = self.start() {
            error!("dispatch could not start loop: {e}");
            return;
        }

        self.inner.wake.notify_one();
    }

    /// Block the calling thread until the loop has completed at least
    /// one full drain cycle after reaching the running state.
    ///
    /// Returns immediately when the loop is not running. Used by tests
    /// and synchronous callers that need a rendezvous point.
    pub fn wait(&self) {
        let target = *self.inner.drained.lock().unwrap() + 1;

        let mut drained = self.inner.drained.lock().unwrap();
        while *drained < target {
            if !self.is_running() {
                return;
            }

            let (guard, _) = self
                .inner
                .drained_signal
                .wait_timeout(drained, POLL_TIMEOUT)
                .unwrap();
            drained = guard;
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Last handle gone; make sure the worker exits.
        *self.state.lock().unwrap() = LoopState::Stopped;
        self.wake.notify_one();

        if let Some(worker) = self.worker.lock().unwrap().take()
            && worker.thread().id() != std::thread::current().id()
        {
            let _ = worker.join();
        }
    }
}

/// The poller body. Drains the FIFO, publishes the drain-cycle count,
/// then parks until woken or until the poll ceiling elapses.
fn poll_event_loop(inner: Arc<Inner>, runtime: Runtime) {
    runtime.block_on(async {
        loop {
            loop {
                let job = inner.queue.lock().unwrap().pop_front();
                match job {
                    Some(job) => job(),
                    None => break,
                }
            }

            {
                let mut drained = inner.drained.lock().unwrap();
                *drained += 1;
                inner.drained_signal.notify_all();
            }

            if *inner.state.lock().unwrap() != LoopState::Running {
                break;
            }

            tokio::select! {
                _ = inner.wake.notified() => {}
                _ = tokio::time::sleep(POLL_TIMEOUT) => {}
            }
        }
    });
}
