//! Message router with reply correlation.
//!
//! The router owns the route table, the staged-buffer map, and the hook
//! into the renderer (an injected script evaluator). Handlers registered
//! as async are deferred onto the event loop; sync handlers run inline on
//! the invoking thread. Replies travel back as scripts through the
//! evaluator, or through the data side channel when they carry bytes.
//!
//! Everything here is a cloneable handle over shared state; locks are
//! scoped to individual table operations so a handler may re-enter the
//! router (map, invoke, send) without deadlocking.

use crate::event_loop::EventLoop;
use crate::ipc::codec::encode_uri_component;
use crate::ipc::data::{DataManager, DataPayload};
use crate::ipc::message::{Message, MessageBuffer, SEQ_BROADCAST};
use crate::ipc::reply::Reply;
use crate::ipc::scripts;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;
use serde_json::Value;

/// Receives the reply produced by a route handler.
pub type ResultCallback = Arc<dyn Fn(Reply) + Send + Sync + 'static>;

/// A route handler. Takes the parsed message, a router handle for
/// re-entrant sends, and the callback that receives its reply.
pub type RouteHandler = Arc<dyn Fn(Message, Router, ResultCallback) + Send + Sync + 'static>;

/// Evaluates a script in the renderer. Installed by the owning window
/// once its surface exists.
pub type ScriptEvaluator = Arc<dyn Fn(String) + Send + Sync + 'static>;

#[derive(Clone)]
struct RouteEntry {
    is_async: bool,
    handler: RouteHandler,
}

#[derive(Clone)]
pub struct Router {
    table: Arc<Mutex<HashMap<String, RouteEntry>>>,
    /// Buffers staged ahead of the message that consumes them, keyed by
    /// `(window index, seq)`. Consumed exactly once.
    buffers: Arc<Mutex<HashMap<(i32, String), MessageBuffer>>>,
    evaluator: Arc<Mutex<Option<ScriptEvaluator>>>,
    event_loop: EventLoop,
    data: DataManager,
}

impl Router {
    pub fn new(event_loop: EventLoop) -> Self {
        Self {
            table: Arc::new(Mutex::new(HashMap::new())),
            buffers: Arc::new(Mutex::new(HashMap::new())),
            evaluator: Arc::new(Mutex::new(None)),
            event_loop,
            data: DataManager::new(),
        }
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn data(&self) -> &DataManager {
        &self.data
    }

    /// Register `handler` under `name`. Re-registration replaces the
    /// previous handler (last write wins).
    pub fn map<F>(&self, name: &str, is_async: bool, handler: F)
    where
        F: Fn(Message, Router, ResultCallback) + Send + Sync + 'static,
    {
        self.table.lock().unwrap().insert(
            name.to_string(),
            RouteEntry {
                is_async,
                handler: Arc::new(handler),
            },
        );
    }

    pub fn unmap(&self, name: &str) {
        self.table.lock().unwrap().remove(name);
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.table.lock().unwrap().contains_key(name)
    }

    /// Install the renderer hook. Replies produced before an evaluator
    /// exists are dropped by `send`, which reports that with `false`.
    pub fn set_evaluator<F>(&self, evaluator: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        *self.evaluator.lock().unwrap() = Some(Arc::new(evaluator));
    }

    /// Run `script` through the installed evaluator.
    pub fn evaluate_script(&self, script: &str) -> bool {
        let evaluator = self.evaluator.lock().unwrap().clone();
        match evaluator {
            Some(evaluator) => {
                evaluator(script.to_string());
                true
            }
            None => false,
        }
    }

    /// Defer `callback` onto the owning event loop.
    pub fn dispatch<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.event_loop.dispatch(callback);
    }

    /// Stage a buffer for the message identified by `(index, seq)` that
    /// has not arrived yet.
    pub fn set_mapped_buffer(&self, index: i32, seq: &str, buffer: MessageBuffer) {
        self.buffers
            .lock()
            .unwrap()
            .insert((index, seq.to_string()), buffer);
    }

    pub fn has_mapped_buffer(&self, index: i32, seq: &str) -> bool {
        self.buffers
            .lock()
            .unwrap()
            .contains_key(&(index, seq.to_string()))
    }

    pub fn remove_mapped_buffer(&self, index: i32, seq: &str) -> Option<MessageBuffer> {
        self.buffers
            .lock()
            .unwrap()
            .remove(&(index, seq.to_string()))
    }

    /// Evict every buffer staged for window `index`. Called on window
    /// teardown so stale stages cannot outlive their window.
    pub fn clear_mapped_buffers(&self, index: i32) {
        self.buffers
            .lock()
            .unwrap()
            .retain(|(buffer_index, _), _| *buffer_index != index);
    }

    /// Route `message` to its handler, delivering the reply to
    /// `callback`.
    ///
    /// Returns `false` (callback never called) when no route matches.
    /// A buffer staged for the message's `(index, seq)` is attached and
    /// evicted atomically before the handler sees the message.
    pub fn invoke(&self, message: &Message, callback: ResultCallback) -> bool {
        let entry = match self.table.lock().unwrap().get(&message.name) {
            Some(entry) => entry.clone(),
            None => return false,
        };

        let mut message = message.clone();
        if message.buffer.is_none()
            && let Some(buffer) = self.remove_mapped_buffer(message.index, &message.seq)
        {
            message.buffer = Some(buffer);
        }

        debug!(
            "invoking route {:?} (seq {:?}, async {})",
            message.name, message.seq, entry.is_async
        );

        if entry.is_async {
            let router = self.clone();
            self.event_loop.dispatch(move || {
                (entry.handler)(message, router.clone(), callback);
            });
        } else {
            (entry.handler)(message, self.clone(), callback);
        }

        true
    }

    /// Route `message` with the default callback, which sends the reply
    /// back to the renderer keyed by the message's seq.
    pub fn invoke_and_reply(&self, message: &Message) -> bool {
        let router = self.clone();
        self.invoke(
            message,
            Arc::new(move |reply: Reply| {
                router.send(&reply.seq, &reply.json(), reply.payload.clone());
            }),
        )
    }

    /// Deliver a reply to the renderer.
    ///
    /// A payload, or a broadcast seq, travels through the data side
    /// channel's bootstrap script. A real seq settles the pending promise
    /// through the resolve script. A bare string with no seq is evaluated
    /// directly as script text. Returns `false` when no evaluator is
    /// installed, which is expected while a window is still under
    /// construction.
    pub fn send(&self, seq: &str, value: &Value, payload: Option<DataPayload>) -> bool {
        if payload.is_some() || seq == SEQ_BROADCAST {
            let params = value.to_string();
            let script = self
                .data
                .create(seq, &params, payload.unwrap_or_default());
            return self.evaluate_script(&script);
        }

        if !seq.is_empty() {
            let encoded = encode_uri_component(&value.to_string());
            let script = scripts::resolve_to_render_process(seq, "0", &encoded);
            return self.evaluate_script(&script);
        }

        if let Value::String(script) = value {
            return self.evaluate_script(script);
        }

        false
    }

    /// Dispatch an unsolicited CustomEvent into the renderer.
    pub fn emit(&self, name: &str, data: &Value) -> bool {
        let encoded = encode_uri_component(&data.to_string());
        let script = scripts::emit_to_render_process_default(name, &encoded);
        self.evaluate_script(&script)
    }
}
