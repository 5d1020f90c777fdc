//! A window couples one [`Router`] to one renderer surface.
//!
//! The surface itself is opaque to the core: anything that can evaluate
//! a script, toggle visibility, and tear itself down qualifies. Inbound
//! traffic arrives through two entry points, scheme requests (HTTP-like,
//! can carry binary bodies) and script messages (postMessage-style,
//! strings only); both decode to a [`Message`] and flow through the
//! window's router.

pub mod manager;
pub mod preload;

pub use manager::{WindowManager, WindowStatus};

use crate::event_loop::EventLoop;
use crate::ipc::message::Message;
use crate::ipc::reply::Reply;
use crate::ipc::router::Router;
use crate::ipc::scripts;

use common::HttpStatusCode;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

/// The renderer half of a window. One implementation per target; the
/// core depends only on this trait.
pub trait RendererSurface: Send + Sync {
    fn evaluate(&self, script: &str);
    fn show(&self);
    fn hide(&self);
    fn navigate(&self, url: &str);
    fn set_title(&self, title: &str);
    fn close(&self);
    fn kill(&self);
}

#[derive(Debug, Clone)]
pub struct WindowOptions {
    pub index: i32,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub headless: bool,
    pub config: BTreeMap<String, String>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            index: 0,
            title: String::new(),
            width: 1024,
            height: 768,
            headless: false,
            config: BTreeMap::new(),
        }
    }
}

/// An inbound request intercepted at the custom URI scheme layer.
#[derive(Debug, Clone, Default)]
pub struct SchemeRequest {
    pub uri: String,
    pub body: Option<Vec<u8>>,
}

/// The HTTP-like response completing a scheme request.
#[derive(Debug, Clone)]
pub struct SchemeResponse {
    pub status: HttpStatusCode,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

/// Completes a pending scheme request. Consumed at most once.
pub type SchemeResponder = Box<dyn FnOnce(SchemeResponse) + Send + 'static>;

/// Application hook receiving raw `ipc://` URIs the router declined.
/// Returns `true` when it handled the message.
pub type MessageHook = Arc<dyn Fn(&str) -> bool + Send + Sync + 'static>;

pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync + 'static>;

pub struct Window {
    index: i32,
    options: WindowOptions,
    preload: String,
    router: Router,
    surface: Arc<dyn RendererSurface>,
    message_hook: Arc<Mutex<Option<MessageHook>>>,
    exit_hook: Arc<Mutex<Option<ExitHook>>>,
}

impl Window {
    /// Wire a window together: generate its preload, create its router,
    /// and install the router's delivery hook as a closure marshalling
    /// surface evaluation onto the event loop.
    pub fn new(
        index: i32,
        options: WindowOptions,
        event_loop: EventLoop,
        surface: Arc<dyn RendererSurface>,
    ) -> Self {
        let preload = preload::create_preload(index, &options);
        let router = Router::new(event_loop.clone());

        {
            let surface = Arc::clone(&surface);
            let event_loop = event_loop.clone();
            router.set_evaluator(move |script: String| {
                let surface = Arc::clone(&surface);
                event_loop.dispatch(move || surface.evaluate(&script));
            });
        }

        // serves the side-channel fetch issued by payload bootstrap
        // scripts; each payload is consumed by its first fetch
        {
            let data = router.data().clone();
            router.map("data", false, move |message, _router, callback| {
                let id = match message.get("id").parse::<u64>() {
                    Ok(id) => id,
                    Err(_) => {
                        callback(Reply::err(&message, json!({"message": "Invalid data id"})));
                        return;
                    }
                };

                match data.remove(id) {
                    Some(payload) => {
                        callback(Reply::with_payload(
                            &message,
                            json!({"id": id.to_string()}),
                            payload,
                        ));
                    }
                    None => callback(Reply::err(
                        &message,
                        json!({
                            "message": "Not found",
                            "type": "NotFoundError",
                            "id": id.to_string(),
                        }),
                    )),
                }
            });
        }

        Self {
            index,
            options,
            preload,
            router,
            surface,
            message_hook: Arc::new(Mutex::new(None)),
            exit_hook: Arc::new(Mutex::new(None)),
        }
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    /// Script injected before any content loads.
    pub fn preload(&self) -> &str {
        &self.preload
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn set_message_hook<F>(&self, hook: F)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        *self.message_hook.lock().unwrap() = Some(Arc::new(hook));
    }

    pub fn set_exit_hook<F>(&self, hook: F)
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        *self.exit_hook.lock().unwrap() = Some(Arc::new(hook));
    }

    /// Single entry point for scheme-level inbound calls.
    ///
    /// A fire-and-forget message (broadcast seq) delivers its reply via
    /// the router's script path; the scheme request itself gets no
    /// response because none was expected. A correlated message completes
    /// `respond` with 200 (500 when the envelope carries an `err`) and
    /// the JSON body or binary payload. An unroutable or unmapped message
    /// falls back to the raw-message hook; a hook-handled message is
    /// acknowledged with 200 and its seq, anything else gets a
    /// structured 404.
    pub fn on_scheme_request(&self, request: SchemeRequest, respond: SchemeResponder) {
        let message = match request.body {
            Some(ref body) => Message::parse_with_buffer(&request.uri, body.clone()),
            None => Message::parse(&request.uri),
        };

        if message.is_routable() {
            if message.is_broadcast() {
                if self.router.invoke_and_reply(&message) {
                    return;
                }
            } else {
                let pending: Arc<Mutex<Option<SchemeResponder>>> =
                    Arc::new(Mutex::new(Some(respond)));

                let callback = {
                    let pending = Arc::clone(&pending);
                    Arc::new(move |reply: Reply| {
                        if let Some(respond) = pending.lock().unwrap().take() {
                            respond(scheme_response(&reply));
                        }
                    })
                };

                if self.router.invoke(&message, callback) {
                    return;
                }

                // route miss; reclaim the responder for the 404 path
                let Some(respond) = pending.lock().unwrap().take() else {
                    return;
                };
                self.respond_not_found(&message, &request.uri, respond);
                return;
            }
        }

        self.respond_not_found(&message, &request.uri, respond);
    }

    /// Entry point for in-page postMessage-style calls. No response
    /// object exists; replies travel back as scripts.
    pub fn on_script_message(&self, source: &str) -> bool {
        let message = Message::parse(source);

        if message.is_routable() && self.router.invoke_and_reply(&message) {
            return true;
        }

        self.invoke_message_hook(source)
    }

    /// Settle a renderer-originated promise (seq carrying the `R`
    /// prefix convention) and always notify the application's message
    /// hook with the equivalent `ipc://resolve` URI.
    pub fn resolve_promise(&self, seq: &str, state: &str, value: &str) {
        if seq.starts_with('R') {
            let script = scripts::resolve_to_render_process(seq, state, value);
            self.eval(&script);
        }

        let uri = scripts::resolve_to_main_process_message(seq, state, value);
        self.invoke_message_hook(&uri);
    }

    /// Dispatch an unsolicited CustomEvent into this window's renderer.
    pub fn dispatch_event(&self, name: &str, data: &Value) -> bool {
        self.router.emit(name, data)
    }

    /// Evaluate a script in this window's renderer.
    pub fn eval(&self, script: &str) -> bool {
        self.router.evaluate_script(script)
    }

    pub fn navigate(&self, url: &str) {
        self.surface.navigate(url);
    }

    pub fn set_title(&self, title: &str) {
        self.surface.set_title(title);
    }

    /// Run the application exit hook with `code`.
    pub fn exit(&self, code: i32) {
        let hook = self.exit_hook.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(code);
        }
    }

    pub(crate) fn surface(&self) -> &Arc<dyn RendererSurface> {
        &self.surface
    }

    fn invoke_message_hook(&self, source: &str) -> bool {
        let hook = self.message_hook.lock().unwrap().clone();
        match hook {
            Some(hook) => hook(source),
            None => false,
        }
    }

    fn respond_not_found(&self, message: &Message, uri: &str, respond: SchemeResponder) {
        if self.invoke_message_hook(uri) {
            // the hook owns the message now, but the renderer's fetch
            // still has to settle; acknowledge with the seq it carried
            let seq = if message.seq.is_empty() {
                Value::Null
            } else {
                Value::String(message.seq.clone())
            };
            let body = json!({
                "source": message.name,
                "data": { "seq": seq },
            });

            respond(json_scheme_response(
                HttpStatusCode::OK,
                body.to_string().into_bytes(),
            ));
            return;
        }

        let body = json!({
            "source": message.name,
            "err": {
                "message": "Not found",
                "type": "NotFoundError",
                "url": uri,
            },
        });

        respond(json_scheme_response(
            HttpStatusCode::NOT_FOUND,
            body.to_string().into_bytes(),
        ));
    }
}

fn scheme_response(reply: &Reply) -> SchemeResponse {
    let status = if reply.has_err() {
        HttpStatusCode::INTERNAL_SERVER_ERROR
    } else {
        HttpStatusCode::OK
    };

    match &reply.payload {
        Some(payload) => {
            let mut headers = payload.headers.clone();
            headers.insert(
                "access-control-allow-origin".to_string(),
                "*".to_string(),
            );
            headers.insert(
                "content-type".to_string(),
                "application/octet-stream".to_string(),
            );
            headers.insert(
                "content-length".to_string(),
                payload.body.len().to_string(),
            );

            SchemeResponse {
                status,
                headers,
                body: payload.body.clone(),
            }
        }
        None => json_scheme_response(status, reply.json().to_string().into_bytes()),
    }
}

fn json_scheme_response(status: HttpStatusCode, body: Vec<u8>) -> SchemeResponse {
    let mut headers = BTreeMap::new();
    headers.insert(
        "access-control-allow-origin".to_string(),
        "*".to_string(),
    );
    headers.insert("content-type".to_string(), "application/json".to_string());
    headers.insert("content-length".to_string(), body.len().to_string());

    SchemeResponse {
        status,
        headers,
        body,
    }
}
