// Unit tests for windows and the window manager
// A recording surface stands in for the renderer

use crate::MAX_WINDOWS;
use crate::event_loop::EventLoop;
use crate::ipc::message::MessageBuffer;
use crate::ipc::reply::Reply;
use crate::tests::wait_until;
use crate::window::manager::{SurfaceFactory, WindowManager, WindowStatus};
use crate::window::{RendererSurface, SchemeRequest, SchemeResponse, Window, WindowOptions};

use common::HttpStatusCode;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

#[derive(Default)]
struct RecordingSurface {
    scripts: Mutex<Vec<String>>,
    closed: AtomicUsize,
    killed: AtomicUsize,
    shown: AtomicUsize,
    hidden: AtomicUsize,
}

impl RendererSurface for RecordingSurface {
    fn evaluate(&self, script: &str) {
        self.scripts.lock().unwrap().push(script.to_string());
    }
    fn show(&self) {
        self.shown.fetch_add(1, Ordering::SeqCst);
    }
    fn hide(&self) {
        self.hidden.fetch_add(1, Ordering::SeqCst);
    }
    fn navigate(&self, _url: &str) {}
    fn set_title(&self, _title: &str) {}
    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
    fn kill(&self) {
        self.killed.fetch_add(1, Ordering::SeqCst);
    }
}

fn test_window(index: i32) -> (EventLoop, Arc<Window>, Arc<RecordingSurface>) {
    let event_loop = EventLoop::new().expect("loop should build");
    let surface = Arc::new(RecordingSurface::default());
    let window = Arc::new(Window::new(
        index,
        WindowOptions {
            index,
            ..WindowOptions::default()
        },
        event_loop.clone(),
        Arc::clone(&surface) as Arc<dyn RendererSurface>,
    ));

    (event_loop, window, surface)
}

fn recording_factory(surfaces: Arc<Mutex<Vec<Arc<RecordingSurface>>>>) -> SurfaceFactory {
    Arc::new(move |_index, _options| {
        let surface = Arc::new(RecordingSurface::default());
        surfaces.lock().unwrap().push(Arc::clone(&surface));
        surface as Arc<dyn RendererSurface>
    })
}

fn capture_responder(
    slot: Arc<Mutex<Option<SchemeResponse>>>,
) -> Box<dyn FnOnce(SchemeResponse) + Send> {
    Box::new(move |response| {
        *slot.lock().unwrap() = Some(response);
    })
}

fn body_json(response: &SchemeResponse) -> Value {
    serde_json::from_slice(&response.body).expect("body should be JSON")
}

/// **VALUE**: Verifies a correlated scheme request completes with 200,
/// the JSON envelope body, and the mandatory headers.
///
/// **WHY THIS MATTERS**: This is the primary request transport; the
/// renderer's fetch wrapper hard-depends on the CORS header and the
/// envelope body shape.
#[test]
fn given_mapped_route_when_scheme_request_then_200_with_envelope() {
    let (event_loop, window, _surface) = test_window(0);

    window.router().map("hello", false, |message, _router, callback| {
        callback(Reply::data(&message, json!({"msg": "hi"})));
    });

    let captured = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: "ipc://hello?seq=3&index=0".to_string(),
            body: None,
        },
        capture_responder(Arc::clone(&captured)),
    );

    let captured = captured.lock().unwrap();
    let response = captured.as_ref().expect("responder should be called");
    assert_eq!(response.status, HttpStatusCode::OK);
    assert_eq!(
        response.headers.get("access-control-allow-origin").map(String::as_str),
        Some("*")
    );
    assert_eq!(
        response.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
    assert_eq!(
        response.headers.get("content-length").map(String::as_str),
        Some(response.body.len().to_string().as_str())
    );
    assert_eq!(
        body_json(response),
        json!({"source": "hello", "data": {"msg": "hi"}, "err": null})
    );

    event_loop.stop();
}

/// **VALUE**: Verifies an error envelope turns into a 500 response.
#[test]
fn given_handler_error_when_scheme_request_then_500() {
    let (event_loop, window, _surface) = test_window(0);

    window.router().map("boom", false, |message, _router, callback| {
        callback(Reply::err(&message, json!({"message": "boom"})));
    });

    let captured = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: "ipc://boom?seq=3".to_string(),
            body: None,
        },
        capture_responder(Arc::clone(&captured)),
    );

    let captured = captured.lock().unwrap();
    let response = captured.as_ref().expect("responder should be called");
    assert_eq!(response.status, HttpStatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_json(response)["err"]["message"] == json!("boom"));

    event_loop.stop();
}

/// **VALUE**: Verifies an unmapped route yields a structured 404 with a
/// `NotFoundError` body naming the URI.
///
/// **BUG THIS CATCHES**: The 404 path consuming the responder twice or
/// losing it to the callback closure after a route miss.
#[test]
fn given_unmapped_route_when_scheme_request_then_404_not_found() {
    let (event_loop, window, _surface) = test_window(0);

    let captured = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: "ipc://missing?seq=R1".to_string(),
            body: None,
        },
        capture_responder(Arc::clone(&captured)),
    );

    let captured = captured.lock().unwrap();
    let response = captured.as_ref().expect("responder should be called");
    assert_eq!(response.status, HttpStatusCode::NOT_FOUND);

    let body = body_json(response);
    assert_eq!(body["err"]["type"], json!("NotFoundError"));
    assert_eq!(body["err"]["message"], json!("Not found"));
    assert_eq!(body["err"]["url"], json!("ipc://missing?seq=R1"));

    event_loop.stop();
}

/// **VALUE**: Verifies a route miss claimed by the raw-message hook
/// still completes the scheme request: 200 acknowledging the message's
/// seq (null when it carried none).
///
/// **BUG THIS CATCHES**: Dropping the responder when the hook returns
/// `true`, leaving the renderer's fetch pending forever.
#[test]
fn given_hook_handled_miss_when_scheme_request_then_200_acknowledges_seq() {
    let (event_loop, window, _surface) = test_window(0);
    window.set_message_hook(|_source| true);

    let captured = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: "ipc://external?seq=R4".to_string(),
            body: None,
        },
        capture_responder(Arc::clone(&captured)),
    );

    {
        let captured = captured.lock().unwrap();
        let response = captured.as_ref().expect("responder should be called");
        assert_eq!(response.status, HttpStatusCode::OK);
        assert_eq!(
            body_json(response),
            json!({"source": "external", "data": {"seq": "R4"}})
        );
    }

    // no seq on the request acknowledges with null
    let captured = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: "ipc://external".to_string(),
            body: None,
        },
        capture_responder(Arc::clone(&captured)),
    );

    let captured = captured.lock().unwrap();
    let response = captured.as_ref().expect("responder should be called");
    assert_eq!(response.status, HttpStatusCode::OK);
    assert_eq!(body_json(response)["data"]["seq"], Value::Null);

    event_loop.stop();
}

/// **VALUE**: Verifies a fire-and-forget request gets no scheme response
/// and its reply travels as a script instead.
#[test]
fn given_broadcast_seq_when_scheme_request_then_script_delivery() {
    let (event_loop, window, surface) = test_window(0);

    window.router().map("notify", false, |message, _router, callback| {
        callback(Reply::data(&message, json!({"ok": true})));
    });

    let captured: Arc<Mutex<Option<SchemeResponse>>> = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: "ipc://notify?seq=-1".to_string(),
            body: None,
        },
        capture_responder(Arc::clone(&captured)),
    );

    assert!(captured.lock().unwrap().is_none(), "no response expected");
    // broadcast replies ride the data channel; evaluation is marshalled
    // onto the loop
    assert!(wait_until(|| {
        surface
            .scripts
            .lock()
            .unwrap()
            .iter()
            .any(|script| script.contains("ipc://data?id="))
    }));

    event_loop.stop();
}

/// **VALUE**: Verifies a request body is staged as the message buffer
/// for the handler.
#[test]
fn given_binary_body_when_scheme_request_then_handler_sees_buffer() {
    let (event_loop, window, _surface) = test_window(0);
    let observed = Arc::new(Mutex::new(None));

    {
        let observed = Arc::clone(&observed);
        window.router().map("udp.send", false, move |message, _router, callback| {
            *observed.lock().unwrap() =
                message.buffer.as_ref().map(|buffer| buffer.bytes.clone());
            callback(Reply::data(&message, json!(null)));
        });
    }

    let captured = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: "ipc://udp.send?seq=6".to_string(),
            body: Some(vec![4, 5, 6]),
        },
        capture_responder(Arc::clone(&captured)),
    );

    assert_eq!(observed.lock().unwrap().clone(), Some(vec![4, 5, 6]));

    event_loop.stop();
}

/// **VALUE**: Verifies the payload side channel end to end inside one
/// window: a reply parks bytes, the bootstrap script names the id, and
/// the scheme fetch for that id returns the bytes as an octet-stream.
///
/// **BUG THIS CATCHES**: The `data` route consulting a different
/// DataManager than the one replies park payloads in.
#[test]
fn given_parked_payload_when_data_fetched_then_bytes_served_once() {
    let (event_loop, window, _surface) = test_window(0);

    let script = window.router().data().create(
        "-1",
        "{}",
        crate::ipc::data::DataPayload::new(vec![10, 20, 30]),
    );
    let marker = "ipc://data?id=";
    let start = script.find(marker).expect("script should fetch") + marker.len();
    let id: String = script[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    let captured = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: format!("ipc://data?seq=8&id={id}"),
            body: None,
        },
        capture_responder(Arc::clone(&captured)),
    );

    {
        let captured = captured.lock().unwrap();
        let response = captured.as_ref().expect("responder should be called");
        assert_eq!(response.status, HttpStatusCode::OK);
        assert_eq!(response.body, vec![10, 20, 30]);
        assert_eq!(
            response.headers.get("content-type").map(String::as_str),
            Some("application/octet-stream")
        );
    }

    // consumed: the second fetch reports the miss
    let captured = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: format!("ipc://data?seq=9&id={id}"),
            body: None,
        },
        capture_responder(Arc::clone(&captured)),
    );

    let captured = captured.lock().unwrap();
    let response = captured.as_ref().expect("responder should be called");
    assert_eq!(response.status, HttpStatusCode::INTERNAL_SERVER_ERROR);

    event_loop.stop();
}

/// **VALUE**: Verifies script messages route like scheme requests but
/// fall back to the raw-message hook when unhandled.
#[test]
fn given_script_message_when_unmapped_then_hook_consulted() {
    let (event_loop, window, _surface) = test_window(0);
    let hooked = Arc::new(Mutex::new(Vec::new()));

    assert!(!window.on_script_message("ipc://missing?seq=1"));

    {
        let hooked = Arc::clone(&hooked);
        window.set_message_hook(move |source| {
            hooked.lock().unwrap().push(source.to_string());
            true
        });
    }

    assert!(window.on_script_message("ipc://missing?seq=1"));
    assert_eq!(hooked.lock().unwrap().as_slice(), ["ipc://missing?seq=1"]);

    window.router().map("hello", false, |message, _router, callback| {
        callback(Reply::data(&message, json!(null)));
    });
    assert!(window.on_script_message("ipc://hello?seq=2"));
    // mapped route handled; hook not consulted again
    assert_eq!(hooked.lock().unwrap().len(), 1);

    event_loop.stop();
}

/// **VALUE**: Verifies promise resolution evaluates the resolve script
/// for renderer-originated seqs and always notifies the message hook.
#[test]
fn given_renderer_seq_when_promise_resolved_then_script_and_hook() {
    let (event_loop, window, surface) = test_window(0);
    let hooked = Arc::new(Mutex::new(Vec::new()));

    {
        let hooked = Arc::clone(&hooked);
        window.set_message_hook(move |source| {
            hooked.lock().unwrap().push(source.to_string());
            true
        });
    }

    window.resolve_promise("R9", "0", "ok");
    assert!(wait_until(|| {
        surface
            .scripts
            .lock()
            .unwrap()
            .iter()
            .any(|script| script.contains("const seq = String('R9');"))
    }));

    // a native-originated seq skips the renderer script but still
    // notifies the hook
    window.resolve_promise("17", "0", "ok");

    let hooked = hooked.lock().unwrap();
    assert_eq!(
        hooked.as_slice(),
        [
            "ipc://resolve?seq=R9&state=0&value=ok",
            "ipc://resolve?seq=17&state=0&value=ok"
        ]
    );

    event_loop.stop();
}

/// **VALUE**: Verifies the preload publishes the window identity the
/// resolve convention depends on.
#[test]
fn given_window_when_built_then_preload_carries_index() {
    let (event_loop, window, _surface) = test_window(3);

    assert!(window.preload().contains("index: 3"));
    assert!(window.preload().contains("window.__args"));
    assert!(window.preload().contains("//# sourceURL=preload.js"));

    event_loop.stop();
}

/// **VALUE**: Verifies creation is idempotent per index and the show /
/// hide / close lifecycle walks the state machine.
///
/// **WHY THIS MATTERS**: Index slots are shared renderer-visible
/// identity; accidental re-creation would orphan the renderer's state.
#[test]
fn given_manager_when_lifecycle_driven_then_states_follow() {
    let event_loop = EventLoop::new().expect("loop should build");
    let surfaces = Arc::new(Mutex::new(Vec::new()));
    let manager = WindowManager::new(event_loop.clone(), recording_factory(Arc::clone(&surfaces)));

    let window = manager
        .create_window(WindowOptions::default())
        .expect("create should succeed");
    assert_eq!(manager.status(0), WindowStatus::Created);

    let again = manager
        .create_window(WindowOptions::default())
        .expect("create should succeed");
    assert!(Arc::ptr_eq(&window, &again), "create is idempotent per index");
    assert_eq!(surfaces.lock().unwrap().len(), 1);

    manager.show_window(0);
    assert_eq!(manager.status(0), WindowStatus::Shown);

    manager.hide_window(0);
    assert_eq!(manager.status(0), WindowStatus::Hidden);

    manager.show_window(0);
    assert_eq!(manager.status(0), WindowStatus::Shown);

    manager.close_window(0);
    assert_eq!(manager.status(0), WindowStatus::Closed);

    // post-closing visibility calls are no-ops
    manager.show_window(0);
    assert_eq!(manager.status(0), WindowStatus::Closed);

    event_loop.stop();
}

/// **VALUE**: Verifies out-of-range and negative indices are refused
/// with `None`, never a panic or partial slot.
#[test]
fn given_invalid_index_when_requested_then_refused() {
    let event_loop = EventLoop::new().expect("loop should build");
    let surfaces = Arc::new(Mutex::new(Vec::new()));
    let manager = WindowManager::new(event_loop.clone(), recording_factory(surfaces));

    assert!(manager.get_or_create_window(-1).is_none());
    assert!(manager.get_or_create_window(MAX_WINDOWS as i32).is_none());
    assert!(manager.get_or_create_window(0).is_some());

    assert!(
        manager
            .create_window(WindowOptions {
                index: MAX_WINDOWS as i32,
                ..WindowOptions::default()
            })
            .is_err()
    );

    event_loop.stop();
}

/// **VALUE**: Verifies destruction is total from any state: the surface
/// is closed and killed, staged buffers are evicted, and the slot frees
/// for reuse.
///
/// **BUG THIS CATCHES**: Teardown skipping the close half when called
/// on a shown window, or leaving the slot occupied by a killed window.
#[test]
fn given_shown_window_when_destroyed_then_teardown_total() {
    let event_loop = EventLoop::new().expect("loop should build");
    let surfaces = Arc::new(Mutex::new(Vec::new()));
    let manager = WindowManager::new(event_loop.clone(), recording_factory(Arc::clone(&surfaces)));

    let window = manager
        .create_window(WindowOptions::default())
        .expect("create should succeed");
    manager.show_window(0);

    window
        .router()
        .set_mapped_buffer(0, "9", MessageBuffer::new(vec![1]));

    manager.destroy_window(0);

    let surface = Arc::clone(&surfaces.lock().unwrap()[0]);
    assert_eq!(surface.closed.load(Ordering::SeqCst), 1);
    assert_eq!(surface.killed.load(Ordering::SeqCst), 1);
    assert!(!window.router().has_mapped_buffer(0, "9"));
    assert_eq!(manager.status(0), WindowStatus::None);
    assert!(manager.get_window(0).is_none());

    // slot is reusable after destruction
    assert!(manager.get_or_create_window(0).is_some());
    assert_eq!(surfaces.lock().unwrap().len(), 2);

    event_loop.stop();
}

/// **VALUE**: Verifies the exit hook runs with the window's exit code.
#[test]
fn given_exit_hook_when_window_exits_then_code_delivered() {
    let event_loop = EventLoop::new().expect("loop should build");
    let surfaces = Arc::new(Mutex::new(Vec::new()));
    let manager = WindowManager::new(event_loop.clone(), recording_factory(surfaces));

    let window = manager
        .create_window(WindowOptions::default())
        .expect("create should succeed");

    let codes = Arc::new(Mutex::new(Vec::new()));
    {
        let codes = Arc::clone(&codes);
        window.set_exit_hook(move |code| {
            codes.lock().unwrap().push(code);
        });
    }

    manager.exit_window(0, 7);
    assert_eq!(codes.lock().unwrap().as_slice(), [7]);
    assert_eq!(manager.status(0), WindowStatus::Exited);

    event_loop.stop();
}
