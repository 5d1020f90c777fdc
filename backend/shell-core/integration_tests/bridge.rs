// End-to-end bridge flows: scheme request in, envelope or script out

use crate::helpers::{capture_responder, shell, wait_until};

use common::HttpStatusCode;
use shell_core::ipc::message::Message;
use shell_core::ipc::reply::Reply;
use shell_core::window::{SchemeRequest, WindowOptions, WindowStatus};

use std::sync::{Arc, Mutex};

use serde_json::json;

/// **VALUE**: Verifies the complete correlated round trip: renderer URI
/// in, route handler on the live router, 200 envelope out.
///
/// **WHY THIS MATTERS**: This is the product's one essential flow. Unit
/// tests cover each piece; this proves the pieces are actually wired to
/// each other through the public API.
///
/// **BUG THIS CATCHES**: A window whose router is not the one its
/// scheme entry point consults, or an envelope reshaped between handler
/// and response.
#[test]
fn given_live_window_when_scheme_request_routed_then_envelope_response() {
    let shell = shell();
    let window = shell
        .windows
        .create_window(WindowOptions::default())
        .expect("create should succeed");

    window
        .router()
        .map("os.platform", false, |message, _router, callback| {
            callback(Reply::data(&message, json!({"platform": "test"})));
        });

    let captured = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: "ipc://os.platform?seq=1&index=0".to_string(),
            body: None,
        },
        capture_responder(Arc::clone(&captured)),
    );

    let captured = captured.lock().unwrap();
    let response = captured.as_ref().expect("responder should be called");
    assert_eq!(response.status, HttpStatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_slice(&response.body).expect("body should be JSON");
    assert_eq!(
        body,
        json!({"source": "os.platform", "data": {"platform": "test"}, "err": null})
    );

    shell.event_loop.stop();
}

/// **VALUE**: Verifies an async route defers to the event loop and the
/// scheme response still completes with the handler's reply.
#[test]
fn given_async_route_when_scheme_request_then_response_arrives_later() {
    let shell = shell();
    let window = shell
        .windows
        .create_window(WindowOptions::default())
        .expect("create should succeed");

    window
        .router()
        .map("fs.read", true, |message, _router, callback| {
            callback(Reply::data(&message, json!({"bytes": 0})));
        });

    let captured = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: "ipc://fs.read?seq=2&index=0".to_string(),
            body: None,
        },
        capture_responder(Arc::clone(&captured)),
    );

    assert!(wait_until(|| captured.lock().unwrap().is_some()));
    let captured = captured.lock().unwrap();
    assert_eq!(
        captured.as_ref().map(|response| response.status),
        Some(HttpStatusCode::OK)
    );

    shell.event_loop.stop();
}

/// **VALUE**: Verifies a fire-and-forget call leaves the scheme layer
/// silent and delivers its reply as a script on the window's surface.
#[test]
fn given_broadcast_call_when_routed_then_reply_script_reaches_surface() {
    let shell = shell();
    let window = shell
        .windows
        .create_window(WindowOptions::default())
        .expect("create should succeed");

    window
        .router()
        .map("log", false, |message, _router, callback| {
            callback(Reply::data(&message, json!({"logged": true})));
        });

    let captured = Arc::new(Mutex::new(None));
    window.on_scheme_request(
        SchemeRequest {
            uri: "ipc://log?seq=-1&value=hello".to_string(),
            body: None,
        },
        capture_responder(Arc::clone(&captured)),
    );

    assert!(captured.lock().unwrap().is_none());

    let surfaces = shell.surfaces.lock().unwrap();
    let surface = Arc::clone(&surfaces[0]);
    drop(surfaces);

    assert!(wait_until(|| {
        surface
            .scripts
            .lock()
            .unwrap()
            .iter()
            .any(|script| script.contains("ipc://data?id="))
    }));

    shell.event_loop.stop();
}

/// **VALUE**: Verifies the 404 contract for unmapped routes through the
/// full stack, matching the renderer shim's NotFoundError handling.
#[test]
fn given_unmapped_route_when_scheme_request_then_structured_404() {
    let shell = shell();
    let window = shell
        .windows
        .create_window(WindowOptions::default())
        .expect("create should succeed");

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

    let body: serde_json::Value =
        serde_json::from_slice(&response.body).expect("body should be JSON");
    assert_eq!(body["err"]["type"], json!("NotFoundError"));

    shell.event_loop.stop();
}

/// **VALUE**: Verifies the codec/state-machine interplay the renderer
/// relies on across a window's whole life: parse, route, show/hide,
/// destroy, slot reuse.
#[test]
fn given_window_lifecycle_when_driven_end_to_end_then_consistent() {
    let shell = shell();
    let window = shell
        .windows
        .create_window(WindowOptions {
            title: "main".to_string(),
            ..WindowOptions::default()
        })
        .expect("create should succeed");

    // messages addressed to this window resolve their index
    let message = Message::parse("ipc://window.show?index=0&seq=4");
    assert_eq!(message.index, window.index());

    shell.windows.show_window(0);
    assert_eq!(shell.windows.status(0), WindowStatus::Shown);

    shell.windows.hide_window(0);
    assert_eq!(shell.windows.status(0), WindowStatus::Hidden);

    shell.windows.destroy_window(0);
    assert_eq!(shell.windows.status(0), WindowStatus::None);
    assert!(shell.windows.get_window(0).is_none());

    // the slot is immediately reusable
    assert!(shell.windows.get_or_create_window(0).is_some());

    shell.event_loop.stop();
}
