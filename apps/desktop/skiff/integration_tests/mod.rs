// Integration tests for the skiff application crate
// Wires config, headless renderer, and shell-core together the way
// main.rs does

use skiff::config::ShellConfig;
use skiff::renderer::{HeadlessRenderer, headless_factory};
use skiff::supervisor::Supervisor;

use shell_core::event_loop::EventLoop;
use shell_core::ipc::reply::Reply;
use shell_core::window::{
    SchemeRequest, SchemeResponse, Window, WindowManager, WindowStatus,
};

use common::HttpStatusCode;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;

fn wait_until<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(2);

    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    condition()
}

/// **VALUE**: Verifies the app-level wiring main.rs performs: config
/// defaults drive window creation, the window routes a request, and the
/// lifecycle walks show → destroy.
///
/// **WHY THIS MATTERS**: Unit tests prove each crate alone; this proves
/// the application crate composes them the way the binary does, without
/// needing a real renderer.
#[test]
fn given_headless_shell_when_request_routed_then_full_flow_works() {
    let config = ShellConfig::default();
    let event_loop = EventLoop::new().expect("loop should build");
    let windows = WindowManager::new(event_loop.clone(), headless_factory());

    let window = windows
        .create_window(config.window_options(0))
        .expect("create should succeed");
    windows.show_window(0);
    assert_eq!(windows.status(0), WindowStatus::Shown);

    window
        .router()
        .map("app.version", false, |message, _router, callback| {
            callback(Reply::data(&message, json!({"version": "0.1.0"})));
        });

    let captured: Arc<Mutex<Option<SchemeResponse>>> = Arc::new(Mutex::new(None));
    {
        let captured = Arc::clone(&captured);
        window.on_scheme_request(
            SchemeRequest {
                uri: "ipc://app.version?seq=1&index=0".to_string(),
                body: None,
            },
            Box::new(move |response| {
                *captured.lock().unwrap() = Some(response);
            }),
        );
    }

    let response = captured.lock().unwrap().take().expect("responder called");
    assert_eq!(response.status, HttpStatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_slice(&response.body).expect("body should be JSON");
    assert_eq!(body["data"]["version"], json!("0.1.0"));

    windows.destroy();
    assert_eq!(windows.status(0), WindowStatus::None);

    event_loop.stop();
}

/// **VALUE**: Verifies reply scripts produced by broadcast calls reach
/// the headless renderer through the event loop.
#[test]
fn given_headless_renderer_when_broadcast_routed_then_script_recorded() {
    let event_loop = EventLoop::new().expect("loop should build");
    let surface = Arc::new(HeadlessRenderer::new(0));

    let window = Window::new(
        0,
        ShellConfig::default().window_options(0),
        event_loop.clone(),
        Arc::clone(&surface) as Arc<dyn shell_core::window::RendererSurface>,
    );

    window
        .router()
        .map("log", false, |message, _router, callback| {
            callback(Reply::data(&message, json!({"ok": true})));
        });

    assert!(window.on_script_message("ipc://log?seq=-1&value=hi"));

    assert!(wait_until(|| {
        surface
            .scripts()
            .iter()
            .any(|script| script.contains("ipc://data?id="))
    }));

    event_loop.stop();
}

/// **VALUE**: Verifies the supervisor ends the same wait the binary's
/// main thread parks on.
#[test]
fn given_running_shell_when_supervisor_exits_then_main_wait_ends() {
    let event_loop = EventLoop::new().expect("loop should build");
    let supervisor = Supervisor::new(event_loop.clone());

    let (exit_tx, exit_rx) = std::sync::mpsc::channel();
    supervisor.set_exit_callback(move |code| {
        let _ = exit_tx.send(code);
    });

    supervisor.exit(3);

    let code = exit_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("exit code should arrive");
    assert_eq!(code, 3);

    event_loop.stop();
}
