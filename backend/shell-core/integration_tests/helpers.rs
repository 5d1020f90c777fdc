// Shared fixtures for the integration tests

use shell_core::event_loop::EventLoop;
use shell_core::window::manager::{SurfaceFactory, WindowManager};
use shell_core::window::{RendererSurface, SchemeResponse};

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A renderer surface that records every evaluated script.
#[derive(Default)]
pub struct RecordingSurface {
    pub scripts: Mutex<Vec<String>>,
}

impl RendererSurface for RecordingSurface {
    fn evaluate(&self, script: &str) {
        self.scripts.lock().unwrap().push(script.to_string());
    }
    fn show(&self) {}
    fn hide(&self) {}
    fn navigate(&self, _url: &str) {}
    fn set_title(&self, _title: &str) {}
    fn close(&self) {}
    fn kill(&self) {}
}

pub struct Shell {
    pub event_loop: EventLoop,
    pub windows: WindowManager,
    pub surfaces: Arc<Mutex<Vec<Arc<RecordingSurface>>>>,
}

/// Build a manager whose factory hands out recording surfaces.
pub fn shell() -> Shell {
    let event_loop = EventLoop::new().expect("loop should build");
    let surfaces: Arc<Mutex<Vec<Arc<RecordingSurface>>>> = Arc::new(Mutex::new(Vec::new()));

    let factory: SurfaceFactory = {
        let surfaces = Arc::clone(&surfaces);
        Arc::new(move |_index, _options| {
            let surface = Arc::new(RecordingSurface::default());
            surfaces.lock().unwrap().push(Arc::clone(&surface));
            surface as Arc<dyn RendererSurface>
        })
    };

    Shell {
        windows: WindowManager::new(event_loop.clone(), factory),
        event_loop,
        surfaces,
    }
}

pub fn capture_responder(
    slot: Arc<Mutex<Option<SchemeResponse>>>,
) -> Box<dyn FnOnce(SchemeResponse) + Send> {
    Box::new(move |response| {
        *slot.lock().unwrap() = Some(response);
    })
}

/// Poll `condition` until it holds or two seconds elapse.
pub fn wait_until<F>(condition: F) -> bool
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
