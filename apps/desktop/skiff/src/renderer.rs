//! Headless renderer surface.
//!
//! Stands in for a real webview: scripts are recorded instead of
//! executed, lifecycle calls are logged. Useful for servers, tests, and
//! any target where the shell runs without chrome.

use shell_core::window::RendererSurface;
use shell_core::window::manager::SurfaceFactory;

use std::sync::{Arc, Mutex};

use log::debug;

#[derive(Default)]
pub struct HeadlessRenderer {
    index: i32,
    scripts: Mutex<Vec<String>>,
}

impl HeadlessRenderer {
    pub fn new(index: i32) -> Self {
        Self {
            index,
            scripts: Mutex::new(Vec::new()),
        }
    }

    /// Scripts evaluated so far, oldest first.
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

impl RendererSurface for HeadlessRenderer {
    fn evaluate(&self, script: &str) {
        debug!("Window#{} evaluate ({} bytes)", self.index, script.len());
        self.scripts.lock().unwrap().push(script.to_string());
    }

    fn show(&self) {
        debug!("Window#{} show (headless)", self.index);
    }

    fn hide(&self) {
        debug!("Window#{} hide (headless)", self.index);
    }

    fn navigate(&self, url: &str) {
        debug!("Window#{} navigate to {url}", self.index);
    }

    fn set_title(&self, title: &str) {
        debug!("Window#{} title: {title:?}", self.index);
    }

    fn close(&self) {
        debug!("Window#{} close (headless)", self.index);
    }

    fn kill(&self) {
        debug!("Window#{} kill (headless)", self.index);
    }
}

/// Factory handing every window a headless surface.
pub fn headless_factory() -> SurfaceFactory {
    Arc::new(|index, _options| Arc::new(HeadlessRenderer::new(index)))
}
