// Unit tests for shell-core modules
// Organized one file per module, mirroring src/ layout

mod data;
mod message;
mod timers;
mod window;

use std::time::{Duration, Instant};

/// Poll `condition` until it holds or two seconds elapse. Used wherever
/// a test observes work that completes on the event-loop thread.
pub(crate) fn wait_until<F>(condition: F) -> bool
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
