// Unit tests for the timer registry

use crate::event_loop::EventLoop;
use crate::event_loop::timers::{TimerRegistry, TimerSpec};
use crate::tests::wait_until;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn counting_registry(spec: TimerSpec) -> (EventLoop, TimerRegistry, Arc<AtomicUsize>) {
    let event_loop = EventLoop::new().expect("loop should build");
    let registry = TimerRegistry::new(event_loop.clone());
    let count = Arc::new(AtomicUsize::new(0));

    {
        let count = Arc::clone(&count);
        registry.add(spec, move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
    }

    (event_loop, registry, count)
}

/// **VALUE**: Verifies `add` alone arms nothing; a one-shot fires
/// exactly once after `start`.
///
/// **WHY THIS MATTERS**: Registration and arming are deliberately
/// separate so a batch can be declared before the loop exists.
///
/// **BUG THIS CATCHES**: `add` eagerly spawning the timer task, or a
/// one-shot firing repeatedly.
#[test]
fn given_one_shot_timer_when_started_then_fires_once() {
    let (event_loop, registry, count) =
        counting_registry(TimerSpec::once(Duration::from_millis(5)));

    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(count.load(Ordering::SeqCst), 0, "add must not arm");

    registry.start().expect("start should succeed");
    assert!(wait_until(|| count.load(Ordering::SeqCst) == 1));

    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    event_loop.stop();
}

/// **VALUE**: Verifies a repeating timer keeps firing until stopped.
#[test]
fn given_repeating_timer_when_started_then_fires_repeatedly() {
    let (event_loop, registry, count) =
        counting_registry(TimerSpec::repeating(Duration::from_millis(5)));

    registry.start().expect("start should succeed");
    assert!(wait_until(|| count.load(Ordering::SeqCst) >= 3));

    registry.stop();
    event_loop.stop();
}

/// **VALUE**: Verifies stop halts firing without forgetting the
/// registration, and a later start resumes the repeating timer.
///
/// **WHY THIS MATTERS**: This is the "again" semantics: a resumed timer
/// waits its repeat interval, it does not replay its initial delay or
/// vanish.
///
/// **BUG THIS CATCHES**: `stop` removing registrations, or `start`
/// skipping previously started timers entirely.
#[test]
fn given_stopped_repeating_timer_when_restarted_then_resumes() {
    let (event_loop, registry, count) =
        counting_registry(TimerSpec::repeating(Duration::from_millis(5)));

    registry.start().expect("start should succeed");
    assert!(wait_until(|| count.load(Ordering::SeqCst) >= 1));

    registry.stop();
    let frozen = count.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(30));
    let drift = count.load(Ordering::SeqCst) - frozen;
    assert!(drift <= 1, "stopped timer kept firing ({drift} extra)");

    let before_resume = count.load(Ordering::SeqCst);
    registry.start().expect("restart should succeed");
    assert!(wait_until(|| count.load(Ordering::SeqCst) > before_resume));

    registry.stop();
    event_loop.stop();
}

/// **VALUE**: Verifies a spent one-shot is not re-armed by a later
/// start, while registrations stay countable.
#[test]
fn given_spent_one_shot_when_restarted_then_not_rearmed() {
    let (event_loop, registry, count) =
        counting_registry(TimerSpec::once(Duration::from_millis(5)));

    registry.start().expect("start should succeed");
    assert!(wait_until(|| count.load(Ordering::SeqCst) == 1));

    registry.stop();
    registry.start().expect("restart should succeed");
    std::thread::sleep(Duration::from_millis(30));

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len(), 1);

    event_loop.stop();
}
