// Unit tests for the headless renderer surface

use crate::renderer::{HeadlessRenderer, headless_factory};

use shell_core::window::{RendererSurface, WindowOptions};

/// **VALUE**: Verifies evaluated scripts are recorded in order, which
/// is what makes headless runs observable at all.
#[test]
fn given_headless_surface_when_evaluated_then_scripts_recorded() {
    let surface = HeadlessRenderer::new(0);

    surface.evaluate("console.log(1)");
    surface.evaluate("console.log(2)");

    assert_eq!(surface.scripts(), ["console.log(1)", "console.log(2)"]);
}

/// **VALUE**: Verifies lifecycle calls are accepted without effect so
/// the window state machine can drive a headless surface unchanged.
#[test]
fn given_headless_surface_when_lifecycle_driven_then_no_panic() {
    let surface = HeadlessRenderer::new(1);

    surface.show();
    surface.hide();
    surface.navigate("https://example.com");
    surface.set_title("Demo");
    surface.close();
    surface.kill();

    assert!(surface.scripts().is_empty());
}

/// **VALUE**: Verifies the factory hands out a fresh surface per
/// window.
#[test]
fn given_factory_when_called_then_fresh_surface_each_time() {
    let factory = headless_factory();
    let options = WindowOptions::default();

    let first = factory(0, &options);
    let second = factory(1, &options);

    first.evaluate("a");
    second.evaluate("b");
    // distinct surfaces: no shared script log to cross-contaminate
    assert!(!std::ptr::addr_eq(
        std::sync::Arc::as_ptr(&first),
        std::sync::Arc::as_ptr(&second)
    ));
}
