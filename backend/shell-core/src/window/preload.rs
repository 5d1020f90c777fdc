//! Preload script generation.
//!
//! The preload runs before any page content and publishes the window's
//! identity and configuration as `window.__args`. The renderer-side shim
//! reads `__args.index` to derive resolve event names, so the shape here
//! is a contract, not a convenience.

use crate::ipc::scripts::Script;
use crate::window::WindowOptions;

/// Build the preload for the window at `index`.
pub fn create_preload(index: i32, options: &WindowOptions) -> String {
    let config = options
        .config
        .iter()
        .map(|(key, value)| format!("  '{}': '{}',", escape(key), escape(value)))
        .collect::<Vec<_>>()
        .join("\n");

    let source = format!(
        "window.__args = {{\n\
         \x20 index: {index},\n\
         \x20 debug: {debug},\n\
         \x20 headless: {headless},\n\
         \x20 os: '{os}',\n\
         \x20 title: '{title}',\n\
         \x20 config: {{\n\
         {config}\n\
         \x20 }}\n\
         }};\n\
         \n\
         window._ipc = window._ipc ?? {{ nextSeq: 1 }};\n\
         Object.freeze(window.__args.config);",
        debug = cfg!(debug_assertions),
        headless = options.headless,
        os = std::env::consts::OS,
        title = escape(&options.title),
    );

    Script::new("preload.js", &source).str()
}

/// Escape a value for embedding in a single-quoted JS string literal.
fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
}
