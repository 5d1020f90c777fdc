//! Renderer-injected script builders.
//!
//! Three canonical forms cross the bridge: "emit" (CustomEvent dispatch
//! on a target), "resolve" (settle a pending promise identified by
//! `seq` and the window-index-derived event name), and "menu-selection"
//! (settle a menu promise or fall back to an event). The event-name
//! derivation and detail shapes here are contracts any renderer-side
//! shim depends on bit-exactly.

/// A named script. `str()` wraps the source in an IIFE and appends a
/// `sourceURL` marker so renderer devtools attribute it.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub name: String,
    pub source: String,
}

impl Script {
    pub fn new(name: &str, source: &str) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
        }
    }

    pub fn anonymous(source: &str) -> Self {
        Self {
            name: String::new(),
            source: source.to_string(),
        }
    }

    pub fn str(&self) -> String {
        let mut script = format!(";(() => {{\n{}\n}})();", self.source.trim());

        if !self.name.is_empty() {
            script.push_str(&format!("\n//# sourceURL={}\n", self.name));
        }

        script
    }
}

/// Unsolicited native→renderer event dispatch. `value` is expected to be
/// percent-encoded; the script decodes and JSON-parses it into the event
/// detail.
pub fn emit_to_render_process(event: &str, value: &str, target: &str, options: &str) -> String {
    Script::new(
        "emit-to-render-process.js",
        &format!(
            "const name = decodeURIComponent(`{event}`);\n\
             const value = `{value}`;\n\
             const target = {target};\n\
             const options = {options};\n\
             let detail = value;\n\
             \n\
             if (typeof value === 'string') {{\n\
             \x20 try {{\n\
             \x20   detail = decodeURIComponent(value);\n\
             \x20   detail = JSON.parse(detail);\n\
             \x20 }} catch (err) {{\n\
             \x20   if (!detail) {{\n\
             \x20     console.error(`${{err.message}} (${{value}})`);\n\
             \x20     return;\n\
             \x20   }}\n\
             \x20 }}\n\
             }}\n\
             \n\
             const event = new window.CustomEvent(name, {{ detail, ...options }});\n\
             target.dispatchEvent(event);"
        ),
    )
    .str()
}

pub fn emit_to_render_process_default(event: &str, value: &str) -> String {
    emit_to_render_process(event, value, "window", "{}")
}

/// Settle the renderer-side promise for `seq`. The event name is derived
/// in-page as `resolve-${window.__args.index}-${seq}`; the detail is
/// normalized to `{data}` or `{err}`.
pub fn resolve_to_render_process(seq: &str, state: &str, value: &str) -> String {
    Script::new(
        "resolve-to-render-process.js",
        &format!(
            "const seq = String('{seq}');\n\
             const value = '{value}';\n\
             const index = window.__args.index;\n\
             const state = Number('{state}');\n\
             const eventName = `resolve-${{index}}-${{seq}}`;\n\
             let detail = value;\n\
             \n\
             if (typeof value === 'string') {{\n\
             \x20 try {{\n\
             \x20   detail = decodeURIComponent(value);\n\
             \x20   detail = JSON.parse(detail);\n\
             \x20 }} catch (err) {{\n\
             \x20   if (!detail) {{\n\
             \x20     console.error(`${{err.message}} (${{value}})`);\n\
             \x20     return;\n\
             \x20   }}\n\
             \x20 }}\n\
             }}\n\
             \n\
             if (detail?.err) {{\n\
             \x20 let err = detail?.err ?? detail;\n\
             \x20 if (typeof err === 'string') {{\n\
             \x20   err = new Error(err);\n\
             \x20 }}\n\
             \n\
             \x20 detail = {{ err }};\n\
             }} else if (detail?.data) {{\n\
             \x20 detail = {{ ...detail }}\n\
             }} else {{\n\
             \x20 detail = {{ data: detail }}\n\
             }}\n\
             \n\
             const event = new CustomEvent(eventName, {{ detail }});\n\
             window.dispatchEvent(event);"
        ),
    )
    .str()
}

/// Settle a pending menu promise, falling back to a `menuItemSelected`
/// CustomEvent when no promise is registered for `seq`.
pub fn resolve_menu_selection(seq: &str, title: &str, parent: &str) -> String {
    Script::new(
        "resolve-menu-selection.js",
        &format!(
            "const detail = {{\n\
             \x20 title: decodeURIComponent(`{title}`),\n\
             \x20 parent: decodeURIComponent(`{parent}`),\n\
             \x20 state: '0'\n\
             }};\n\
             \n\
             if ({seq} > 0 && window._ipc['R{seq}']) {{\n\
             \x20 window._ipc['R{seq}'].resolve(detail);\n\
             \x20 delete window._ipc['R{seq}'];\n\
             \x20 return;\n\
             }}\n\
             \n\
             const event = new window.CustomEvent('menuItemSelected', {{\n\
             \x20 detail\n\
             }});\n\
             \n\
             window.dispatchEvent(event);"
        ),
    )
    .str()
}

/// The `ipc://resolve` URI forwarded to the embedding application's
/// message handler whenever a promise is resolved.
pub fn resolve_to_main_process_message(seq: &str, state: &str, value: &str) -> String {
    format!("ipc://resolve?seq={seq}&state={state}&value={value}")
}
