//! Binary payload side channel.
//!
//! Replies that carry bytes too large or too binary for a script literal
//! park them here under a numeric id; the renderer fetches
//! `ipc://data?id=<id>` over the scheme layer and receives a `data`
//! CustomEvent once the bytes arrive. Entries expire after a fixed TTL so
//! a payload whose bootstrap script never ran cannot accumulate forever.

use crate::ipc::scripts::Script;

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

/// How long an unclaimed payload stays resident.
const PAYLOAD_TTL: Duration = Duration::from_millis(32 * 1024);

#[derive(Debug, Clone, Default)]
pub struct DataPayload {
    pub id: u64,
    pub body: Vec<u8>,
    pub headers: BTreeMap<String, String>,
}

impl DataPayload {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    /// Headers as `key: value` lines, the shape the bootstrap script
    /// splits on.
    fn headers_str(&self) -> String {
        self.headers
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

struct Entry {
    payload: DataPayload,
    expires_at: Instant,
}

/// Owns pending payloads. Cloneable handle over shared state.
#[derive(Clone, Default)]
pub struct DataManager {
    entries: Arc<Mutex<HashMap<u64, Entry>>>,
}

impl DataManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: u64) -> bool {
        self.entries.lock().unwrap().contains_key(&id)
    }

    pub fn get(&self, id: u64) -> Option<DataPayload> {
        self.entries
            .lock()
            .unwrap()
            .get(&id)
            .map(|entry| entry.payload.clone())
    }

    pub fn remove(&self, id: u64) -> Option<DataPayload> {
        self.entries
            .lock()
            .unwrap()
            .remove(&id)
            .map(|entry| entry.payload)
    }

    /// Drop every payload whose TTL elapsed.
    pub fn expire(&self) {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap()
            .retain(|_, entry| entry.expires_at > now);
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Store `payload` and return the bootstrap script that fetches it
    /// from the renderer side and dispatches a `data` CustomEvent with
    /// `{data, sid, headers, params}`.
    pub fn create(&self, seq: &str, params: &str, mut payload: DataPayload) -> String {
        if payload.id == 0 {
            payload.id = Uuid::new_v4().as_u64_pair().0;
        }

        let sid = payload.id.to_string();
        let headers = payload.headers_str();

        let source = format!(
            "const xhr = new XMLHttpRequest();\n\
             xhr.responseType = 'arraybuffer';\n\
             xhr.onload = e => {{\n\
             \x20 let params = `{params}`;\n\
             \x20 params.seq = `{seq}`;\n\
             \n\
             \x20 try {{\n\
             \x20   params = JSON.parse(params);\n\
             \x20 }} catch (err) {{\n\
             \x20   console.error(err.stack || err, params);\n\
             \x20 }};\n\
             \n\
             \x20 const headers = `{headers}`\n\
             \x20   .trim()\n\
             \x20   .split(/[\\r\\n]+/)\n\
             \x20   .filter(Boolean);\n\
             \n\
             \x20 const detail = {{\n\
             \x20   data: xhr.response,\n\
             \x20   sid: '{sid}',\n\
             \x20   headers: Object.fromEntries(\n\
             \x20     headers.map(l => l.split(/\\s*:\\s*/))\n\
             \x20   ),\n\
             \x20   params: params\n\
             \x20 }};\n\
             \n\
             \x20 queueMicrotask(() => {{\n\
             \x20   const event = new window.CustomEvent('data', {{ detail }});\n\
             \x20   window.dispatchEvent(event);\n\
             \x20 }});\n\
             }};\n\
             \n\
             xhr.open('GET', 'ipc://data?id={sid}');\n\
             xhr.send();"
        );

        let entry = Entry {
            payload,
            expires_at: Instant::now() + PAYLOAD_TTL,
        };
        let id = entry.payload.id;
        self.entries.lock().unwrap().insert(id, entry);

        Script::new("data.js", &source).str()
    }
}
