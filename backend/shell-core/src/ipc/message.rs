//! The `ipc://` request message.
//!
//! A message is parsed from a URI of the fixed form
//! `ipc://<name>?<key>=<value>&...`. Parsing never fails: malformed input
//! (missing scheme, empty path, empty query) yields an unroutable message
//! with an empty `name`, which callers must treat as a distinct condition
//! rather than assuming every URI parses into something usable.

use crate::IPC_SCHEME_PREFIX;
use crate::ipc::codec::{decode_uri_component, encode_uri_component};

use std::collections::BTreeMap;

use log::warn;

/// Correlation token value meaning "no reply expected".
pub const SEQ_BROADCAST: &str = "-1";

/// Binary payload attached to a message through the side channel.
///
/// Owned bytes; dropping the buffer frees it exactly once. There is no
/// borrowed view variant - a buffer staged in the router's pending map is
/// moved into the message that consumes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBuffer {
    pub bytes: Vec<u8>,
}

impl MessageBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// A decoded bridge request.
///
/// `seq` is the caller-assigned correlation token ([`SEQ_BROADCAST`]
/// means fire-and-forget), `index` identifies the owning window, and
/// `value` is the free-form payload argument. All three are eagerly
/// percent-decoded into their fields while also being retained raw in
/// `args`.
#[derive(Debug, Clone)]
pub struct Message {
    pub name: String,
    pub seq: String,
    pub index: i32,
    pub value: String,
    pub uri: String,
    pub args: BTreeMap<String, String>,
    pub buffer: Option<MessageBuffer>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            name: String::new(),
            seq: String::new(),
            index: -1,
            value: String::new(),
            uri: String::new(),
            args: BTreeMap::new(),
            buffer: None,
        }
    }
}

impl Message {
    /// Parse a message from its URI form.
    ///
    /// Tolerant by design: a missing `ipc://` prefix or an empty
    /// path/query produces an unroutable message (empty `name`) instead
    /// of an error. A non-integer `index` argument logs a warning and
    /// leaves the field at its default; it never aborts parsing.
    pub fn parse(source: &str) -> Self {
        let mut message = Message {
            uri: source.to_string(),
            ..Message::default()
        };

        let Some(rest) = source.strip_prefix(IPC_SCHEME_PREFIX) else {
            return message;
        };

        // bail if malformed
        if rest.is_empty() || rest == "?" {
            return message;
        }

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        message.name = path
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();

        let Some(query) = query else {
            return message;
        };

        for raw_pair in query.split('&') {
            let Some((key, value)) = raw_pair.split_once('=') else {
                continue;
            };

            match key {
                "index" => {
                    let digits = if value.is_empty() { "0" } else { value };
                    match digits.parse::<i32>() {
                        Ok(index) => message.index = index,
                        Err(_) => {
                            // the pair is dropped entirely, not kept raw
                            warn!("received non-integer index: {value:?}");
                            continue;
                        }
                    }
                }
                "value" => message.value = decode_uri_component(value),
                "seq" => message.seq = decode_uri_component(value),
                _ => {}
            }

            message.args.insert(key.to_string(), value.to_string());
        }

        message
    }

    /// Parse a message and attach a binary buffer in one step.
    pub fn parse_with_buffer(source: &str, bytes: Vec<u8>) -> Self {
        let mut message = Self::parse(source);
        message.buffer = Some(MessageBuffer::new(bytes));
        message
    }

    /// True when the message can be routed.
    pub fn is_routable(&self) -> bool {
        !self.name.is_empty()
    }

    /// True when no reply is expected.
    pub fn is_broadcast(&self) -> bool {
        self.seq == SEQ_BROADCAST
    }

    pub fn has(&self, key: &str) -> bool {
        self.args.contains_key(key)
    }

    /// Argument by name, percent-decoded on read. Empty string when
    /// absent.
    pub fn get(&self, key: &str) -> String {
        self.get_or(key, "")
    }

    pub fn get_or(&self, key: &str, fallback: &str) -> String {
        self.args
            .get(key)
            .map(|value| decode_uri_component(value))
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.args.insert(key.to_string(), value.to_string());
    }

    /// Serialize back to URI form, percent-encoding every argument.
    ///
    /// Argument order follows the map, not the original input; consumers
    /// must only rely on set-equality of decoded pairs across a round
    /// trip.
    pub fn to_uri(&self) -> String {
        let query = self
            .args
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    encode_uri_component(key),
                    encode_uri_component(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");

        format!("{IPC_SCHEME_PREFIX}{}?{query}", self.name)
    }
}
