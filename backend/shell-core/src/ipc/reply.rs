//! The reply envelope.
//!
//! Every handler result materializes to `{"source": …, "data": …,
//! "err": …}` unless a raw JSON override was supplied, in which case the
//! override is emitted verbatim. A reply may also carry a binary payload
//! that travels through the data side channel instead of the JSON body.

use crate::ipc::data::DataPayload;
use crate::ipc::message::Message;

use serde_json::{Value, json};

#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub seq: String,
    pub source: String,
    pub data: Value,
    pub err: Value,
    pub payload: Option<DataPayload>,
    raw: Option<Value>,
}

impl Reply {
    /// Successful reply carrying `data`.
    pub fn data(message: &Message, data: Value) -> Self {
        Self {
            seq: message.seq.clone(),
            source: message.name.clone(),
            data,
            ..Self::default()
        }
    }

    /// Error reply carrying `err`.
    pub fn err(message: &Message, err: Value) -> Self {
        Self {
            seq: message.seq.clone(),
            source: message.name.clone(),
            err,
            ..Self::default()
        }
    }

    /// Successful reply with a binary payload for the side channel.
    pub fn with_payload(message: &Message, data: Value, payload: DataPayload) -> Self {
        Self {
            payload: Some(payload),
            ..Self::data(message, data)
        }
    }

    /// Reply whose JSON is emitted verbatim, bypassing the envelope.
    pub fn raw(message: &Message, raw: Value) -> Self {
        Self {
            seq: message.seq.clone(),
            source: message.name.clone(),
            raw: Some(raw),
            ..Self::default()
        }
    }

    /// True when the materialized JSON carries an `err` object.
    pub fn has_err(&self) -> bool {
        self.json()
            .get("err")
            .map(|err| !err.is_null())
            .unwrap_or(false)
    }

    /// Materialize the envelope, honoring a raw override.
    pub fn json(&self) -> Value {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }

        json!({
            "source": self.source,
            "data": self.data,
            "err": self.err,
        })
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.json())
    }
}
