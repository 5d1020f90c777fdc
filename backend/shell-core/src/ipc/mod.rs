//! The `ipc://` bridge: message codec, reply envelope, router, and the
//! renderer-side script builders.
//!
//! Control flow through this module: renderer → URI string →
//! [`message::Message`] → [`router::Router`] (route lookup, optional
//! event-loop dispatch) → native handler → [`reply::Reply`] → delivery
//! (script evaluation or scheme response, decided by the owning window).

pub mod codec;
pub mod data;
pub mod message;
pub mod reply;
pub mod router;
pub mod scripts;

pub use data::{DataManager, DataPayload};
pub use message::{Message, MessageBuffer};
pub use reply::Reply;
pub use router::{ResultCallback, RouteHandler, Router};
