//! The peer-management contract consumed by router handlers.
//!
//! Socket and resolver mechanics live outside the core; handlers talk to
//! them through these traits and wrap their outcomes in the reply
//! envelope. The error taxonomy here is stable renderer-visible surface:
//! resource-state failures are expected, recoverable outcomes expressed
//! as named codes, never crashes.

pub mod routes;

pub use routes::bind_peer_routes;

use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerType {
    Udp,
    Dns,
}

/// Resource-state failures a peer operation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStateError {
    AlreadyBound,
    AlreadyConnected,
    NotConnected,
    Closed,
    Closing,
    NotRunning,
}

impl PeerStateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyBound => "ERR_SOCKET_ALREADY_BOUND",
            Self::AlreadyConnected => "ERR_SOCKET_DGRAM_IS_CONNECTED",
            Self::NotConnected => "ERR_SOCKET_DGRAM_NOT_CONNECTED",
            Self::Closed => "ERR_SOCKET_DGRAM_CLOSED",
            Self::Closing => "ERR_SOCKET_DGRAM_CLOSING",
            Self::NotRunning => "ERR_SOCKET_DGRAM_NOT_RUNNING",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::AlreadyBound => "Socket is already bound",
            Self::AlreadyConnected => "Already connected",
            Self::NotConnected => "Not connected",
            Self::Closed => "Socket is closed",
            Self::Closing => "Socket is closing",
            Self::NotRunning => "Not running",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotRunning => "NotFoundError",
            _ => "InternalError",
        }
    }
}

/// The `{source, err: {id, type, code, message}}` envelope for a
/// resource-state failure.
pub fn error_envelope(source: &str, id: u64, error: PeerStateError) -> Value {
    json!({
        "source": source,
        "err": {
            "id": id.to_string(),
            "type": error.kind(),
            "code": error.code(),
            "message": error.message(),
        },
    })
}

/// A native network endpoint (UDP socket or DNS resolution context)
/// referenced by an opaque integer id.
pub trait Peer: Send + Sync {
    fn id(&self) -> u64;
    fn peer_type(&self) -> PeerType;

    fn bind(&self, address: &str, port: u16) -> Result<Value, PeerStateError>;
    fn connect(&self, address: &str, port: u16) -> Result<Value, PeerStateError>;
    fn disconnect(&self) -> Result<Value, PeerStateError>;
    fn send(&self, bytes: &[u8], remote: Option<(&str, u16)>) -> Result<Value, PeerStateError>;
    fn recv_start(&self) -> Result<Value, PeerStateError>;
    fn recv_stop(&self) -> Result<Value, PeerStateError>;
    fn close(&self) -> Result<Value, PeerStateError>;
    fn lookup(&self, hostname: &str, family: i32) -> Result<Value, PeerStateError>;

    /// Snapshot of the peer's observable state, for `udp.getState`.
    fn state(&self) -> Value;

    fn is_bound(&self) -> bool;
    fn is_connected(&self) -> bool;
    fn is_closed(&self) -> bool;
    fn is_closing(&self) -> bool;
    fn is_active(&self) -> bool;
    fn is_ephemeral(&self) -> bool;
}

pub trait PeerManager: Send + Sync {
    fn create_peer(
        &self,
        peer_type: PeerType,
        id: u64,
        ephemeral: bool,
    ) -> std::sync::Arc<dyn Peer>;
    fn has_peer(&self, id: u64) -> bool;
    fn get_peer(&self, id: u64) -> Option<std::sync::Arc<dyn Peer>>;
}
