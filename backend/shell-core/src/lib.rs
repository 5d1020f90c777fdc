//! Native runtime core for the Skiff hybrid application shell.
//!
//! Three pieces make the shell work under concurrency:
//!
//! - [`event_loop`]: a single cooperative loop that serializes all native
//!   work and accepts work items from arbitrary threads.
//! - [`ipc`]: the `ipc://` message codec, the reply envelope, and the
//!   router that dispatches renderer requests to registered native
//!   handlers and correlates replies back to the originating call.
//! - [`window`]: the per-window lifecycle state machine that owns a
//!   router instance and turns its results into either a scheme-level
//!   response or a script evaluated inside the renderer.
//!
//! Everything platform-specific (the renderer surface itself, peer
//! sockets) sits behind traits; this crate depends only on the contracts.

pub mod error;
pub mod event_loop;
pub mod ipc;
pub mod peer;
pub mod window;

#[cfg(test)]
mod tests;

/// URI scheme the renderer uses for bridge requests.
pub const IPC_SCHEME: &str = "ipc";
pub const IPC_SCHEME_PREFIX: &str = const_format::concatcp!(IPC_SCHEME, "://");

/// Upper bound on concurrently managed windows. Window indices are dense
/// small integers used both for slot storage and renderer-side
/// correlation, so the table is fixed-capacity.
pub const MAX_WINDOWS: usize = 32;
