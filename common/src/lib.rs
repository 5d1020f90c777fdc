//! Shared leaf types for the Skiff runtime.
//!
//! This crate contains small data types used by every layer of the
//! workspace. Nothing here has business logic - these are the vocabulary
//! types the other crates agree on.
//!
//! ## Architecture
//!
//! - **common** (this crate): shared vocabulary types
//! - **shell-core**: the runtime core (event loop, router, windows)
//! - **skiff**: the desktop application wiring everything together

pub mod error;
pub mod http_status;

pub use error::error_location::ErrorLocation;
pub use http_status::HttpStatusCode;
