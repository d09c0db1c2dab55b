//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request id, trace span, timeout)
//!     → handlers.rs (decode body, call dispatch / pipeline)
//!     → JSON envelope back to the client
//! ```

pub mod handlers;
pub mod server;

pub use server::{AppState, RelayServer};
