//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! relay.toml
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → NetworkProfile / SessionSettings / RetryPolicy for the subsystems
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - The private key is read from the environment only

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ObservabilityConfig, RelayConfig, ServerConfig};
