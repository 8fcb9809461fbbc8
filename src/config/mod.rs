//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional port argument
//!     → validation.rs (parse_port)
//!     → schema.rs (ServerConfig with defaults)
//!     → validation.rs (semantic checks)
//!     → net::Server::bind
//! ```
//!
//! # Design Decisions
//! - Config is immutable once built
//! - Every field has a default; only the port is exposed on the command line

pub mod schema;
pub mod validation;

pub use schema::ServerConfig;
pub use validation::{parse_port, validate_config, ConfigError, ValidationError};
