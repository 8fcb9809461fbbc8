//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! port
//!     → resolver.rs (wildcard IPv4 bind address)
//!     → listener.rs (socket, SO_REUSEADDR, bind, listen backlog 1)
//!     → listener.rs (accept loop, one detached task per connection)
//!     → connection.rs (id + live-count guard)
//!     → handler.rs (read 1024-byte chunks, decode.rs, print)
//! ```
//!
//! # Design Decisions
//! - No shared state between connections except the console
//! - A connection's socket and guard move into its task together

pub mod connection;
pub mod decode;
pub mod handler;
pub mod listener;
pub mod resolver;

pub use listener::{AcceptError, Server, SetupError};
pub use resolver::{resolve, BindAddress};
