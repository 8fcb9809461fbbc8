//! Minimal TCP print server library.

pub mod config;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use net::Server;
pub use observability::{Console, MemoryConsole, StdConsole};
