//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! net subsystems produce:
//!     → console.rs (user-facing lines and received text, stdout)
//!     → logging.rs (structured tracing events, stderr)
//! ```
//!
//! # Design Decisions
//! - Console output is injected, so tests assert on it per scenario
//! - Tracing is operator diagnostics and never part of the console contract

pub mod console;
pub mod logging;

pub use console::{Console, ConsoleEvent, MemoryConsole, StdConsole};
