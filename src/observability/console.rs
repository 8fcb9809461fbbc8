//! User-facing console output.
//!
//! Everything the server "prints" goes through a [`Console`] handed to each
//! component, never through `println!`. Production wires [`StdConsole`];
//! tests capture per-scenario output with [`MemoryConsole`].
//!
//! Each call is one atomic write: the stdout lock is held for the whole
//! message, so concurrent handlers never interleave within a chunk.

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Output capability shared by all connection handlers.
pub trait Console: Send + Sync + 'static {
    /// A status line (startup, accepted peer, terminated connection).
    fn status(&self, line: &str);

    /// Text received from a client, written verbatim.
    fn chunk(&self, text: &str);

    /// A fatal diagnostic, written to the error stream.
    fn diagnostic(&self, line: &str);
}

/// Console backed by the process's stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl Console for StdConsole {
    fn status(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }

    fn chunk(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn diagnostic(&self, line: &str) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{line}");
    }
}

/// One recorded console call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Status(String),
    Chunk(String),
    Diagnostic(String),
}

/// In-memory console for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryConsole {
    events: Arc<Mutex<Vec<ConsoleEvent>>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in call order.
    pub fn events(&self) -> Vec<ConsoleEvent> {
        self.lock().clone()
    }

    /// Status lines only.
    pub fn status_lines(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ConsoleEvent::Status(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    /// Concatenation of all received chunks.
    pub fn chunks(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ConsoleEvent::Chunk(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ConsoleEvent>> {
        // A panicking writer cannot leave the Vec half-pushed.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, event: ConsoleEvent) {
        self.lock().push(event);
    }
}

impl Console for MemoryConsole {
    fn status(&self, line: &str) {
        self.push(ConsoleEvent::Status(line.to_string()));
    }

    fn chunk(&self, text: &str) {
        self.push(ConsoleEvent::Chunk(text.to_string()));
    }

    fn diagnostic(&self, line: &str) {
        self.push(ConsoleEvent::Diagnostic(line.to_string()));
    }
}
