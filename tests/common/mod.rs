//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tcp_print_server::net::connection::ConnectionTracker;
use tcp_print_server::{MemoryConsole, Server, ServerConfig};
use tokio::task::JoinHandle;

/// A server running in the background on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub console: MemoryConsole,
    pub tracker: ConnectionTracker,
    task: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start a server on port 0 that records its console output in memory.
pub async fn start_server() -> TestServer {
    let console = MemoryConsole::new();
    let server = Server::bind(&ServerConfig::with_port(0), Arc::new(console.clone()))
        .await
        .expect("server should bind");
    let port = server.local_addr().unwrap().port();
    let tracker = server.tracker();
    let task = tokio::spawn(server.run());

    TestServer {
        addr: SocketAddr::from(([127, 0, 0, 1], port)),
        console,
        tracker,
        task,
    }
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Find a port nobody is listening on right now.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
