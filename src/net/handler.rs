//! Per-connection read loop.
//!
//! # Responsibilities
//! - Read fixed-size chunks until the peer closes
//! - Decode each chunk as UTF-8 and print it verbatim
//! - Announce termination, then close the socket exactly once
//!
//! # Design Decisions
//! - Nothing is ever written back to the client
//! - Read and decode failures end this connection only

use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::net::connection::ConnectionGuard;
use crate::net::decode::{DecodeError, TextDecoder};
use crate::observability::Console;

/// Why a connection's read loop stopped early.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("undecodable payload: {0}")]
    Decode(#[from] DecodeError),
}

/// Serves one accepted connection.
///
/// Owns the stream and the tracker guard; both are released when
/// [`serve`](Self::serve) returns or the task unwinds.
pub struct ConnectionHandler<S> {
    stream: S,
    guard: ConnectionGuard,
    console: Arc<dyn Console>,
    chunk_size: usize,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        guard: ConnectionGuard,
        console: Arc<dyn Console>,
        chunk_size: usize,
    ) -> Self {
        Self {
            stream,
            guard,
            console,
            chunk_size,
        }
    }

    /// Run the read loop to completion and close the connection.
    pub async fn serve(mut self) {
        let id = self.guard.id();
        let peer_addr = self.guard.peer_addr();

        match self.read_loop().await {
            Ok(bytes) => {
                tracing::debug!(
                    connection_id = %id,
                    peer_addr = %peer_addr,
                    bytes,
                    "Peer closed connection"
                );
            }
            Err(HandlerError::Decode(DecodeError::Invalid { offset, ref bytes, .. })) => {
                tracing::warn!(
                    connection_id = %id,
                    peer_addr = %peer_addr,
                    offset,
                    raw = ?bytes,
                    "Invalid UTF-8 from peer, dropping connection"
                );
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %id,
                    peer_addr = %peer_addr,
                    error = %e,
                    "Connection ended with error"
                );
            }
        }

        self.console
            .status(&format!("connection {id} with {peer_addr} terminated"));

        // Best effort: the peer may already be gone. Dropping `self` closes
        // the descriptor and releases the guard.
        let _ = self.stream.shutdown().await;
    }

    /// Returns the number of bytes received before orderly close.
    async fn read_loop(&mut self) -> Result<u64, HandlerError> {
        let mut decoder = TextDecoder::new();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut total = 0u64;

        loop {
            let n = self.stream.read(&mut buffer).await?;
            if n == 0 {
                decoder.finish()?;
                return Ok(total);
            }
            total += n as u64;

            match decoder.decode(&buffer[..n]) {
                Ok(text) => self.print(&text),
                Err(err) => {
                    // Text ahead of the bad sequence was received intact.
                    if let DecodeError::Invalid { decoded, .. } = &err {
                        self.print(decoded);
                    }
                    return Err(err.into());
                }
            }
        }
    }

    fn print(&self, text: &str) {
        if !text.is_empty() {
            self.console.chunk(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::connection::ConnectionTracker;
    use crate::observability::{ConsoleEvent, MemoryConsole};
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    fn handler<S>(
        stream: S,
        tracker: &ConnectionTracker,
        console: &MemoryConsole,
        chunk_size: usize,
    ) -> ConnectionHandler<S>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let guard = tracker.track("127.0.0.1:50000".parse().unwrap());
        ConnectionHandler::new(stream, guard, Arc::new(console.clone()), chunk_size)
    }

    /// Yields some bytes, then a read error.
    struct FailingStream {
        data: Option<Vec<u8>>,
        shutdowns: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl AsyncRead for FailingStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.data.take() {
                Some(data) => {
                    buf.put_slice(&data);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "reset",
                ))),
            }
        }
    }

    impl AsyncWrite for FailingStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            self.shutdowns.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn prints_chunks_verbatim_until_close() {
        let (mut client, server) = tokio::io::duplex(64);
        let tracker = ConnectionTracker::new();
        let console = MemoryConsole::new();
        let task = tokio::spawn(handler(server, &tracker, &console, 1024).serve());

        client.write_all(b"hello\n").await.unwrap();
        client.shutdown().await.unwrap();
        task.await.unwrap();

        assert_eq!(console.chunks().concat(), "hello\n");
        let lines = console.status_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("with 127.0.0.1:50000 terminated"));
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn nothing_is_written_back() {
        let (mut client, server) = tokio::io::duplex(64);
        let tracker = ConnectionTracker::new();
        let console = MemoryConsole::new();
        let task = tokio::spawn(handler(server, &tracker, &console, 1024).serve());

        client.write_all(b"ping").await.unwrap();
        client.shutdown().await.unwrap();
        task.await.unwrap();

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn small_chunks_keep_multibyte_text_intact() {
        let (mut client, server) = tokio::io::duplex(64);
        let tracker = ConnectionTracker::new();
        let console = MemoryConsole::new();
        let task = tokio::spawn(handler(server, &tracker, &console, 3).serve());

        client.write_all("conexão terminada 🦀".as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();
        task.await.unwrap();

        assert_eq!(console.chunks().concat(), "conexão terminada 🦀");
    }

    #[tokio::test]
    async fn invalid_utf8_ends_only_this_connection() {
        let (mut client, server) = tokio::io::duplex(64);
        let tracker = ConnectionTracker::new();
        let console = MemoryConsole::new();
        let task = tokio::spawn(handler(server, &tracker, &console, 1024).serve());

        client.write_all(b"ok\xff\xfe").await.unwrap();
        task.await.unwrap();

        assert_eq!(console.chunks(), vec!["ok"]);
        assert_eq!(console.status_lines().len(), 1);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn text_before_invalid_byte_is_printed() {
        let (mut client, server) = tokio::io::duplex(64);
        let tracker = ConnectionTracker::new();
        let console = MemoryConsole::new();
        let task = tokio::spawn(handler(server, &tracker, &console, 1024).serve());

        client.write_all(b"hello world\xff").await.unwrap();
        task.await.unwrap();

        let events = console.events();
        assert_eq!(events[0], ConsoleEvent::Chunk("hello world".into()));
        assert!(matches!(&events[1], ConsoleEvent::Status(line) if line.ends_with("terminated")));
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn read_error_closes_exactly_once() {
        let shutdowns = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let stream = FailingStream {
            data: Some(b"partial".to_vec()),
            shutdowns: shutdowns.clone(),
        };
        let tracker = ConnectionTracker::new();
        let console = MemoryConsole::new();

        handler(stream, &tracker, &console, 1024).serve().await;

        assert_eq!(shutdowns.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(tracker.active_count(), 0);
        let events = console.events();
        assert_eq!(events[0], ConsoleEvent::Chunk("partial".into()));
        assert!(matches!(&events[1], ConsoleEvent::Status(line) if line.ends_with("terminated")));
        assert_eq!(events.len(), 2);
    }
}
