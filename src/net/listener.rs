//! TCP listener setup and the accept loop.
//!
//! # Responsibilities
//! - Create the socket, enable address reuse, bind, listen
//! - Accept incoming TCP connections forever
//! - Hand each connection to its own detached handler task
//! - Swallow accept errors and keep accepting
//!
//! # Design Decisions
//! - Each setup step returns `SetupError`; only the binary decides to exit
//! - The accept loop never joins or awaits handler tasks

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::config::ServerConfig;
use crate::net::connection::{ConnectionGuard, ConnectionTracker};
use crate::net::handler::ConnectionHandler;
use crate::net::resolver::{self, AddressFamily, BindAddress};
use crate::observability::Console;

/// Fatal errors raised while bringing the listener up.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("could not resolve a bind address for port {port}: {source}")]
    Resolve {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("could not create socket: {0}")]
    Socket(#[source] std::io::Error),

    #[error("could not enable address reuse: {0}")]
    Reuse(#[source] std::io::Error),

    #[error("could not bind server socket to port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("could not start listening: {0}")]
    Listen(#[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// A failed accept. Never fatal.
#[derive(Debug, Error)]
#[error("failed to accept: {0}")]
pub struct AcceptError(#[from] pub std::io::Error);

/// Allocate a TCP stream socket matching the address family.
pub fn create_socket(bind: &BindAddress) -> Result<TcpSocket, SetupError> {
    let socket = match bind.family {
        AddressFamily::Ipv4 => TcpSocket::new_v4(),
        AddressFamily::Ipv6 => TcpSocket::new_v6(),
    };
    socket.map_err(SetupError::Socket)
}

/// Allow rebinding a port whose previous socket is still in TIME_WAIT.
pub fn set_reuse_address(socket: &TcpSocket) -> Result<(), SetupError> {
    socket.set_reuseaddr(true).map_err(SetupError::Reuse)
}

/// Bind to the resolved wildcard address.
pub fn bind(socket: &TcpSocket, bind: &BindAddress) -> Result<(), SetupError> {
    socket.bind(bind.addr).map_err(|source| SetupError::Bind {
        port: bind.port(),
        source,
    })
}

/// Start listening with the given backlog.
pub fn listen(socket: TcpSocket, backlog: u32) -> Result<TcpListener, SetupError> {
    socket.listen(backlog).map_err(SetupError::Listen)
}

/// A connection that has just been accepted.
pub struct Accepted {
    pub stream: TcpStream,
    pub guard: ConnectionGuard,
}

/// The listening server: owns the listening socket for its whole life.
pub struct Server {
    inner: TcpListener,
    tracker: ConnectionTracker,
    console: Arc<dyn Console>,
    chunk_size: usize,
}

impl Server {
    /// Resolve, create, reuse, bind and listen, in that order.
    pub async fn bind(
        config: &ServerConfig,
        console: Arc<dyn Console>,
    ) -> Result<Self, SetupError> {
        crate::config::validate_config(config)
            .map_err(|errors| SetupError::Config(crate::config::ConfigError::Validation(errors)))?;

        let address = resolver::resolve(config.port).await?;
        let socket = create_socket(&address)?;
        set_reuse_address(&socket)?;
        bind(&socket, &address)?;

        let local_addr = socket.local_addr().map_err(|source| SetupError::Bind {
            port: address.port(),
            source,
        })?;
        console.status(&format!("server ready at {address}"));
        tracing::info!(address = %local_addr, "Socket bound");

        let inner = listen(socket, config.backlog)?;
        console.status("service started");
        tracing::info!(
            address = %local_addr,
            backlog = config.backlog,
            chunk_size = config.chunk_size,
            "Listening for connections"
        );

        Ok(Self {
            inner,
            tracker: ConnectionTracker::new(),
            console,
            chunk_size: config.chunk_size,
        })
    }

    /// Get the local address this server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Handle on the live connection count.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Wait for one client.
    pub async fn accept_one(&self) -> Result<Accepted, AcceptError> {
        let (stream, peer_addr) = self.inner.accept().await?;
        let guard = self.tracker.track(peer_addr);

        self.console.status(&format!("server connected with {peer_addr}"));
        tracing::debug!(
            connection_id = %guard.id(),
            peer_addr = %peer_addr,
            active_connections = self.tracker.active_count(),
            "Connection accepted"
        );

        Ok(Accepted { stream, guard })
    }

    /// Accept forever, spawning a detached handler per connection.
    pub async fn run(self) {
        loop {
            let Accepted { stream, guard } = match self.accept_one().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::debug!(error = %e, "Accept failed, retrying");
                    continue;
                }
            };

            let handler = ConnectionHandler::new(
                stream,
                guard,
                Arc::clone(&self.console),
                self.chunk_size,
            );
            tokio::spawn(handler.serve());
        }
    }
}
