//! Bind address resolution.
//!
//! Resolves the passive wildcard address for a port, restricted to IPv4 and
//! TCP. Only the first candidate is used.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::lookup_host;

use crate::net::listener::SetupError;

/// Address family of a resolved bind address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

/// Socket type. Only stream sockets are ever requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketType {
    Stream,
}

/// Transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
}

/// A resolved, immutable bind address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindAddress {
    pub family: AddressFamily,
    pub socket_type: SocketType,
    pub protocol: Protocol,
    pub addr: SocketAddr,
}

impl BindAddress {
    fn tcp(addr: SocketAddr) -> Self {
        let family = if addr.is_ipv4() {
            AddressFamily::Ipv4
        } else {
            AddressFamily::Ipv6
        };
        Self {
            family,
            socket_type: SocketType::Stream,
            protocol: Protocol::Tcp,
            addr,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl fmt::Display for BindAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:?}, {:?}, {:?})",
            self.addr, self.family, self.socket_type, self.protocol
        )
    }
}

/// Resolve the wildcard IPv4 bind address for `port`.
pub async fn resolve(port: u16) -> Result<BindAddress, SetupError> {
    let candidates = lookup_host((Ipv4Addr::UNSPECIFIED, port))
        .await
        .map_err(|source| SetupError::Resolve { port, source })?;

    let addr = candidates
        .into_iter()
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| SetupError::Resolve {
            port,
            source: std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "no IPv4 candidate address",
            ),
        })?;

    tracing::debug!(address = %addr, "Bind address resolved");
    Ok(BindAddress::tcp(addr))
}
