//! Configuration schema definitions.
//!
//! The command line only ever sets the port. Backlog and chunk size are
//! library-level tunables; their defaults are the values the server is
//! specified to run with.

/// Port used when no argument is given.
pub const DEFAULT_PORT: u16 = 8752;

/// Pending-connection queue length handed to `listen(2)`.
pub const DEFAULT_BACKLOG: u32 = 1;

/// Maximum number of bytes taken off a connection per read.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Root configuration for the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Local TCP port to bind on the wildcard address. 0 lets the OS pick.
    pub port: u16,

    /// Listen backlog.
    pub backlog: u32,

    /// Read buffer size per connection.
    pub chunk_size: usize,
}

impl ServerConfig {
    /// Default configuration bound to `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8752);
        assert_eq!(config.backlog, 1);
        assert_eq!(config.chunk_size, 1024);
    }

    #[test]
    fn with_port_keeps_other_defaults() {
        let config = ServerConfig::with_port(9999);
        assert_eq!(config.port, 9999);
        assert_eq!(config.backlog, DEFAULT_BACKLOG);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }
}
