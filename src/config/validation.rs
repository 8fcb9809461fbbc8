//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of a `ServerConfig`
//! - Parse the textual port given on the command line
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>

use std::num::ParseIntError;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backlog must be at least 1")]
    ZeroBacklog,

    #[error("chunk size must be at least 1 byte")]
    ZeroChunkSize,
}

/// Error type for configuration input.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid port `{input}`: {source}")]
    Port {
        input: String,
        #[source]
        source: ParseIntError,
    },

    #[error("{}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    let mut out = String::from("validation failed: ");
    for (i, err) in errors.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&err.to_string());
    }
    out
}

/// Check a configuration, collecting every violation.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    if config.backlog == 0 {
        errors.push(ValidationError::ZeroBacklog);
    }
    if config.chunk_size == 0 {
        errors.push(ValidationError::ZeroChunkSize);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse a decimal TCP port (0-65535).
pub fn parse_port(input: &str) -> Result<u16, ConfigError> {
    input.trim().parse::<u16>().map_err(|source| ConfigError::Port {
        input: input.to_string(),
        source,
    })
}
