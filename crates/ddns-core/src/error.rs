//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration document could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Network-related errors (socket setup, send, receive)
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// DNS protocol errors (malformed reply, bad rcode, id mismatch)
    #[error("DNS error: {0}")]
    Dns(String),

    /// The DNS reply carried no answer records
    #[error("DNS reply contained no answers")]
    EmptyAnswer,

    /// The first answer record was not of the expected type
    #[error("Unexpected DNS record type: expected {expected}, got {found}")]
    UnexpectedRecordType {
        /// Record type that was asked for
        expected: String,
        /// Record type that came back
        found: String,
    },

    /// Domain lookup through the system resolver failed
    #[error("Lookup of {domain} failed: {message}")]
    Lookup {
        /// Domain that was looked up
        domain: String,
        /// Resolver message
        message: String,
    },

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// A network call did not finish in time
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a DNS protocol error
    pub fn dns(msg: impl Into<String>) -> Self {
        Self::Dns(msg.into())
    }

    /// Create an unexpected record type error
    pub fn unexpected_record(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedRecordType {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a lookup error
    pub fn lookup(domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lookup {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error must stop the process at startup
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Yaml(_))
    }
}
