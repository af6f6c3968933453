//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.
//!
//! Failures are grouped by the component that raises them:
//! - IP sources: [`Error::SourceUnreachable`], [`Error::ParseFailure`]
//! - Public IP resolver: [`Error::DiscoveryFailed`]
//! - DNS lookup: [`Error::ResolutionFailed`]
//! - Provider: [`Error::ProviderStatus`], [`Error::ProviderTransport`]

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// The IP source could not be reached (network, timeout, non-2xx)
    #[error("IP source '{source_name}' unreachable: {message}")]
    SourceUnreachable {
        /// Source name
        source_name: String,
        /// Error message
        message: String,
    },

    /// The IP source answered, but not in the expected shape
    #[error("IP source '{source_name}' returned an unparseable response: {message}")]
    ParseFailure {
        /// Source name
        source_name: String,
        /// Error message
        message: String,
    },

    /// Every configured IP source failed
    #[error("Public IP discovery failed: {0}")]
    DiscoveryFailed(String),

    /// The published address of the target hostname could not be resolved
    #[error("Failed to resolve '{hostname}': {message}")]
    ResolutionFailed {
        /// Hostname that was looked up
        hostname: String,
        /// Error message
        message: String,
    },

    /// The provider answered with a non-2xx status
    #[error("Provider {provider} rejected the update with HTTP {status}: {body}")]
    ProviderStatus {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Response body (may be empty)
        body: String,
    },

    /// The provider request could not be completed
    #[error("Provider {provider} request failed: {message}")]
    ProviderTransport {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Text that is not a canonical dotted-quad IPv4 address
    #[error("Invalid IPv4 address: {0:?}")]
    InvalidAddress(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "source unreachable" error
    pub fn source_unreachable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnreachable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a parse failure error
    pub fn parse_failure(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseFailure {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a discovery failure error
    pub fn discovery_failed(msg: impl Into<String>) -> Self {
        Self::DiscoveryFailed(msg.into())
    }

    /// Create a resolution failure error
    pub fn resolution_failed(hostname: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResolutionFailed {
            hostname: hostname.into(),
            message: message.into(),
        }
    }

    /// Create a provider status error
    pub fn provider_status(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::ProviderStatus {
            provider: provider.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a provider transport error
    pub fn provider_transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderTransport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for failures raised while discovering addresses (sources or DNS)
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            Self::SourceUnreachable { .. }
                | Self::ParseFailure { .. }
                | Self::DiscoveryFailed(_)
                | Self::ResolutionFailed { .. }
        )
    }

    /// HTTP status carried by a provider rejection, if any
    pub fn provider_http_status(&self) -> Option<u16> {
        match self {
            Self::ProviderStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
