//! Error types for the DNS-01 solver
//!
//! Every error is returned to the host, which attaches the message to the
//! pending challenge and owns retry scheduling. Messages carry the record
//! name, zone ID or secret reference involved so they can be diagnosed from
//! the certificate request status alone.

use thiserror::Error;

/// Result type alias for solver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DNS-01 solver
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or incomplete solver configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The solver configuration carries no credential reference
    #[error("Missing access key secret reference: {0}")]
    MissingSecretReference(String),

    /// The referenced secret, or the key within it, could not be read
    #[error("Secret lookup failed for '{namespace}/{name}': {message}")]
    SecretLookup {
        /// Namespace the secret was looked up in
        namespace: String,
        /// Secret name
        name: String,
        /// Underlying failure
        message: String,
    },

    /// DNS provider API failure
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message, including the provider's own message when available
        message: String,
    },

    /// A capability was used before `initialize` established it
    #[error("Solver not initialized: {0}")]
    NotInitialized(String),

    /// The host passed a request that violates the solver contract
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing secret reference error
    pub fn missing_secret_ref(msg: impl Into<String>) -> Self {
        Self::MissingSecretReference(msg.into())
    }

    /// Create a secret lookup error
    pub fn secret_lookup(
        namespace: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SecretLookup {
            namespace: namespace.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a "not initialized" error
    pub fn not_initialized(msg: impl Into<String>) -> Self {
        Self::NotInitialized(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the host may succeed by simply retrying later.
    ///
    /// Only provider failures can be transient. Everything else needs an
    /// operator to fix configuration or create the secret first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}
