// # Secret Store Trait
//
// Defines the interface for reading credentials out of the host's secret
// store.
//
// ## Implementations
//
// - Kubernetes Secrets: `dns01-secrets-kube` crate
// - In-memory: `dns01_core::memory::MemorySecretStore`

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::HostConfig;

/// Decoded secret contents: key → raw bytes
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Trait for secret store implementations
///
/// # Thread Safety
///
/// One store is created at `initialize` and shared by every concurrent
/// challenge, so all methods must be safe to call from many tasks.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read a secret
    ///
    /// # Returns
    ///
    /// - `Ok(Some(data))`: The secret exists
    /// - `Ok(None)`: No secret with that name in the namespace
    /// - `Err(Error)`: The store could not be queried (permissions, network)
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, crate::Error>;
}

/// Builds the long-lived secret store client from the host's connection
/// settings
pub trait SecretStoreFactory: Send + Sync {
    /// Create a SecretStore for the given host
    fn create(&self, host: &HostConfig) -> Result<Arc<dyn SecretStore>, crate::Error>;
}
