// # Memory Secret Store
//
// In-memory implementation of SecretStore, keyed by namespace and name.
// Also acts as its own factory so it can be handed to
// `Dns01Solver::initialize` in tests and embedded setups.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::HostConfig;
use crate::traits::{SecretData, SecretStore, SecretStoreFactory};
use crate::Result;

/// In-memory secret store
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    inner: Arc<RwLock<HashMap<(String, String), SecretData>>>,
}

impl MemorySecretStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one key of a secret, creating the secret if needed
    pub fn insert(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard
            .entry((namespace.into(), name.into()))
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Remove a whole secret
    pub fn remove(&self, namespace: &str, name: &str) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.remove(&(namespace.to_string(), name.to_string()));
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretData>> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(guard
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}

impl SecretStoreFactory for MemorySecretStore {
    fn create(&self, _host: &HostConfig) -> Result<Arc<dyn SecretStore>> {
        Ok(Arc::new(self.clone()))
    }
}
