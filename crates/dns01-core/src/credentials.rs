//! Credential resolution
//!
//! Turns the config blob of a challenge into the provider access key and the
//! zone to operate on. With a secret reference this is one read from the
//! secret store in the challenge's namespace; with an inline key it is a
//! pure parse.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{AccessKeySource, SecretKeySelector, SolverConfig};
use crate::error::{Error, Result};
use crate::traits::SecretStore;

/// Access key and zone a challenge operates on
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    /// Provider access key
    /// ⚠️ NEVER log this value
    pub access_key: String,

    /// Provider zone ID
    pub zone_id: i64,
}

// Custom Debug implementation that hides the access key
impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("access_key", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .finish()
    }
}

/// Resolves challenge configs into credentials
///
/// Holds the secret store once the solver is initialized. Without one, only
/// inline keys can be resolved.
#[derive(Clone, Default)]
pub struct CredentialResolver {
    secret_store: Option<Arc<dyn SecretStore>>,
}

impl CredentialResolver {
    /// Create a resolver backed by a secret store
    pub fn new(secret_store: Arc<dyn SecretStore>) -> Self {
        Self {
            secret_store: Some(secret_store),
        }
    }

    /// Create a resolver that can only handle inline keys
    pub fn inline_only() -> Self {
        Self::default()
    }

    /// Resolve the access key and zone ID for a challenge
    ///
    /// # Errors
    ///
    /// - [`Error::Config`]: the blob has the wrong shape or no zone ID
    /// - [`Error::MissingSecretReference`]: no credential reference given
    /// - [`Error::NotInitialized`]: a secret reference but no secret store
    /// - [`Error::SecretLookup`]: the secret or key does not exist, or the
    ///   store failed
    pub async fn resolve(
        &self,
        config: Option<&serde_json::Value>,
        namespace: &str,
    ) -> Result<ResolvedCredentials> {
        let config = SolverConfig::parse(config)?;

        let source = config.access_key.clone().ok_or_else(|| {
            Error::missing_secret_ref("undefined access key secret: set accessKeySecretRef.name")
        })?;

        let zone_id = config.require_zone_id()?;

        let access_key = match source {
            AccessKeySource::SecretRef(selector) => {
                self.read_secret_key(&selector, namespace).await?
            }
            AccessKeySource::Inline(key) => {
                warn!(
                    zone_id,
                    "Using inline access key from solver config; prefer accessKeySecretRef"
                );
                key
            }
        };

        Ok(ResolvedCredentials {
            access_key,
            zone_id,
        })
    }

    async fn read_secret_key(
        &self,
        selector: &SecretKeySelector,
        namespace: &str,
    ) -> Result<String> {
        let store = self.secret_store.as_ref().ok_or_else(|| {
            Error::not_initialized(format!(
                "no secret store available to read secret '{}/{}'",
                namespace, selector.name
            ))
        })?;

        debug!(namespace, secret = %selector.name, "Reading access key secret");

        let data = store
            .get_secret(namespace, &selector.name)
            .await
            .map_err(|e| Error::secret_lookup(namespace, &selector.name, e.to_string()))?
            .ok_or_else(|| Error::secret_lookup(namespace, &selector.name, "secret not found"))?;

        let bytes = data.get(&selector.key).ok_or_else(|| {
            Error::secret_lookup(
                namespace,
                &selector.name,
                format!("key not found {:?}", selector.key),
            )
        })?;

        let access_key = String::from_utf8(bytes.clone()).map_err(|_| {
            Error::secret_lookup(
                namespace,
                &selector.name,
                format!("key {:?} is not valid UTF-8", selector.key),
            )
        })?;

        let access_key = access_key.trim().to_string();
        if access_key.is_empty() {
            return Err(Error::secret_lookup(
                namespace,
                &selector.name,
                format!("key {:?} is empty", selector.key),
            ));
        }

        Ok(access_key)
    }
}
