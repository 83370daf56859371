// # Kubernetes Secret Store
//
// This crate reads credentials out of Kubernetes Secrets through the API
// server's REST interface.
//
// ## Behavior
//
// - `GET /api/v1/namespaces/:namespace/secrets/:name` with a bearer token
// - Namespace and name must be DNS names, so a lookup cannot leave its
//   namespace through the URL path
// - 404 means the secret does not exist (`Ok(None)`)
// - `data` values are base64 decoded; nothing is cached between reads
//
// ## Security Requirements
//
// - The bearer token and secret contents NEVER appear in logs
// - The token file is re-read on every request (projected tokens rotate)

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use dns01_core::config::{HostConfig, is_dns_label, is_dns_subdomain};
use dns01_core::traits::{SecretData, SecretStore, SecretStoreFactory};
use dns01_core::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default HTTP timeout for API server requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the bearer token comes from
#[derive(Clone)]
enum TokenSource {
    None,
    Static(String),
    File(PathBuf),
}

impl TokenSource {
    async fn load(&self) -> std::result::Result<Option<String>, String> {
        match self {
            TokenSource::None => Ok(None),
            TokenSource::Static(token) => Ok(Some(token.clone())),
            TokenSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map(|t| Some(t.trim().to_string()))
                .map_err(|e| format!("failed to read token file {}: {}", path.display(), e)),
        }
    }
}

/// Secret object as returned by the API server (only the part we read)
#[derive(Debug, Deserialize)]
struct SecretBody {
    #[serde(default)]
    data: Option<BTreeMap<String, String>>,
}

/// Kubernetes API server secret reader
pub struct KubeSecretStore {
    /// API server base URL, without trailing slash
    api_url: String,

    /// Bearer token source
    /// ⚠️ NEVER log the token
    token: TokenSource,

    /// HTTP client (carries CA bundle and timeout)
    client: reqwest::Client,
}

// Custom Debug implementation that hides the bearer token
impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = match &self.token {
            TokenSource::None => "<none>".to_string(),
            TokenSource::Static(_) => "<REDACTED>".to_string(),
            TokenSource::File(path) => format!("<file {}>", path.display()),
        };
        f.debug_struct("KubeSecretStore")
            .field("api_url", &self.api_url)
            .field("token", &token)
            .finish()
    }
}

impl KubeSecretStore {
    /// Build a store from host connection settings
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the host config is invalid, the CA bundle
    /// cannot be loaded, or the token file cannot be read.
    pub fn from_host(host: &HostConfig) -> Result<Self> {
        host.validate()?;

        let mut builder = reqwest::Client::builder().timeout(DEFAULT_HTTP_TIMEOUT);

        if let Some(ca_path) = &host.ca_cert_file {
            let pem = std::fs::read(ca_path).map_err(|e| {
                Error::config(format!("failed to read CA bundle {}: {}", ca_path.display(), e))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                Error::config(format!("invalid CA bundle {}: {}", ca_path.display(), e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if host.accept_invalid_certs {
            tracing::warn!("TLS verification of the API server is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let token = match (&host.bearer_token, &host.bearer_token_file) {
            (Some(token), _) => TokenSource::Static(token.clone()),
            (None, Some(path)) => {
                std::fs::metadata(path).map_err(|e| {
                    Error::config(format!("token file {} is not readable: {}", path.display(), e))
                })?;
                TokenSource::File(path.clone())
            }
            (None, None) => TokenSource::None,
        };

        Ok(Self {
            api_url: host.api_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn secret_url(&self, namespace: &str, name: &str) -> String {
        format!(
            "{}/api/v1/namespaces/{}/secrets/{}",
            self.api_url, namespace, name
        )
    }
}

fn decode_data(data: BTreeMap<String, String>) -> std::result::Result<SecretData, String> {
    data.into_iter()
        .map(|(key, encoded)| {
            STANDARD
                .decode(encoded.trim())
                .map(|bytes| (key.clone(), bytes))
                .map_err(|e| format!("value of key '{}' is not valid base64: {}", key, e))
        })
        .collect()
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretData>> {
        let lookup_err = |message: String| Error::secret_lookup(namespace, name, message);

        if !is_dns_label(namespace) {
            return Err(lookup_err("namespace is not a valid DNS label".to_string()));
        }
        if !is_dns_subdomain(name) {
            return Err(lookup_err("secret name is not a valid DNS subdomain name".to_string()));
        }

        tracing::debug!(namespace, secret = name, "Reading secret");

        let mut request = self
            .client
            .get(self.secret_url(namespace, name))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = self.token.load().await.map_err(lookup_err)? {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| lookup_err(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(namespace, secret = name, "Secret not found");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(match status.as_u16() {
                401 | 403 => lookup_err(format!(
                    "access denied by the API server (status {}); check the service account's RBAC: {}",
                    status, body
                )),
                _ => lookup_err(format!("API server returned {} - {}", status, body)),
            });
        }

        let body: SecretBody = response
            .json()
            .await
            .map_err(|e| lookup_err(format!("Failed to parse response: {}", e)))?;

        let data = decode_data(body.data.unwrap_or_default()).map_err(lookup_err)?;
        Ok(Some(data))
    }
}

/// Factory that builds a `KubeSecretStore` at solver initialization
#[derive(Debug, Default, Clone, Copy)]
pub struct KubeSecretStoreFactory;

impl SecretStoreFactory for KubeSecretStoreFactory {
    fn create(&self, host: &HostConfig) -> Result<Arc<dyn SecretStore>> {
        let store = KubeSecretStore::from_host(host)?;
        tracing::info!(api_url = %store.api_url, "Kubernetes secret store ready");
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data() {
        let mut data = BTreeMap::new();
        data.insert("access-key".to_string(), "YnVubnkta2V5".to_string());

        let decoded = decode_data(data).unwrap();
        assert_eq!(decoded["access-key"], b"bunny-key".to_vec());
    }

    #[test]
    fn test_decode_data_rejects_garbage() {
        let mut data = BTreeMap::new();
        data.insert("access-key".to_string(), "not base64!".to_string());

        let err = decode_data(data).unwrap_err();
        assert!(err.contains("access-key"));
    }

    #[test]
    fn test_secret_url() {
        let host = HostConfig::new("https://10.0.0.1:443/").with_bearer_token("t");
        let store = KubeSecretStore::from_host(&host).unwrap();
        assert_eq!(
            store.secret_url("cert-manager", "bunny-credentials"),
            "https://10.0.0.1:443/api/v1/namespaces/cert-manager/secrets/bunny-credentials"
        );
    }

    #[test]
    fn test_missing_ca_bundle_is_config_error() {
        let mut host = HostConfig::new("https://10.0.0.1:443");
        host.ca_cert_file = Some(PathBuf::from("/nonexistent/ca.crt"));

        let err = KubeSecretStoreFactory.create(&host).err().expect("expected error");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_token_file_is_config_error() {
        let mut host = HostConfig::new("https://10.0.0.1:443");
        host.bearer_token_file = Some(PathBuf::from("/nonexistent/token"));

        assert!(KubeSecretStore::from_host(&host).is_err());
    }

    #[test]
    fn test_token_not_exposed_in_debug() {
        let host = HostConfig::new("https://10.0.0.1:443").with_bearer_token("sa-token-12345");
        let store = KubeSecretStore::from_host(&host).unwrap();

        let debug_str = format!("{:?}", store);
        assert!(!debug_str.contains("sa-token-12345"));
    }
}
