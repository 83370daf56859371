//! Configuration types for the DNS-01 solver
//!
//! Two kinds of configuration exist:
//! - [`SolverConfig`]: per-issuer JSON carried inside every challenge request
//! - [`SolverSettings`] and [`HostConfig`]: process-wide values fixed at startup
//!
//! ## Solver config schema
//!
//! ```json
//! { "accessKeySecretRef": { "name": "bunny-credentials", "key": "access-key" },
//!   "zoneId": 12345 }
//! ```
//!
//! or, less securely, with the access key inline:
//!
//! ```json
//! { "accessKey": "<bunny.net access key>", "zoneId": 12345 }
//! ```
//!
//! `apiSecretRef` is accepted for `accessKeySecretRef`, `secretName` /
//! `secretKey` for `name` / `key`, and `zoneID` for `zoneId`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// TTL of created challenge records, in seconds
pub const DEFAULT_RECORD_TTL: u32 = 180;

/// Kubernetes-style reference to one key of a secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeySelector {
    /// Secret name
    #[serde(default, alias = "secretName")]
    pub name: String,
    /// Key within the secret's data
    #[serde(default, alias = "secretKey")]
    pub key: String,
}

impl SecretKeySelector {
    /// Create a new secret key selector
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

/// Where the provider access key comes from
#[derive(Clone, PartialEq, Eq)]
pub enum AccessKeySource {
    /// Read from a secret in the challenge's namespace
    SecretRef(SecretKeySelector),
    /// Literal key embedded in the issuer config
    Inline(String),
}

// Custom Debug implementation that hides the inline key
impl fmt::Debug for AccessKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKeySource::SecretRef(selector) => {
                f.debug_tuple("SecretRef").field(selector).finish()
            }
            AccessKeySource::Inline(_) => f.debug_tuple("Inline").field(&"<REDACTED>").finish(),
        }
    }
}

/// Solver configuration parsed from a challenge request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SolverConfig {
    /// Credential source; `None` is reported when credentials are resolved
    pub access_key: Option<AccessKeySource>,

    /// bunny.net DNS zone ID
    pub zone_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSolverConfig {
    #[serde(default, alias = "apiSecretRef")]
    access_key_secret_ref: Option<SecretKeySelector>,

    #[serde(default)]
    access_key: Option<String>,

    #[serde(default, alias = "zoneID")]
    zone_id: Option<i64>,
}

impl SolverConfig {
    /// Parse the config blob of a challenge request
    ///
    /// A missing blob is not an error here; it yields a config without
    /// credentials, which fails later at resolution.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the blob is not the expected JSON shape, when
    /// both a secret reference and a non-empty inline key are given, when
    /// the secret name is not a DNS subdomain name, when the secret reference
    /// has no key, or when the zone ID is not positive.
    pub fn parse(config: Option<&serde_json::Value>) -> Result<Self> {
        let Some(value) = config else {
            return Ok(Self::default());
        };

        if value.is_null() {
            return Ok(Self::default());
        }

        let raw: RawSolverConfig = serde_json::from_value(value.clone())
            .map_err(|e| Error::config(format!("error decoding solver config: {}", e)))?;

        let inline_key = raw.access_key.filter(|key| !key.is_empty());

        let access_key = match (raw.access_key_secret_ref, inline_key) {
            (Some(_), Some(_)) => {
                return Err(Error::config(
                    "accessKeySecretRef and accessKey are mutually exclusive",
                ));
            }
            (Some(selector), None) if selector.name.is_empty() => None,
            (Some(selector), None) => {
                if !is_dns_subdomain(&selector.name) {
                    return Err(Error::config(format!(
                        "accessKeySecretRef name '{}' is not a valid secret name",
                        selector.name
                    )));
                }
                if selector.key.is_empty() {
                    return Err(Error::config(format!(
                        "accessKeySecretRef for secret '{}' has no key",
                        selector.name
                    )));
                }
                Some(AccessKeySource::SecretRef(selector))
            }
            (None, Some(key)) => Some(AccessKeySource::Inline(key)),
            (None, None) => None,
        };

        if let Some(zone_id) = raw.zone_id
            && zone_id <= 0
        {
            return Err(Error::config(format!(
                "zoneId must be a positive integer, got {}",
                zone_id
            )));
        }

        Ok(Self {
            access_key,
            zone_id: raw.zone_id,
        })
    }

    /// The configured zone ID
    pub fn require_zone_id(&self) -> Result<i64> {
        self.zone_id
            .ok_or_else(|| Error::config("zoneId is required in the solver config"))
    }
}

/// Whether `name` is a DNS-1123 subdomain, the form of most object names
/// (secrets among them)
pub fn is_dns_subdomain(name: &str) -> bool {
    name.len() <= 253 && name.split('.').all(is_dns_label)
}

/// Whether `name` is a DNS-1123 label, the form of namespace names
pub fn is_dns_label(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !name.starts_with('-')
        && !name.ends_with('-')
}

/// Process-wide solver settings, fixed at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// API group the host routes to this solver
    pub group_name: String,

    /// TTL of created TXT records, in seconds
    #[serde(default = "default_record_ttl")]
    pub record_ttl: u32,
}

impl SolverSettings {
    /// Create settings for an API group
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when `group_name` is empty.
    pub fn new(group_name: impl Into<String>) -> Result<Self> {
        let settings = Self {
            group_name: group_name.into(),
            record_ttl: DEFAULT_RECORD_TTL,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Set the TTL of created records
    pub fn with_record_ttl(mut self, record_ttl: u32) -> Self {
        self.record_ttl = record_ttl;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.group_name.trim().is_empty() {
            return Err(Error::config("group name cannot be empty"));
        }
        if self.record_ttl == 0 {
            return Err(Error::config("record TTL must be > 0"));
        }
        Ok(())
    }
}

fn default_record_ttl() -> u32 {
    DEFAULT_RECORD_TTL
}

/// Path of the mounted service-account token inside a pod
pub const IN_CLUSTER_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Path of the mounted cluster CA bundle inside a pod
pub const IN_CLUSTER_CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Connection settings for the host's API server
///
/// Handed to [`crate::traits::Solver::initialize`] so the solver can build
/// its long-lived secret store client.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HostConfig {
    /// Base URL of the API server (e.g. `https://10.0.0.1:443`)
    pub api_url: String,

    /// Bearer token given directly
    pub bearer_token: Option<String>,

    /// File the bearer token is read from (takes effect when
    /// `bearer_token` is unset)
    pub bearer_token_file: Option<PathBuf>,

    /// PEM CA bundle used to verify the API server
    pub ca_cert_file: Option<PathBuf>,

    /// Skip TLS verification (local development only)
    pub accept_invalid_certs: bool,
}

// Custom Debug implementation that hides the bearer token
impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("api_url", &self.api_url)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("bearer_token_file", &self.bearer_token_file)
            .field("ca_cert_file", &self.ca_cert_file)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl HostConfig {
    /// Create a host config for an API server URL
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Set a bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Build the config a pod gets from its environment
    ///
    /// Uses `KUBERNETES_SERVICE_HOST` / `KUBERNETES_SERVICE_PORT` and the
    /// mounted service-account token and CA bundle.
    pub fn in_cluster() -> Result<Self> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
            Error::config("KUBERNETES_SERVICE_HOST is not set; not running in a cluster?")
        })?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());

        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]", host)
        } else {
            host
        };

        Ok(Self {
            api_url: format!("https://{}:{}", host, port),
            bearer_token: None,
            bearer_token_file: Some(PathBuf::from(IN_CLUSTER_TOKEN_PATH)),
            ca_cert_file: Some(PathBuf::from(IN_CLUSTER_CA_PATH)),
            accept_invalid_certs: false,
        })
    }

    /// Validate the host config
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(Error::config("API server URL cannot be empty"));
        }
        if !self.api_url.starts_with("https://") && !self.api_url.starts_with("http://") {
            return Err(Error::config(format!(
                "API server URL must use HTTP or HTTPS scheme. Got: {}",
                self.api_url
            )));
        }
        Ok(())
    }
}
