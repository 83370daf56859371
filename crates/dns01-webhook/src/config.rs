// Process configuration
//
// All configuration is done via environment variables:
//
// - `GROUP_NAME`: API group the host routes challenges under (required)
// - `DNS01_LISTEN_ADDR`: HTTP listen address (default `0.0.0.0:8443`)
// - `DNS01_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
// - `DNS01_MODE`: `live` or `dry-run` (default `live`)
// - `BUNNY_API_BASE_URL`: bunny.net API endpoint (default `https://api.bunny.net`)
// - `DNS01_RECORD_TTL`: TTL of created records, 30..=86400 (default 180)
// - `DNS01_KUBE_API_URL`: API server URL when running outside a cluster
// - `DNS01_KUBE_TOKEN_FILE`: bearer token file for `DNS01_KUBE_API_URL`
// - `DNS01_TLS_CERT_FILE`: PEM serving certificate chain
// - `DNS01_TLS_KEY_FILE`: PEM private key of the serving certificate
//
// The two TLS variables are set together. Without them the webhook serves
// plain HTTP, which the API server cannot use for an APIService.

use anyhow::{Context, Result};
use dns01_core::config::{DEFAULT_RECORD_TTL, HostConfig};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8443";

/// Default bunny.net API endpoint
pub const DEFAULT_BUNNY_API_BASE_URL: &str = "https://api.bunny.net";

/// Whether provider mutations are performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Records are created and deleted
    Live,
    /// Zone reads happen, mutations are only logged
    DryRun,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub group_name: String,
    pub listen_addr: String,
    pub log_level: String,
    pub mode: String,
    pub bunny_api_base_url: String,
    pub record_ttl: Option<String>,
    pub kube_api_url: Option<String>,
    pub kube_token_file: Option<String>,
    pub tls_cert_file: Option<String>,
    pub tls_key_file: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let group_name = get("GROUP_NAME")
            .filter(|g| !g.is_empty())
            .context("GROUP_NAME must be specified")?;

        Ok(Self {
            group_name,
            listen_addr: get("DNS01_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            log_level: get("DNS01_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            mode: get("DNS01_MODE").unwrap_or_else(|| "live".to_string()),
            bunny_api_base_url: get("BUNNY_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BUNNY_API_BASE_URL.to_string()),
            record_ttl: get("DNS01_RECORD_TTL"),
            kube_api_url: get("DNS01_KUBE_API_URL").filter(|u| !u.is_empty()),
            kube_token_file: get("DNS01_KUBE_TOKEN_FILE").filter(|p| !p.is_empty()),
            tls_cert_file: get("DNS01_TLS_CERT_FILE").filter(|p| !p.is_empty()),
            tls_key_file: get("DNS01_TLS_KEY_FILE").filter(|p| !p.is_empty()),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_group_name()?;

        self.socket_addr()?;
        self.mode()?;
        self.record_ttl()?;

        if !self.bunny_api_base_url.starts_with("https://")
            && !self.bunny_api_base_url.starts_with("http://")
        {
            anyhow::bail!(
                "BUNNY_API_BASE_URL must use HTTP or HTTPS scheme. Got: {}",
                self.bunny_api_base_url
            );
        }

        if self.bunny_api_base_url.starts_with("http://") {
            eprintln!(
                "WARNING: BUNNY_API_BASE_URL uses HTTP (not HTTPS). \
                 The access key will be sent in clear text."
            );
        }

        if self.kube_token_file.is_some() && self.kube_api_url.is_none() {
            anyhow::bail!("DNS01_KUBE_TOKEN_FILE is only used together with DNS01_KUBE_API_URL");
        }

        self.validate_tls()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DNS01_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// The group name must be a DNS name (it is part of an API group)
    fn validate_group_name(&self) -> Result<()> {
        let group = &self.group_name;

        if group.len() > 253 {
            anyhow::bail!("GROUP_NAME too long: {} chars (max 253)", group.len());
        }

        for label in group.split('.') {
            if label.is_empty() {
                anyhow::bail!("GROUP_NAME has empty label: '{}'", group);
            }

            if label.len() > 63 {
                anyhow::bail!(
                    "GROUP_NAME label too long: {} chars (max 63). Label: '{}'",
                    label.len(),
                    label
                );
            }

            if !label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                anyhow::bail!(
                    "GROUP_NAME label contains invalid characters. Label: '{}'. \
                    Valid: lowercase alphanumeric and hyphen only.",
                    label
                );
            }

            if label.starts_with('-') || label.ends_with('-') {
                anyhow::bail!("GROUP_NAME label cannot start or end with hyphen. Label: '{}'", label);
            }
        }

        Ok(())
    }

    /// The TLS files come as a pair and must be readable
    fn validate_tls(&self) -> Result<()> {
        match (&self.tls_cert_file, &self.tls_key_file) {
            (Some(cert), Some(key)) => {
                for (var, path) in [("DNS01_TLS_CERT_FILE", cert), ("DNS01_TLS_KEY_FILE", key)] {
                    std::fs::metadata(path)
                        .with_context(|| format!("{} '{}' is not readable", var, path))?;
                }
                Ok(())
            }
            (Some(_), None) => {
                anyhow::bail!("DNS01_TLS_CERT_FILE is set but DNS01_TLS_KEY_FILE is not")
            }
            (None, Some(_)) => {
                anyhow::bail!("DNS01_TLS_KEY_FILE is set but DNS01_TLS_CERT_FILE is not")
            }
            (None, None) => Ok(()),
        }
    }

    /// Serving certificate and key paths, when TLS is configured
    pub fn tls_files(&self) -> Option<(PathBuf, PathBuf)> {
        match (&self.tls_cert_file, &self.tls_key_file) {
            (Some(cert), Some(key)) => Some((PathBuf::from(cert), PathBuf::from(key))),
            _ => None,
        }
    }

    /// Parsed listen address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr.parse().with_context(|| {
            format!(
                "DNS01_LISTEN_ADDR '{}' is not a valid socket address",
                self.listen_addr
            )
        })
    }

    /// Parsed provider mode
    pub fn mode(&self) -> Result<Mode> {
        match self.mode.to_lowercase().as_str() {
            "live" => Ok(Mode::Live),
            "dry-run" => Ok(Mode::DryRun),
            _ => anyhow::bail!(
                "DNS01_MODE '{}' is not supported. Supported modes: live, dry-run",
                self.mode
            ),
        }
    }

    /// TTL for created records
    pub fn record_ttl(&self) -> Result<u32> {
        let Some(raw) = &self.record_ttl else {
            return Ok(DEFAULT_RECORD_TTL);
        };

        let ttl: u32 = raw
            .trim()
            .parse()
            .with_context(|| format!("DNS01_RECORD_TTL '{}' is not a number", raw))?;

        if !(30..=86400).contains(&ttl) {
            anyhow::bail!(
                "DNS01_RECORD_TTL must be between 30 and 86400 seconds. Got: {}",
                ttl
            );
        }

        Ok(ttl)
    }

    /// Connection settings for the secret store's API server
    ///
    /// An explicit `DNS01_KUBE_API_URL` wins; otherwise the in-cluster
    /// service account is used.
    pub fn host_config(&self) -> Result<HostConfig> {
        match &self.kube_api_url {
            Some(url) => {
                let mut host = HostConfig::new(url.as_str());
                host.bearer_token_file = self.kube_token_file.as_ref().map(PathBuf::from);
                Ok(host)
            }
            None => HostConfig::in_cluster().context("cannot determine the API server"),
        }
    }
}
