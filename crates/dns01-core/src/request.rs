//! Challenge requests as sent by the host
//!
//! Field names follow cert-manager's `acme.cert-manager.io/v1alpha1`
//! `ChallengeRequest` so the webhook can deserialize the host's payload
//! directly.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What the host is asking the solver to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeAction {
    /// Publish the TXT record
    Present,
    /// Remove the TXT record
    CleanUp,
}

/// One validation attempt, created by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// Unique ID of this request, echoed in the response
    #[serde(default)]
    pub uid: String,

    /// Requested action
    pub action: ChallengeAction,

    /// Challenge type, always `dns-01` for this solver
    #[serde(rename = "type", default)]
    pub challenge_type: String,

    /// Domain name being validated, as written in the certificate
    #[serde(default)]
    pub dns_name: String,

    /// Expected TXT record value
    pub key: String,

    /// Namespace used to scope secret lookups
    #[serde(default)]
    pub resource_namespace: String,

    /// Fully-qualified record name, with trailing dot
    #[serde(rename = "resolvedFQDN")]
    pub resolved_fqdn: String,

    /// Zone the record lives in, with trailing dot
    pub resolved_zone: String,

    /// Whether ambient credentials may be used (unused by this solver)
    #[serde(default)]
    pub allow_ambient_credentials: bool,

    /// Solver configuration from the issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl ChallengeRequest {
    /// Record label relative to the zone apex
    ///
    /// `_acme-challenge.example.com.` in zone `example.com.` gives
    /// `_acme-challenge`. Present and CleanUp both go through here so they
    /// always address the same record.
    pub fn record_name(&self) -> &str {
        let name = self
            .resolved_fqdn
            .strip_suffix(self.resolved_zone.as_str())
            .unwrap_or(&self.resolved_fqdn);
        name.strip_suffix('.').unwrap_or(name)
    }

    /// Check the parts of the request the solver relies on
    ///
    /// The key must be present and the FQDN must sit inside the resolved
    /// zone; anything else means the host broke its contract.
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::invalid_input(format!(
                "challenge {} has an empty key",
                self.resolved_fqdn
            )));
        }

        if self.resolved_zone.is_empty() || !self.resolved_fqdn.ends_with(&self.resolved_zone) {
            return Err(Error::invalid_input(format!(
                "FQDN '{}' is not inside zone '{}'",
                self.resolved_fqdn, self.resolved_zone
            )));
        }

        Ok(())
    }
}
