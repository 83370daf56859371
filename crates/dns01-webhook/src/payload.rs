// Wire types of the cert-manager webhook API
//
// The host POSTs a `ChallengePayload` carrying a `request` and expects the
// same envelope back carrying a `response`.

use dns01_core::{ChallengeRequest, Error};
use serde::{Deserialize, Serialize};

/// API version of the challenge envelope
pub const PAYLOAD_API_VERSION: &str = "webhook.acme.cert-manager.io/v1alpha1";

/// Kind of the challenge envelope
pub const PAYLOAD_KIND: &str = "ChallengePayload";

/// Version segment of the webhook API path
pub const API_VERSION: &str = "v1alpha1";

/// Challenge envelope exchanged with the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ChallengeRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChallengeResponse>,
}

impl ChallengePayload {
    /// Envelope answering a request
    pub fn reply(response: ChallengeResponse) -> Self {
        Self {
            api_version: PAYLOAD_API_VERSION.to_string(),
            kind: PAYLOAD_KIND.to_string(),
            request: None,
            response: Some(response),
        }
    }
}

/// Outcome of one challenge request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    /// UID of the request this answers
    pub uid: String,

    pub success: bool,

    /// Failure detail, set when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResponseStatus>,
}

impl ChallengeResponse {
    pub fn success(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            success: true,
            status: None,
        }
    }

    /// Failed response carrying the error as the challenge reason
    pub fn failure(uid: impl Into<String>, err: &Error) -> Self {
        Self {
            uid: uid.into(),
            success: false,
            status: Some(ResponseStatus {
                message: err.to_string(),
                reason: failure_reason(err).to_string(),
            }),
        }
    }
}

/// Failure detail shown on the challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStatus {
    pub message: String,

    /// Machine-readable category of the failure
    #[serde(default)]
    pub reason: String,
}

fn failure_reason(err: &Error) -> &'static str {
    match err {
        Error::Config(_) | Error::MissingSecretReference(_) => "InvalidConfiguration",
        Error::SecretLookup { .. } => "SecretNotAvailable",
        Error::Provider { .. } => "ProviderError",
        Error::NotInitialized(_) => "NotInitialized",
        Error::InvalidInput(_) => "BadRequest",
        Error::Other(_) => "InternalError",
    }
}
