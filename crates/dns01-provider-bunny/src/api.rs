// # bunny.net API wire types
//
// Request and response bodies of the DNS zone endpoints, plus the mapping
// of HTTP failures onto provider errors. bunny.net uses PascalCase field
// names and integer record types.

use dns01_core::traits::{DnsRecord, NewRecord, RecordType, Zone};
use dns01_core::Error;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::PROVIDER_NAME;

/// A zone as returned by `GET /dnszone/{id}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ZoneBody {
    pub id: i64,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub records: Vec<RecordBody>,
}

/// A record inside a zone, also the body returned when creating one
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RecordBody {
    pub id: i64,
    #[serde(rename = "Type")]
    pub record_type: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub ttl: i64,
}

/// Body of `PUT /dnszone/{id}/records`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AddRecordBody<'a> {
    #[serde(rename = "Type")]
    pub record_type: i32,
    pub name: &'a str,
    pub value: &'a str,
    pub ttl: u32,
}

impl<'a> From<&'a NewRecord> for AddRecordBody<'a> {
    fn from(record: &'a NewRecord) -> Self {
        Self {
            record_type: record.record_type.0,
            name: &record.name,
            value: &record.value,
            ttl: record.ttl,
        }
    }
}

impl From<RecordBody> for DnsRecord {
    fn from(body: RecordBody) -> Self {
        DnsRecord {
            id: body.id,
            record_type: RecordType(body.record_type),
            name: body.name.unwrap_or_default(),
            value: body.value.unwrap_or_default(),
            // Negative or oversized TTLs never come from the API
            ttl: u32::try_from(body.ttl).unwrap_or_default(),
        }
    }
}

impl From<ZoneBody> for Zone {
    fn from(body: ZoneBody) -> Self {
        Zone {
            id: body.id,
            domain: body.domain.unwrap_or_default(),
            records: body.records.into_iter().map(DnsRecord::from).collect(),
        }
    }
}

/// Failure talking to the bunny.net API
#[derive(Debug, ThisError)]
pub enum ApiError {
    /// 401 / 403
    #[error(
        "Authentication failed: access key rejected or lacks permission. Status: {status} - {body}"
    )]
    Unauthorized { status: u16, body: String },

    /// 404 on the zone or record addressed
    #[error("{what} not found: {body}")]
    NotFound { what: String, body: String },

    /// 429
    #[error("Rate limit exceeded. Please retry later. Status: 429")]
    RateLimited,

    /// 5xx
    #[error("bunny.net server error (transient): {status} - {body}")]
    Server { status: u16, body: String },

    /// Any other non-success status
    #[error("{operation} failed: {status} - {body}")]
    Unexpected {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Connection, TLS or timeout failure
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Body was not what the endpoint documents
    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Map a non-success status onto an error
    pub(crate) fn from_status(
        status: reqwest::StatusCode,
        body: String,
        operation: &'static str,
        what: impl FnOnce() -> String,
    ) -> Self {
        match status.as_u16() {
            401 | 403 => ApiError::Unauthorized {
                status: status.as_u16(),
                body,
            },
            404 => ApiError::NotFound { what: what(), body },
            429 => ApiError::RateLimited,
            code @ 500..=599 => ApiError::Server { status: code, body },
            code => ApiError::Unexpected {
                operation,
                status: code,
                body,
            },
        }
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::provider(PROVIDER_NAME, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_body_parses_pascal_case() {
        let json = r#"{
            "Id": 4242,
            "Domain": "example.com",
            "Records": [
                {"Id": 1, "Type": 3, "Name": "_acme-challenge", "Value": "tokenA", "Ttl": 180},
                {"Id": 2, "Type": 0, "Name": "", "Value": "192.0.2.1", "Ttl": 300, "Weight": 0}
            ],
            "Nameserver1": "kiki.bunny.net"
        }"#;

        let zone: Zone = serde_json::from_str::<ZoneBody>(json).unwrap().into();
        assert_eq!(zone.id, 4242);
        assert_eq!(zone.domain, "example.com");
        assert_eq!(zone.records.len(), 2);
        assert_eq!(zone.records[0].record_type, RecordType::TXT);
        assert_eq!(zone.records[0].ttl, 180);
        assert_eq!(zone.records[1].name, "");
    }

    #[test]
    fn test_null_fields_default() {
        let json = r#"{"Id": 7, "Type": 3, "Name": null, "Value": null}"#;
        let record: DnsRecord = serde_json::from_str::<RecordBody>(json).unwrap().into();
        assert_eq!(record.name, "");
        assert_eq!(record.value, "");
        assert_eq!(record.ttl, 0);
    }

    #[test]
    fn test_add_body_serializes_pascal_case() {
        let record = NewRecord::txt("_acme-challenge", "token", 180);
        let body = serde_json::to_value(AddRecordBody::from(&record)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"Type": 3, "Name": "_acme-challenge", "Value": "token", "Ttl": 180})
        );
    }

    #[test]
    fn test_unauthorized_keeps_provider_message() {
        let err = ApiError::from_status(
            reqwest::StatusCode::FORBIDDEN,
            "Zone belongs to another account".to_string(),
            "Add record",
            || "Zone 1".to_string(),
        );
        let message = Error::from(err).to_string();
        assert!(message.contains("403"));
        assert!(message.contains("Zone belongs to another account"));
    }

    #[test]
    fn test_status_mapping() {
        let what = || "Zone 1".to_string();
        let status = |c| reqwest::StatusCode::from_u16(c).unwrap();

        assert!(matches!(
            ApiError::from_status(status(401), String::new(), "Get zone", what),
            ApiError::Unauthorized { status: 401, .. }
        ));
        assert!(matches!(
            ApiError::from_status(status(403), String::new(), "Get zone", what),
            ApiError::Unauthorized { status: 403, .. }
        ));
        assert!(matches!(
            ApiError::from_status(status(404), String::new(), "Get zone", what),
            ApiError::NotFound { .. }
        ));
        assert!(matches!(
            ApiError::from_status(status(429), String::new(), "Get zone", what),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(status(502), String::new(), "Get zone", what),
            ApiError::Server { status: 502, .. }
        ));
        assert!(matches!(
            ApiError::from_status(status(400), "bad".into(), "Get zone", what),
            ApiError::Unexpected { status: 400, .. }
        ));
    }

    #[test]
    fn test_converts_to_retryable_provider_error() {
        let err: Error = ApiError::RateLimited.into();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("bunny"));
    }
}
