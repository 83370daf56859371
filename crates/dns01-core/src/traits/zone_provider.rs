// # Zone Provider Trait
//
// Defines the interface to the DNS provider's zone API.
//
// ## Implementations
//
// - bunny.net: `dns01-provider-bunny` crate
// - In-memory: `dns01_core::memory::MemoryZoneProvider` (tests, dry runs)
//
// ## Usage
//
// ```rust,ignore
// use dns01_core::traits::{NewRecord, ZoneProvider};
//
// let zone = provider.get_zone(12345).await?;
// let record = provider
//     .add_record(12345, NewRecord::txt("_acme-challenge", "token", 180))
//     .await?;
// provider.delete_record(12345, record.id).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider-assigned record identifier
pub type RecordId = i64;

/// Record type in the provider's integer scheme
///
/// bunny.net numbers its record types; only TXT matters to the solver, the
/// other values are carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordType(pub i32);

impl RecordType {
    /// A record
    pub const A: RecordType = RecordType(0);
    /// AAAA record
    pub const AAAA: RecordType = RecordType(1);
    /// CNAME record
    pub const CNAME: RecordType = RecordType(2);
    /// TXT record
    pub const TXT: RecordType = RecordType(3);
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RecordType::A => f.write_str("A"),
            RecordType::AAAA => f.write_str("AAAA"),
            RecordType::CNAME => f.write_str("CNAME"),
            RecordType::TXT => f.write_str("TXT"),
            RecordType(other) => write!(f, "TYPE{}", other),
        }
    }
}

/// A DNS record as stored by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// The record ID (provider-assigned)
    pub id: RecordId,
    /// The record type
    pub record_type: RecordType,
    /// Label relative to the zone apex, without trailing dot
    pub name: String,
    /// Record value
    pub value: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

/// A record to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    /// The record type
    pub record_type: RecordType,
    /// Label relative to the zone apex
    pub name: String,
    /// Record value
    pub value: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

impl NewRecord {
    /// Create a TXT record description
    pub fn txt(name: impl Into<String>, value: impl Into<String>, ttl: u32) -> Self {
        Self {
            record_type: RecordType::TXT,
            name: name.into(),
            value: value.into(),
            ttl,
        }
    }
}

/// A provider zone with its full record set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Zone ID
    pub id: i64,
    /// Zone apex domain, without trailing dot
    pub domain: String,
    /// Every record in the zone, in provider order
    pub records: Vec<DnsRecord>,
}

/// Trait for DNS provider zone APIs
///
/// Implementations are single-shot: one API call per method, no retries,
/// no caching, no background tasks. A failure is returned as
/// [`crate::Error::Provider`] and the host decides when to try again.
///
/// Implementations must be thread-safe; many challenges may be solved
/// concurrently against the same provider.
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// Fetch a zone together with all of its records
    async fn get_zone(&self, zone_id: i64) -> Result<Zone, crate::Error>;

    /// Create a record in a zone and return it as stored
    async fn add_record(&self, zone_id: i64, record: NewRecord)
    -> Result<DnsRecord, crate::Error>;

    /// Delete a record by its provider-assigned ID
    async fn delete_record(&self, zone_id: i64, record_id: RecordId)
    -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Builds provider clients for a given access key
///
/// The access key is resolved per challenge, so the solver holds a factory
/// (constructed once, sharing connection pools) and asks it for a client on
/// each call.
pub trait ZoneProviderFactory: Send + Sync {
    /// Create a ZoneProvider authenticated with `access_key`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] when the key is unusable (e.g. empty).
    fn connect(&self, access_key: &str) -> Result<Box<dyn ZoneProvider>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_display() {
        assert_eq!(RecordType::TXT.to_string(), "TXT");
        assert_eq!(RecordType(12).to_string(), "TYPE12");
    }

    #[test]
    fn test_record_type_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&RecordType::TXT).unwrap(), "3");
        let parsed: RecordType = serde_json::from_str("0").unwrap();
        assert_eq!(parsed, RecordType::A);
    }
}
