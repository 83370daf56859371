// # Memory Zone Provider
//
// In-memory implementation of ZoneProvider.
//
// ## Purpose
//
// Behaves like the provider API (fresh IDs on create, not-found errors on
// unknown zones and records) without any network access. Useful for tests,
// embedded usage and dry runs of the webhook.
//
// ## Sharing
//
// Clones share the same zones, so a clone handed to the solver and one kept
// by a test observe the same state.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::traits::{DnsRecord, NewRecord, RecordId, Zone, ZoneProvider, ZoneProviderFactory};
use crate::{Error, Result};

/// In-memory zone provider
///
/// # Example
///
/// ```rust,no_run
/// use dns01_core::memory::MemoryZoneProvider;
/// use dns01_core::traits::{NewRecord, ZoneProvider};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = MemoryZoneProvider::new();
///     provider.create_zone(1, "example.com").await;
///
///     provider
///         .add_record(1, NewRecord::txt("_acme-challenge", "token", 180))
///         .await?;
///
///     let zone = provider.get_zone(1).await?;
///     assert_eq!(zone.records.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryZoneProvider {
    zones: Arc<RwLock<HashMap<i64, Zone>>>,
    next_record_id: Arc<AtomicI64>,
    access_key: Option<String>,
}

impl MemoryZoneProvider {
    /// Create a provider without zones that accepts any access key
    pub fn new() -> Self {
        Self {
            zones: Arc::new(RwLock::new(HashMap::new())),
            next_record_id: Arc::new(AtomicI64::new(1)),
            access_key: None,
        }
    }

    /// Only accept connections made with this access key
    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    /// Create an empty zone, replacing any zone with the same ID
    pub async fn create_zone(&self, zone_id: i64, domain: impl Into<String>) {
        let zone = Zone {
            id: zone_id,
            domain: domain.into(),
            records: Vec::new(),
        };
        self.zones.write().await.insert(zone_id, zone);
    }

    /// Insert a record as-is, bypassing ID assignment
    ///
    /// # Errors
    ///
    /// Fails when the zone does not exist.
    pub async fn insert_record(&self, zone_id: i64, record: DnsRecord) -> Result<()> {
        let mut zones = self.zones.write().await;
        let zone = zones
            .get_mut(&zone_id)
            .ok_or_else(|| zone_not_found(zone_id))?;

        // Keep generated IDs clear of manually inserted ones
        self.next_record_id
            .fetch_max(record.id + 1, Ordering::SeqCst);
        zone.records.push(record);
        Ok(())
    }

    /// Number of records in a zone (0 for unknown zones)
    pub async fn record_count(&self, zone_id: i64) -> usize {
        self.zones
            .read()
            .await
            .get(&zone_id)
            .map_or(0, |zone| zone.records.len())
    }
}

impl Default for MemoryZoneProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn zone_not_found(zone_id: i64) -> Error {
    Error::provider("memory", format!("zone {} not found", zone_id))
}

#[async_trait]
impl ZoneProvider for MemoryZoneProvider {
    async fn get_zone(&self, zone_id: i64) -> Result<Zone> {
        self.zones
            .read()
            .await
            .get(&zone_id)
            .cloned()
            .ok_or_else(|| zone_not_found(zone_id))
    }

    async fn add_record(&self, zone_id: i64, record: NewRecord) -> Result<DnsRecord> {
        let mut zones = self.zones.write().await;
        let zone = zones
            .get_mut(&zone_id)
            .ok_or_else(|| zone_not_found(zone_id))?;

        let created = DnsRecord {
            id: self.next_record_id.fetch_add(1, Ordering::SeqCst),
            record_type: record.record_type,
            name: record.name,
            value: record.value,
            ttl: record.ttl,
        };
        zone.records.push(created.clone());
        Ok(created)
    }

    async fn delete_record(&self, zone_id: i64, record_id: RecordId) -> Result<()> {
        let mut zones = self.zones.write().await;
        let zone = zones
            .get_mut(&zone_id)
            .ok_or_else(|| zone_not_found(zone_id))?;

        let position = zone
            .records
            .iter()
            .position(|record| record.id == record_id)
            .ok_or_else(|| {
                Error::provider(
                    "memory",
                    format!("record {} not found in zone {}", record_id, zone_id),
                )
            })?;
        zone.records.remove(position);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

impl ZoneProviderFactory for MemoryZoneProvider {
    fn connect(&self, access_key: &str) -> Result<Box<dyn ZoneProvider>> {
        if access_key.is_empty() {
            return Err(Error::config("access key cannot be empty"));
        }

        if let Some(expected) = &self.access_key
            && expected != access_key
        {
            return Err(Error::provider(
                "memory",
                "Authentication failed: access key rejected",
            ));
        }

        Ok(Box::new(self.clone()))
    }
}
