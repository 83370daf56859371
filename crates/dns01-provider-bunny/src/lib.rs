// # bunny.net DNS Provider
//
// This crate implements `ZoneProvider` over the bunny.net DNS zone API.
//
// ## Behavior
//
// - One HTTP request per trait call; no retries, no backoff, no caching
//   (the host reschedules failed challenges)
// - HTTP timeout of 30 seconds on a client shared by every connection
// - Specific error messages for 401/403, 404, 429 and 5xx responses, with
//   the provider's response body kept
// - Dry-run mode: zone reads are performed, mutations are logged and skipped
//
// ## Security Requirements
//
// - The access key NEVER appears in logs or Debug output
// - An empty access key is rejected before any request is made
//
// ## API Reference
//
// - Get zone (with records): GET `/dnszone/:zone_id`
// - Add record: PUT `/dnszone/:zone_id/records`
// - Delete record: DELETE `/dnszone/:zone_id/records/:record_id`
// - Authentication: `AccessKey: <key>` header

mod api;

pub use api::ApiError;

use api::{AddRecordBody, RecordBody, ZoneBody};
use async_trait::async_trait;
use dns01_core::traits::{DnsRecord, NewRecord, RecordId, Zone, ZoneProvider, ZoneProviderFactory};
use dns01_core::{Error, Result};
use reqwest::header::ACCEPT;
use std::time::Duration;

/// Name reported in provider errors
pub const PROVIDER_NAME: &str = "bunny";

/// bunny.net API base URL
pub const BUNNY_API_BASE: &str = "https://api.bunny.net";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Authentication header carrying the account access key
const ACCESS_KEY_HEADER: &str = "AccessKey";

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

/// bunny.net zone provider bound to one access key
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform zone GET requests
/// - Log the intended PUT / DELETE
/// - **NOT** modify any records
///
/// A dry-run `add_record` returns the record it would have created with
/// ID 0.
pub struct BunnyProvider {
    /// Account access key
    /// ⚠️ NEVER log this value
    access_key: String,

    /// API base URL, without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip mutations
    dry_run: bool,
}

// Custom Debug implementation that hides the access key
impl std::fmt::Debug for BunnyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BunnyProvider")
            .field("access_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl BunnyProvider {
    /// Create a provider against the public API with its own HTTP client
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the access key is empty or the HTTP
    /// client cannot be built.
    pub fn new(access_key: impl Into<String>, dry_run: bool) -> Result<Self> {
        Self::with_client(access_key, BUNNY_API_BASE, build_client()?, dry_run)
    }

    /// Create a provider on an existing HTTP client and base URL
    pub fn with_client(
        access_key: impl Into<String>,
        base_url: impl Into<String>,
        client: reqwest::Client,
        dry_run: bool,
    ) -> Result<Self> {
        let access_key = access_key.into();
        if access_key.is_empty() {
            return Err(Error::config("bunny.net access key cannot be empty"));
        }

        Ok(Self {
            access_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            dry_run,
        })
    }

    /// Whether mutations are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn zone_url(&self, zone_id: i64) -> String {
        format!("{}/dnszone/{}", self.base_url, zone_id)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(ACCESS_KEY_HEADER, &self.access_key)
            .header(ACCEPT, "application/json")
    }

    /// Send a request and turn a non-success status into an `ApiError`
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        operation: &'static str,
        what: impl FnOnce() -> String,
    ) -> std::result::Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        Err(ApiError::from_status(status, body, operation, what))
    }

    async fn fetch_zone(&self, zone_id: i64) -> std::result::Result<Zone, ApiError> {
        let url = self.zone_url(zone_id);
        let response = self
            .send(self.request(reqwest::Method::GET, &url), "Get zone", || {
                format!("Zone {}", zone_id)
            })
            .await?;

        let body = response.text().await?;
        let zone: ZoneBody = serde_json::from_str(&body)?;
        Ok(zone.into())
    }

    async fn create_record(
        &self,
        zone_id: i64,
        record: &NewRecord,
    ) -> std::result::Result<DnsRecord, ApiError> {
        let url = format!("{}/records", self.zone_url(zone_id));
        let builder = self
            .request(reqwest::Method::PUT, &url)
            .json(&AddRecordBody::from(record));

        let response = self
            .send(builder, "Add record", || format!("Zone {}", zone_id))
            .await?;

        let body = response.text().await?;
        let created: RecordBody = serde_json::from_str(&body)?;
        Ok(created.into())
    }

    async fn remove_record(
        &self,
        zone_id: i64,
        record_id: RecordId,
    ) -> std::result::Result<(), ApiError> {
        let url = format!("{}/records/{}", self.zone_url(zone_id), record_id);
        self.send(self.request(reqwest::Method::DELETE, &url), "Delete record", || {
            format!("Record {} in zone {}", record_id, zone_id)
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ZoneProvider for BunnyProvider {
    async fn get_zone(&self, zone_id: i64) -> Result<Zone> {
        tracing::debug!(zone_id, "Fetching bunny.net zone");

        let zone = self.fetch_zone(zone_id).await?;

        tracing::debug!(zone_id, records = zone.records.len(), "Fetched bunny.net zone");
        Ok(zone)
    }

    async fn add_record(&self, zone_id: i64, record: NewRecord) -> Result<DnsRecord> {
        if self.dry_run {
            tracing::info!(
                zone_id,
                record_name = %record.name,
                record_type = %record.record_type,
                ttl = record.ttl,
                "[DRY-RUN] Would add record"
            );
            return Ok(DnsRecord {
                id: 0,
                record_type: record.record_type,
                name: record.name,
                value: record.value,
                ttl: record.ttl,
            });
        }

        let created = self.create_record(zone_id, &record).await?;

        tracing::debug!(zone_id, record_id = created.id, "bunny.net record created");
        Ok(created)
    }

    async fn delete_record(&self, zone_id: i64, record_id: RecordId) -> Result<()> {
        if self.dry_run {
            tracing::info!(zone_id, record_id, "[DRY-RUN] Would delete record");
            return Ok(());
        }

        self.remove_record(zone_id, record_id).await?;

        tracing::debug!(zone_id, record_id, "bunny.net record deleted");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for bunny.net providers
///
/// Holds one HTTP client; every connection made through the factory shares
/// its connection pool.
#[derive(Debug, Clone)]
pub struct BunnyProviderFactory {
    client: reqwest::Client,
    base_url: String,
    dry_run: bool,
}

impl BunnyProviderFactory {
    /// Factory for the public API in live mode
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: BUNNY_API_BASE.to_string(),
            dry_run: false,
        })
    }

    /// Point connections at another API endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Enable or disable dry-run mode for every connection
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        if dry_run {
            tracing::warn!("bunny.net provider running in DRY-RUN mode - no records will be changed");
        }
        self.dry_run = dry_run;
        self
    }

    /// Configured API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ZoneProviderFactory for BunnyProviderFactory {
    fn connect(&self, access_key: &str) -> Result<Box<dyn ZoneProvider>> {
        Ok(Box::new(BunnyProvider::with_client(
            access_key,
            self.base_url.as_str(),
            self.client.clone(),
            self.dry_run,
        )?))
    }
}
