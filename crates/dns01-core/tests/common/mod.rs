//! Test doubles and common utilities for solver contract tests
//!
//! The doubles wrap the in-memory collaborators and count every call, so
//! tests can assert not only on the resulting zone but on which provider
//! and secret store calls were (or were not) made.

#![allow(dead_code)]

use dns01_core::config::SolverSettings;
use dns01_core::error::{Error, Result};
use dns01_core::memory::{MemorySecretStore, MemoryZoneProvider};
use dns01_core::request::{ChallengeAction, ChallengeRequest};
use dns01_core::traits::{
    DnsRecord, NewRecord, RecordId, RecordType, SecretData, SecretStore, Zone, ZoneProvider,
    ZoneProviderFactory,
};
use dns01_core::Dns01Solver;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const ZONE_ID: i64 = 4242;
pub const NAMESPACE: &str = "cert-manager";
pub const SECRET_NAME: &str = "bunny-credentials";
pub const SECRET_KEY: &str = "access-key";
pub const ACCESS_KEY: &str = "bunny-access-key-0001";

/// Call counters shared between a provider double and the test
#[derive(Debug, Default)]
pub struct ProviderCalls {
    pub connect: AtomicUsize,
    pub get_zone: AtomicUsize,
    pub add_record: AtomicUsize,
    pub delete_record: AtomicUsize,
}

impl ProviderCalls {
    /// Total number of provider API calls (connections excluded)
    pub fn api_calls(&self) -> usize {
        self.get_zone.load(Ordering::SeqCst)
            + self.add_record.load(Ordering::SeqCst)
            + self.delete_record.load(Ordering::SeqCst)
    }

    pub fn adds(&self) -> usize {
        self.add_record.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.delete_record.load(Ordering::SeqCst)
    }
}

/// A ZoneProvider over a MemoryZoneProvider that counts calls and can be
/// told to fail mutations
#[derive(Clone)]
pub struct CountingZoneProvider {
    inner: MemoryZoneProvider,
    calls: Arc<ProviderCalls>,
    fail_mutations: Arc<AtomicBool>,
}

impl CountingZoneProvider {
    pub fn new(inner: MemoryZoneProvider) -> Self {
        Self {
            inner,
            calls: Arc::new(ProviderCalls::default()),
            fail_mutations: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn calls(&self) -> &ProviderCalls {
        &self.calls
    }

    /// Make add_record and delete_record fail from now on
    pub fn fail_mutations(&self) {
        self.fail_mutations.store(true, Ordering::SeqCst);
    }

    pub fn memory(&self) -> &MemoryZoneProvider {
        &self.inner
    }

    fn check_mutation(&self) -> Result<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(Error::provider("counting", "HTTP 503: service unavailable"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ZoneProvider for CountingZoneProvider {
    async fn get_zone(&self, zone_id: i64) -> Result<Zone> {
        self.calls.get_zone.fetch_add(1, Ordering::SeqCst);
        self.inner.get_zone(zone_id).await
    }

    async fn add_record(&self, zone_id: i64, record: NewRecord) -> Result<DnsRecord> {
        self.calls.add_record.fetch_add(1, Ordering::SeqCst);
        self.check_mutation()?;
        self.inner.add_record(zone_id, record).await
    }

    async fn delete_record(&self, zone_id: i64, record_id: RecordId) -> Result<()> {
        self.calls.delete_record.fetch_add(1, Ordering::SeqCst);
        self.check_mutation()?;
        self.inner.delete_record(zone_id, record_id).await
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

impl ZoneProviderFactory for CountingZoneProvider {
    fn connect(&self, access_key: &str) -> Result<Box<dyn ZoneProvider>> {
        self.calls.connect.fetch_add(1, Ordering::SeqCst);
        // Let the memory provider check the key
        self.inner.connect(access_key)?;
        Ok(Box::new(self.clone()))
    }
}

/// A SecretStore over a MemorySecretStore that counts reads
#[derive(Clone, Default)]
pub struct CountingSecretStore {
    inner: MemorySecretStore,
    reads: Arc<AtomicUsize>,
}

impl CountingSecretStore {
    pub fn new(inner: MemorySecretStore) -> Self {
        Self {
            inner,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SecretStore for CountingSecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretData>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_secret(namespace, name).await
    }
}

/// A solver wired to counting doubles, with the access key stored in
/// `NAMESPACE/SECRET_NAME` and an empty zone `ZONE_ID`
pub struct Harness {
    pub solver: Arc<Dns01Solver>,
    pub provider: CountingZoneProvider,
    pub secrets: CountingSecretStore,
}

impl Harness {
    pub async fn new() -> Self {
        let memory = MemoryZoneProvider::new().with_access_key(ACCESS_KEY);
        memory.create_zone(ZONE_ID, "example.com").await;
        let provider = CountingZoneProvider::new(memory);

        let store = MemorySecretStore::new();
        store.insert(NAMESPACE, SECRET_NAME, SECRET_KEY, ACCESS_KEY);
        let secrets = CountingSecretStore::new(store);

        let solver = Dns01Solver::new(
            SolverSettings::new("acme.example.com").expect("valid settings"),
            Arc::new(provider.clone()),
            None,
        )
        .expect("solver construction succeeds")
        .with_secret_store(Arc::new(secrets.clone()));

        Self {
            solver: Arc::new(solver),
            provider,
            secrets,
        }
    }

    /// Current zone snapshot
    pub async fn zone(&self) -> Zone {
        self.provider
            .memory()
            .get_zone(ZONE_ID)
            .await
            .expect("zone exists")
    }

    /// TXT records in the zone with this name
    pub async fn txt_records(&self, name: &str) -> Vec<DnsRecord> {
        self.zone()
            .await
            .records
            .into_iter()
            .filter(|r| r.record_type == RecordType::TXT && r.name == name)
            .collect()
    }

    /// Seed a record directly into the zone
    pub async fn seed_txt(&self, id: RecordId, name: &str, value: &str) {
        self.provider
            .memory()
            .insert_record(
                ZONE_ID,
                DnsRecord {
                    id,
                    record_type: RecordType::TXT,
                    name: name.to_string(),
                    value: value.to_string(),
                    ttl: 180,
                },
            )
            .await
            .expect("seed succeeds");
    }
}

/// Config blob pointing at the harness secret
pub fn secret_ref_config() -> serde_json::Value {
    json!({
        "accessKeySecretRef": { "name": SECRET_NAME, "key": SECRET_KEY },
        "zoneId": ZONE_ID
    })
}

/// A challenge for `_acme-challenge.example.com.` with the given key
pub fn challenge(key: &str) -> ChallengeRequest {
    challenge_for("_acme-challenge.example.com.", key)
}

/// A challenge for an arbitrary FQDN in `example.com.`
pub fn challenge_for(fqdn: &str, key: &str) -> ChallengeRequest {
    ChallengeRequest {
        uid: format!("uid-{}", key),
        action: ChallengeAction::Present,
        challenge_type: "dns-01".to_string(),
        dns_name: "example.com".to_string(),
        key: key.to_string(),
        resource_namespace: NAMESPACE.to_string(),
        resolved_fqdn: fqdn.to_string(),
        resolved_zone: "example.com.".to_string(),
        allow_ambient_credentials: false,
        config: Some(secret_ref_config()),
    }
}
