//! DNS-01 challenge solver
//!
//! The Dns01Solver is responsible for:
//! - Resolving the access key and zone of each challenge
//! - Publishing the challenge TXT record exactly once (Present)
//! - Removing exactly that record again (CleanUp)
//!
//! ## Flow
//!
//! ```text
//!  ChallengeRequest
//!        │
//!        ▼
//! ┌──────────────────┐   secret read   ┌─────────────┐
//! │ CredentialResolver│ ──────────────▶ │ SecretStore │
//! └──────────────────┘                 └─────────────┘
//!        │ access key, zone ID
//!        ▼
//! ┌──────────────────┐  get_zone / add_record / delete_record
//! │   Dns01Solver    │ ─────────────────────────────────────▶ ZoneProvider
//! └──────────────────┘
//!        │ find_match(records, record name, key)
//!        ▼
//!   create if absent / delete if present
//! ```
//!
//! No state is kept between calls: the provider's zone is fetched fresh
//! every time and is the only source of truth. Two concurrent Presents for
//! the same name and key may both create a record; identical TXT values are
//! harmless to validation, so this is left to the provider.

use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{HostConfig, SolverSettings};
use crate::credentials::{CredentialResolver, ResolvedCredentials};
use crate::error::{Error, Result};
use crate::matcher::find_match;
use crate::request::ChallengeRequest;
use crate::traits::{
    DnsRecord, NewRecord, SecretStore, SecretStoreFactory, Solver, ZoneProviderFactory,
};

/// Name the host dispatches to this solver by
pub const SOLVER_NAME: &str = "bunny";

/// Result of a Present call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The record did not exist and was created
    Created(DnsRecord),
    /// A matching record already existed (no-op)
    AlreadyPresent(DnsRecord),
}

/// Result of a CleanUp call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanUpOutcome {
    /// The matching record was deleted
    Deleted(DnsRecord),
    /// No matching record existed (no-op)
    NotFound,
}

/// ACME DNS-01 solver for bunny.net zones
///
/// ## Lifecycle
///
/// 1. Create with [`Dns01Solver::new()`]
/// 2. Call [`Solver::initialize()`] once to build the secret store client
/// 3. Call [`Dns01Solver::present()`] / [`Dns01Solver::clean_up()`] per
///    challenge, from as many tasks as needed
///
/// Before initialization only inline access keys can be resolved.
pub struct Dns01Solver {
    /// Startup settings (group name, record TTL)
    settings: SolverSettings,

    /// Builds authenticated provider clients per challenge
    provider_factory: Arc<dyn ZoneProviderFactory>,

    /// Builds the secret store client at initialization
    secret_store_factory: Option<Arc<dyn SecretStoreFactory>>,

    /// Set once by `initialize` (or `with_secret_store`)
    resolver: OnceLock<CredentialResolver>,
}

impl fmt::Debug for Dns01Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dns01Solver")
            .field("settings", &self.settings)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl Dns01Solver {
    /// Create a new solver
    ///
    /// # Parameters
    ///
    /// - `settings`: Startup settings
    /// - `provider_factory`: Builds provider clients from access keys
    /// - `secret_store_factory`: Builds the secret store at `initialize`;
    ///   `None` restricts the solver to inline access keys
    pub fn new(
        settings: SolverSettings,
        provider_factory: Arc<dyn ZoneProviderFactory>,
        secret_store_factory: Option<Arc<dyn SecretStoreFactory>>,
    ) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            settings,
            provider_factory,
            secret_store_factory,
            resolver: OnceLock::new(),
        })
    }

    /// Use an already-built secret store, skipping the factory
    ///
    /// Replaces any store given earlier. A later `initialize` keeps this
    /// store.
    pub fn with_secret_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.resolver = OnceLock::from(CredentialResolver::new(store));
        self
    }

    /// Startup settings
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Whether the secret store has been established
    pub fn is_initialized(&self) -> bool {
        self.resolver.get().is_some()
    }

    fn resolver(&self) -> CredentialResolver {
        self.resolver.get().cloned().unwrap_or_default()
    }

    async fn resolve(&self, request: &ChallengeRequest) -> Result<ResolvedCredentials> {
        request.validate()?;
        self.resolver()
            .resolve(request.config.as_ref(), &request.resource_namespace)
            .await
    }

    /// Ensure the challenge record exists
    ///
    /// # Errors
    ///
    /// Credential errors are returned before any provider call is made.
    /// Provider failures are returned as [`Error::Provider`], naming the
    /// record and zone.
    pub async fn present(&self, request: &ChallengeRequest) -> Result<PresentOutcome> {
        let creds = self.resolve(request).await?;
        let record_name = request.record_name();
        let zone_id = creds.zone_id;

        let provider = self.provider_factory.connect(&creds.access_key)?;
        let ctx = RecordContext {
            provider: provider.provider_name(),
            zone_id,
            record_name,
        };

        let zone = provider
            .get_zone(zone_id)
            .await
            .map_err(|e| ctx.wrap(e, "failed to get zone records"))?;

        if let Some(existing) = find_match(&zone.records, record_name, &request.key) {
            info!(
                zone_id,
                record_name,
                record_id = existing.id,
                "TXT record is present, skipping"
            );
            return Ok(PresentOutcome::AlreadyPresent(existing.clone()));
        }

        debug!(zone_id, record_name, value = %request.key, "Attempting to add TXT record");

        let record = NewRecord::txt(record_name, request.key.as_str(), self.settings.record_ttl);
        let created = provider
            .add_record(zone_id, record)
            .await
            .map_err(|e| ctx.wrap(e, "failed to add TXT record"))?;

        info!(zone_id, record_name, record_id = created.id, "Added TXT record");
        Ok(PresentOutcome::Created(created))
    }

    /// Ensure the exact challenge record no longer exists
    ///
    /// Other TXT records under the same name are never touched.
    ///
    /// # Errors
    ///
    /// Same as [`Dns01Solver::present`]. The host reports these on the
    /// challenge and tries again later.
    pub async fn clean_up(&self, request: &ChallengeRequest) -> Result<CleanUpOutcome> {
        let creds = self.resolve(request).await?;
        let record_name = request.record_name();
        let zone_id = creds.zone_id;

        let provider = self.provider_factory.connect(&creds.access_key)?;
        let ctx = RecordContext {
            provider: provider.provider_name(),
            zone_id,
            record_name,
        };

        let zone = provider
            .get_zone(zone_id)
            .await
            .map_err(|e| ctx.wrap(e, "failed to get zone records"))?;

        let Some(record) = find_match(&zone.records, record_name, &request.key).cloned() else {
            debug!(zone_id, record_name, "No matching TXT record, nothing to clean up");
            return Ok(CleanUpOutcome::NotFound);
        };

        provider
            .delete_record(zone_id, record.id)
            .await
            .map_err(|e| ctx.wrap(e, "failed to delete TXT record"))?;

        info!(zone_id, record_name, record_id = record.id, "Deleted TXT record");
        Ok(CleanUpOutcome::Deleted(record))
    }
}

/// The record a provider call is about
struct RecordContext<'a> {
    provider: &'static str,
    zone_id: i64,
    record_name: &'a str,
}

impl RecordContext<'_> {
    /// Attach the operation, zone and record to a provider failure
    ///
    /// Whatever the provider returned is reported as [`Error::Provider`] so
    /// the host treats it as possibly transient.
    fn wrap(&self, err: Error, operation: &str) -> Error {
        let (provider, message) = match err {
            Error::Provider { provider, message } => (provider, message),
            other => (self.provider.to_string(), other.to_string()),
        };

        Error::provider(
            provider,
            format!(
                "{} (record '{}', zone {}): {}",
                operation, self.record_name, self.zone_id, message
            ),
        )
    }
}

#[async_trait]
impl Solver for Dns01Solver {
    fn name(&self) -> &'static str {
        SOLVER_NAME
    }

    async fn present(&self, request: &ChallengeRequest) -> Result<()> {
        Dns01Solver::present(self, request).await.map(|_| ())
    }

    async fn clean_up(&self, request: &ChallengeRequest) -> Result<()> {
        Dns01Solver::clean_up(self, request).await.map(|_| ())
    }

    async fn initialize(&self, host: &HostConfig, shutdown: &watch::Receiver<bool>) -> Result<()> {
        if *shutdown.borrow() {
            return Err(Error::Other(
                "shutdown in progress, refusing to initialize".to_string(),
            ));
        }

        if self.is_initialized() {
            debug!("Solver already initialized");
            return Ok(());
        }

        let resolver = match &self.secret_store_factory {
            Some(factory) => {
                host.validate()?;
                CredentialResolver::new(factory.create(host)?)
            }
            None => {
                warn!("No secret store configured; only inline access keys can be used");
                CredentialResolver::inline_only()
            }
        };

        // A concurrent initialize may have won; its resolver is kept
        let _ = self.resolver.set(resolver);
        info!(group = %self.settings.group_name, solver = SOLVER_NAME, "Solver initialized");
        Ok(())
    }
}
