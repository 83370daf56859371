// # Solver Trait
//
// The contract between a challenge solver and the host that drives it.
//
// The host looks the solver up by `name()`, calls `initialize()` once at
// startup, then calls `present()` and `clean_up()` for each challenge,
// possibly many at a time.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::config::HostConfig;
use crate::request::ChallengeRequest;

/// Host-facing interface of an ACME DNS-01 solver
#[async_trait]
pub trait Solver: Send + Sync {
    /// Fixed, lowercase, DNS-label-safe identifier used for dispatch
    ///
    /// Must be stable across versions: it is part of the issuer
    /// configuration users write.
    fn name(&self) -> &'static str;

    /// Ensure the TXT record for `request` exists
    ///
    /// Must be idempotent: presenting an already-presented challenge
    /// succeeds without creating a duplicate.
    async fn present(&self, request: &ChallengeRequest) -> Result<(), crate::Error>;

    /// Ensure the exact TXT record for `request` no longer exists
    ///
    /// Records with the same name but another value belong to other
    /// challenges and are left alone. Cleaning up a record that is already
    /// gone succeeds.
    async fn clean_up(&self, request: &ChallengeRequest) -> Result<(), crate::Error>;

    /// Establish long-lived clients
    ///
    /// Called once at startup. A failure is fatal to the host process.
    /// `shutdown` turns `true` when the host is stopping.
    async fn initialize(
        &self,
        host: &HostConfig,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<(), crate::Error>;
}
