//! Solver registry
//!
//! The host picks a solver by the name in the issuer configuration. The
//! registry is that dispatch table: solvers register under their
//! [`Solver::name`] and are looked up per request.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dns01_core::SolverRegistry;
//!
//! let registry = SolverRegistry::new();
//! registry.register(Arc::new(solver));
//!
//! registry.initialize_all(&host, &shutdown_rx).await?;
//! let solver = registry.get("bunny").expect("registered above");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::info;

use crate::config::HostConfig;
use crate::error::Result;
use crate::traits::Solver;

/// Dispatch table from solver name to solver
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// lookups from request handlers.
#[derive(Default)]
pub struct SolverRegistry {
    solvers: RwLock<HashMap<String, Arc<dyn Solver>>>,
}

impl SolverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a solver under its own name
    ///
    /// A solver registered earlier under the same name is replaced.
    pub fn register(&self, solver: Arc<dyn Solver>) {
        let name = solver.name().to_string();
        let mut solvers = self.solvers.write().unwrap_or_else(|e| e.into_inner());
        solvers.insert(name, solver);
    }

    /// Look up a solver by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Solver>> {
        let solvers = self.solvers.read().unwrap_or_else(|e| e.into_inner());
        solvers.get(name).cloned()
    }

    /// Check if a solver is registered
    pub fn has_solver(&self, name: &str) -> bool {
        let solvers = self.solvers.read().unwrap_or_else(|e| e.into_inner());
        solvers.contains_key(name)
    }

    /// List all registered solver names, sorted
    pub fn list_solvers(&self) -> Vec<String> {
        let solvers = self.solvers.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = solvers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Initialize every registered solver
    ///
    /// Stops at the first failure, which the caller should treat as fatal.
    pub async fn initialize_all(
        &self,
        host: &HostConfig,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<()> {
        // Snapshot so the lock is not held across awaits
        let solvers: Vec<Arc<dyn Solver>> = {
            let guard = self.solvers.read().unwrap_or_else(|e| e.into_inner());
            guard.values().cloned().collect()
        };

        for solver in solvers {
            info!(solver = solver.name(), "Initializing solver");
            solver.initialize(host, shutdown).await?;
        }

        Ok(())
    }
}
