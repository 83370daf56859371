// # dns01-core
//
// Core library for the bunny.net ACME DNS-01 solver.
//
// ## Architecture Overview
//
// This library provides the record-presence protocol behind DNS-01
// validation:
// - **ZoneProvider**: Trait for reading zones and creating/deleting records
// - **SecretStore**: Trait for reading the provider access key
// - **CredentialResolver**: Turns a challenge's config into access key + zone
// - **find_match**: Picks the one record that belongs to a challenge
// - **Dns01Solver**: Present / CleanUp / Initialize over the pieces above
// - **SolverRegistry**: Name-based dispatch table for the host
//
// ## Design Principles
//
// 1. **Idempotency**: Present and CleanUp can be repeated safely
// 2. **Exact matching**: Only the record with the challenge's own value is
//    ever touched, so concurrent challenges for one name coexist
// 3. **Stateless**: The provider zone is the only source of truth
// 4. **Injected capabilities**: Provider and secret store are traits, so
//    the protocol is tested without network access

pub mod traits;
pub mod solver;
pub mod registry;
pub mod config;
pub mod credentials;
pub mod error;
pub mod matcher;
pub mod memory;
pub mod request;

// Re-export core types for convenience
pub use traits::{SecretStore, Solver, ZoneProvider};
pub use solver::{CleanUpOutcome, Dns01Solver, PresentOutcome, SOLVER_NAME};
pub use registry::SolverRegistry;
pub use config::{AccessKeySource, HostConfig, SecretKeySelector, SolverConfig, SolverSettings};
pub use credentials::{CredentialResolver, ResolvedCredentials};
pub use error::{Error, Result};
pub use matcher::find_match;
pub use memory::{MemorySecretStore, MemoryZoneProvider};
pub use request::{ChallengeAction, ChallengeRequest};
