//! Core traits for the DNS-01 solver
//!
//! This module defines the capability interfaces the solver is built on.
//!
//! - [`ZoneProvider`]: Read zones and create/delete records at the DNS provider
//! - [`SecretStore`]: Read credentials from the host's secret store
//! - [`Solver`]: The host-facing solver contract

pub mod zone_provider;
pub mod secret_store;
pub mod solver;

pub use zone_provider::{
    DnsRecord, NewRecord, RecordId, RecordType, Zone, ZoneProvider, ZoneProviderFactory,
};
pub use secret_store::{SecretData, SecretStore, SecretStoreFactory};
pub use solver::Solver;
