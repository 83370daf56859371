// # In-Memory Collaborators
//
// Implementations of the capability traits that keep everything in process.

pub mod secret;
pub mod zone;

pub use secret::MemorySecretStore;
pub use zone::MemoryZoneProvider;
