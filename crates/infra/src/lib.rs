//! Infrastructure layer: identity store adapters.

pub mod identity_store;

pub use identity_store::{InMemoryIdentityStore, SeedError, SeedFile};
