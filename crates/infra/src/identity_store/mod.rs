//! Role/employee storage backing the gateway's lookup traits.

pub mod in_memory;
pub mod seed;

pub use in_memory::InMemoryIdentityStore;
pub use seed::{EmployeeSeed, SeedError, SeedFile};
