//! `pmgate-core` — identifiers and the error model shared by the gateway crates.
//!
//! Nothing in here knows about HTTP, tokens, or storage.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{CallerId, EmployeeId};
