//! Read-only lookup interfaces into the identity store.
//!
//! The gateway never writes roles or employees; implementations only need to
//! be safe for concurrent reads.

use std::sync::Arc;

use thiserror::Error;

use pmgate_core::EmployeeId;

use crate::{Employee, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}

pub trait RoleStore: Send + Sync {
    fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;
}

pub trait EmployeeStore: Send + Sync {
    fn find_employee_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;
}

impl<S> RoleStore for Arc<S>
where
    S: RoleStore + ?Sized,
{
    fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        (**self).find_role_by_name(name)
    }
}

impl<S> EmployeeStore for Arc<S>
where
    S: EmployeeStore + ?Sized,
{
    fn find_employee_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        (**self).find_employee_by_id(id)
    }
}
