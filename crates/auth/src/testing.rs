//! Store fixtures shared by unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use pmgate_core::EmployeeId;

use crate::resolve::IdentityResolver;
use crate::store::{EmployeeStore, RoleStore, StoreError};
use crate::{Employee, Permission, Role};

#[derive(Default)]
pub struct FixtureStore {
    pub roles: HashMap<String, Role>,
    pub employees: HashMap<EmployeeId, Employee>,
}

impl FixtureStore {
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role.name.clone(), role);
        self
    }

    pub fn with_employee(mut self, id: i64, role: Option<Role>) -> Self {
        let id = EmployeeId::new(id);
        self.employees.insert(id, Employee { id, role });
        self
    }

    pub fn resolver(self) -> IdentityResolver {
        let store = Arc::new(self);
        IdentityResolver::new(store.clone(), store)
    }
}

impl RoleStore for FixtureStore {
    fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        Ok(self.roles.get(name).cloned())
    }
}

impl EmployeeStore for FixtureStore {
    fn find_employee_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        Ok(self.employees.get(&id).cloned())
    }
}

pub struct BrokenStore;

impl RoleStore for BrokenStore {
    fn find_role_by_name(&self, _: &str) -> Result<Option<Role>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

impl EmployeeStore for BrokenStore {
    fn find_employee_by_id(&self, _: EmployeeId) -> Result<Option<Employee>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

pub fn role(name: &str, rules: &[(&str, &str)]) -> Role {
    Role::new(
        name,
        rules.iter().map(|(path, action)| Permission::new(*path, *action)).collect(),
    )
}
