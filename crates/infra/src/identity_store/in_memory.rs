use std::collections::HashMap;
use std::sync::RwLock;

use pmgate_auth::{Employee, EmployeeStore, Role, RoleStore, StoreError};
use pmgate_core::EmployeeId;

/// In-memory role and employee store for dev/tests.
///
/// Lookups take read locks only, so concurrent requests never contend with
/// each other. Writes are for seeding and admin tooling.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    roles: RwLock<HashMap<String, Role>>,
    employees: RwLock<HashMap<EmployeeId, Employee>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_role(&self, role: Role) {
        if let Ok(mut map) = self.roles.write() {
            map.insert(role.name.clone(), role);
        }
    }

    pub fn upsert_employee(&self, employee: Employee) {
        if let Ok(mut map) = self.employees.write() {
            map.insert(employee.id, employee);
        }
    }

    pub fn role_count(&self) -> usize {
        self.roles.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn employee_count(&self) -> usize {
        self.employees.read().map(|m| m.len()).unwrap_or(0)
    }
}

fn poisoned(what: &str) -> StoreError {
    StoreError::Unavailable(format!("{what} lock poisoned"))
}

impl RoleStore for InMemoryIdentityStore {
    fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let map = self.roles.read().map_err(|_| poisoned("role"))?;
        Ok(map.get(name).cloned())
    }
}

impl EmployeeStore for InMemoryIdentityStore {
    fn find_employee_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let map = self.employees.read().map_err(|_| poisoned("employee"))?;
        Ok(map.get(&id).cloned())
    }
}
