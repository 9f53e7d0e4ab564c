//! JSON seed for the in-memory identity store.
//!
//! ```json
//! {
//!   "roles": [ { "name": "user", "permissions": [ { "path": "/cart/{id}", "action": "GET" } ] } ],
//!   "employees": [ { "id": 7, "role": "admin" } ]
//! }
//! ```
//!
//! Employees reference roles by name. A `null` role is an employee without a
//! role of its own.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use pmgate_auth::{Employee, Role};
use pmgate_core::{DomainError, EmployeeId};

use super::InMemoryIdentityStore;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub employees: Vec<EmployeeSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeSeed {
    pub id: EmployeeId,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid seed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("role '{role}' has an invalid permission: {source}")]
    InvalidPermission {
        role: String,
        #[source]
        source: DomainError,
    },

    #[error("role '{0}' is defined more than once")]
    DuplicateRole(String),

    #[error("employee {employee} references unknown role '{role}'")]
    UnknownRole { employee: EmployeeId, role: String },
}

impl SeedFile {
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

impl InMemoryIdentityStore {
    /// Build a store from a seed, validating every role and employee first.
    pub fn from_seed(seed: SeedFile) -> Result<Self, SeedError> {
        let mut roles: HashMap<String, Role> = HashMap::new();
        for role in seed.roles {
            for permission in &role.permissions {
                permission
                    .validate()
                    .map_err(|source| SeedError::InvalidPermission {
                        role: role.name.clone(),
                        source,
                    })?;
            }
            if roles.contains_key(&role.name) {
                return Err(SeedError::DuplicateRole(role.name));
            }
            roles.insert(role.name.clone(), role);
        }

        let mut employees = Vec::with_capacity(seed.employees.len());
        for employee in seed.employees {
            let role = match employee.role {
                None => None,
                Some(name) => match roles.get(&name) {
                    Some(role) => Some(role.clone()),
                    None => {
                        return Err(SeedError::UnknownRole {
                            employee: employee.id,
                            role: name,
                        });
                    }
                },
            };
            employees.push(Employee {
                id: employee.id,
                role,
            });
        }

        let store = InMemoryIdentityStore::new();
        for role in roles.into_values() {
            store.upsert_role(role);
        }
        for employee in employees {
            store.upsert_employee(employee);
        }

        tracing::info!(
            roles = store.role_count(),
            employees = store.employee_count(),
            "identity store seeded"
        );
        Ok(store)
    }
}
