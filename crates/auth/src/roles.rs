use serde::{Deserialize, Serialize};

use pmgate_core::EmployeeId;

use crate::Permission;

/// Name of the role whose permissions every non-guest caller also inherits.
pub const GUEST_ROLE: &str = "guest";

/// Named, ordered bundle of permissions.
///
/// Order matters: permissions are evaluated in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn new(name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            name: name.into(),
            permissions,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Employee record as seen by the gateway: only the assigned role matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub role: Option<Role>,
}
