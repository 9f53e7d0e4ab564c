//! Caller → role resolution with the guest fallback chain.

use std::sync::Arc;

use pmgate_core::{CallerId, EmployeeId};

use crate::roles::GUEST_ROLE;
use crate::store::{EmployeeStore, RoleStore, StoreError};
use crate::{CallerType, Permission, Role};

/// Outcome of resolving a caller to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Caller type after policy downgrades (an unknown employee becomes a guest).
    pub effective_type: CallerType,
    /// `None` means no permissions at all.
    pub role: Option<Role>,
}

impl Resolution {
    /// Ordered permission sequence to evaluate for this caller.
    ///
    /// Non-guest callers get the guest role's permissions appended after their
    /// own. The stored roles are left untouched and nothing is deduplicated.
    pub fn effective_permissions(&self, guest_role: Option<&Role>) -> Vec<Permission> {
        let Some(role) = &self.role else {
            return Vec::new();
        };

        let inherited: &[Permission] = match guest_role {
            Some(guest) if !self.effective_type.is_guest() => guest.permissions.as_slice(),
            _ => &[],
        };

        role.permissions
            .iter()
            .chain(inherited)
            .cloned()
            .collect()
    }
}

/// Maps `(caller type, caller id)` to a role through the identity store.
#[derive(Clone)]
pub struct IdentityResolver {
    roles: Arc<dyn RoleStore>,
    employees: Arc<dyn EmployeeStore>,
}

impl IdentityResolver {
    pub fn new(roles: Arc<dyn RoleStore>, employees: Arc<dyn EmployeeStore>) -> Self {
        Self { roles, employees }
    }

    /// Resolve the caller's role.
    ///
    /// - employees use the role on their employee record; an id with no record
    ///   downgrades the caller to `guest`
    /// - otherwise the role named after the caller type
    /// - users with no `user` role fall back to the `guest` role
    pub fn resolve(&self, caller_type: &CallerType, caller_id: CallerId) -> Result<Resolution, StoreError> {
        let mut effective_type = caller_type.clone();
        let mut role = None;

        if *caller_type == CallerType::Employee {
            match self.employees.find_employee_by_id(EmployeeId::from(caller_id))? {
                Some(employee) => role = employee.role,
                None => {
                    tracing::debug!(%caller_id, "no employee record; downgrading to guest");
                    effective_type = CallerType::Guest;
                }
            }
        }

        if role.is_none() {
            role = self.roles.find_role_by_name(effective_type.as_str())?;
        }

        if role.is_none() && effective_type == CallerType::User {
            role = self.roles.find_role_by_name(GUEST_ROLE)?;
        }

        Ok(Resolution {
            effective_type,
            role,
        })
    }

    pub fn guest_role(&self) -> Result<Option<Role>, StoreError> {
        self.roles.find_role_by_name(GUEST_ROLE)
    }
}
