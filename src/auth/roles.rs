// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Back-office user roles.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access, including user management
/// - `Contractor` - Works loan applications, cannot manage users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Loan officer / contractor (least privilege)
    #[default]
    Contractor,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            (Role::Admin, _) => true,
            (Role::Contractor, Role::Contractor) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Contractor => write!(f, "contractor"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_all_privileges() {
        assert!(Role::Admin.has_privilege(Role::Admin));
        assert!(Role::Admin.has_privilege(Role::Contractor));
    }

    #[test]
    fn contractor_cannot_act_as_admin() {
        assert!(!Role::Contractor.has_privilege(Role::Admin));
        assert!(Role::Contractor.has_privilege(Role::Contractor));
    }

    #[test]
    fn displays_wire_name() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::Contractor.to_string(), "contractor");
    }

    #[test]
    fn default_role_is_contractor() {
        assert_eq!(Role::default(), Role::Contractor);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"contractor\"").unwrap(),
            Role::Contractor
        );
    }
}
