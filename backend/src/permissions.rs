//! Role-derived permission grants and the wildcard matcher.
//!
//! A permission is a `RESOURCE:ACTION:SCOPE` triple; `*` in a granted
//! segment matches anything. A route declares the permission entries that
//! admit it, and a caller passes when any of their role's grants satisfies
//! any required entry. Wildcards are honored on the grant side only: a
//! required entry of `USER:READ:*` is itself a specific entry that only a
//! `USER:READ:*` or broader grant satisfies, which is why route lists
//! enumerate both the wildcard and the narrowed form.

use std::fmt;

use crate::models::member::MemberRole;

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub resource: &'static str,
    pub action: &'static str,
    pub scope: &'static str,
}

impl Permission {
    pub const fn new(resource: &'static str, action: &'static str, scope: &'static str) -> Self {
        Self {
            resource,
            action,
            scope,
        }
    }

    /// Whether this grant satisfies a required permission. Each segment
    /// matches on equality or a wildcard in the grant.
    pub fn satisfies(&self, required: &Permission) -> bool {
        segment_matches(self.resource, required.resource)
            && segment_matches(self.action, required.action)
            && segment_matches(self.scope, required.scope)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.resource, self.action, self.scope)
    }
}

fn segment_matches(grant: &str, required: &str) -> bool {
    grant == WILDCARD || grant == required
}

const OWNER_GRANTS: &[Permission] = &[
    Permission::new("USER", "*", "*"),
    Permission::new("ORG", "*", "*"),
];

const SUPERVISOR_GRANTS: &[Permission] = &[
    Permission::new("USER", "READ", "ASSIGNED"),
    Permission::new("USER", "VIEW", "ASSIGNED"),
    Permission::new("USER", "ASSIGN", "ASSIGNED"),
];

const EMPLOYEE_GRANTS: &[Permission] = &[Permission::new("USER", "VIEW", "SELF")];

pub fn role_grants(role: MemberRole) -> &'static [Permission] {
    match role {
        MemberRole::Owner => OWNER_GRANTS,
        MemberRole::Supervisor => SUPERVISOR_GRANTS,
        MemberRole::Employee => EMPLOYEE_GRANTS,
    }
}

/// Whether a role passes a route's required permission list. An empty list
/// requires membership only.
pub fn is_allowed(role: MemberRole, required: &[Permission]) -> bool {
    if required.is_empty() {
        return true;
    }
    let grants = role_grants(role);
    required
        .iter()
        .any(|req| grants.iter().any(|grant| grant.satisfies(req)))
}

// Required-permission lists per route, mirroring the API surface.
pub const EMPLOYEES_READ: &[Permission] = &[
    Permission::new("USER", "*", "*"),
    Permission::new("USER", "READ", "*"),
    Permission::new("USER", "READ", "ASSIGNED"),
];

pub const ASSIGNMENTS_VIEW: &[Permission] = &[
    Permission::new("USER", "*", "*"),
    Permission::new("USER", "VIEW", "ASSIGNED"),
];

pub const ASSIGNMENTS_WRITE: &[Permission] = &[
    Permission::new("USER", "*", "*"),
    Permission::new("USER", "ASSIGN", "ASSIGNED"),
];

pub const INVITE: &[Permission] = &[
    Permission::new("USER", "*", "*"),
    Permission::new("USER", "INVITE", "*"),
];
