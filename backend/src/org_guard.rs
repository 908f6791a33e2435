//! Org-boundary validation and request authorization.
//!
//! `authorize` is the core of every protected organization route: it loads
//! the caller's membership in the target organization and checks the
//! route's required permissions against the role's grants. Membership
//! lookups return `Forbidden` rather than revealing whether the
//! organization exists for somebody else.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::member::{Member, MemberStatus};
use crate::models::organization::Organization;
use crate::permissions::{self, Permission};

const MEMBER_COLUMNS: &str =
    "id, user_id, organization_id, role, status, supervisor_id, created_at, updated_at";

/// Load an organization, failing with `ORG_NOT_FOUND` when it is missing
/// or INACTIVE.
pub async fn require_active_org(pool: &PgPool, org_id: Uuid) -> Result<Organization> {
    let org = sqlx::query_as::<_, Organization>(
        "SELECT id, name, status, created_at, updated_at
         FROM organizations
         WHERE id = $1 AND status = 'ACTIVE'",
    )
    .bind(org_id)
    .fetch_optional(pool)
    .await?;

    org.ok_or(AppError::OrgNotFound)
}

/// The caller's membership in an organization, if any.
pub async fn load_membership(
    pool: &PgPool,
    user_id: Uuid,
    org_id: Uuid,
) -> Result<Option<Member>> {
    let member = sqlx::query_as::<_, Member>(&format!(
        "SELECT {MEMBER_COLUMNS}
         FROM organization_members
         WHERE user_id = $1 AND organization_id = $2"
    ))
    .bind(user_id)
    .bind(org_id)
    .fetch_optional(pool)
    .await?;

    Ok(member)
}

/// Permission-checked gate for organization routes.
///
/// With an organization context, resolves the caller's membership (ACTIVE
/// required) and checks the route's permission list against the role's
/// grants; without one, only an empty permission list passes, since there
/// is no role to derive grants from. Read-only: returns the membership for
/// the handler to use.
pub async fn authorize(
    pool: &PgPool,
    auth: &AuthUser,
    org_id: Option<Uuid>,
    required: &[Permission],
) -> Result<Option<Member>> {
    let Some(org_id) = org_id else {
        if required.is_empty() {
            return Ok(None);
        }
        return Err(AppError::Forbidden);
    };

    let member = load_membership(pool, auth.id, org_id)
        .await?
        .ok_or(AppError::Forbidden)?;

    if member.status != MemberStatus::Active {
        return Err(AppError::Forbidden);
    }

    if !permissions::is_allowed(member.role, required) {
        tracing::debug!(
            user = %auth.email,
            org = %org_id,
            role = ?member.role,
            "permission check failed"
        );
        return Err(AppError::Forbidden);
    }

    Ok(Some(member))
}
