use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::models::organization::{OrgRef, Organization};
use crate::models::user::UserIdentity;

/// Per-organization role. A user may hold different roles in different
/// organizations, so the role lives on the membership, never on the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberRole {
    Owner,
    Supervisor,
    Employee,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "member_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberStatus {
    Active,
    Inactive,
}

/// Membership row. `supervisor_id` references another membership row in the
/// same organization (the supervisor's membership, not their user id).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub supervisor_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Membership joined with the member's user identity.
#[derive(Debug, Clone, Serialize)]
pub struct MemberWithUser {
    #[serde(flatten)]
    pub member: Member,
    #[serde(rename = "User")]
    pub user: UserIdentity,
}

/// One entry of the organization-membership listing: the caller's
/// membership with its organization, its supervisor (if any) and the
/// members it supervises.
#[derive(Debug, Serialize)]
pub struct MembershipDetail {
    #[serde(flatten)]
    pub member: Member,
    #[serde(rename = "Organization")]
    pub organization: Organization,
    #[serde(rename = "Supervisor")]
    pub supervisor: Option<MemberWithUser>,
    #[serde(rename = "Employees")]
    pub employees: Vec<MemberWithUser>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    /// The supervisor's user id (their membership is resolved server-side).
    pub supervisor_id: Uuid,
    #[validate(length(min = 1, message = "at least one employee id is required"))]
    pub employee_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignResult {
    pub assigned_employees: i64,
    /// Supervisor's user id, kept for client-side display.
    pub supervisor_id: Uuid,
    /// Supervisor's membership id, the value written to each employee row.
    pub organization_member_id: Uuid,
    pub organization_id: Uuid,
}

/// Assignment-roster entry: a supervisor with the employees reporting to
/// them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorAssignments {
    pub supervisor_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub employees: Vec<RosterEmployee>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEmployee {
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub role: MemberRole,
    pub status: MemberStatus,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub role: MemberRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResult {
    pub user_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub organization: OrgRef,
    pub invite_sent: bool,
}
