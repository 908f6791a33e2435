use std::collections::HashMap;

use axum::{extract::State, Json};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::Result,
    models::common::ApiResponse,
    models::member::{Member, MemberRole, MemberStatus, MemberWithUser, MembershipDetail},
    models::organization::{Organization, OrgStatus},
    models::user::UserIdentity,
    org_guard,
};

#[derive(sqlx::FromRow)]
struct MembershipOrgRow {
    id: Uuid,
    user_id: Uuid,
    organization_id: Uuid,
    role: MemberRole,
    status: MemberStatus,
    supervisor_id: Option<Uuid>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    org_name: String,
    org_status: OrgStatus,
    org_created_at: OffsetDateTime,
    org_updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct MemberUserRow {
    id: Uuid,
    user_id: Uuid,
    organization_id: Uuid,
    role: MemberRole,
    status: MemberStatus,
    supervisor_id: Option<Uuid>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    first_name: String,
    last_name: String,
    email: String,
}

impl From<MemberUserRow> for MemberWithUser {
    fn from(r: MemberUserRow) -> Self {
        MemberWithUser {
            user: UserIdentity {
                id: r.user_id,
                first_name: r.first_name,
                last_name: r.last_name,
                email: r.email,
            },
            member: Member {
                id: r.id,
                user_id: r.user_id,
                organization_id: r.organization_id,
                role: r.role,
                status: r.status,
                supervisor_id: r.supervisor_id,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
        }
    }
}

const MEMBER_USER_SELECT: &str = "SELECT m.id, m.user_id, m.organization_id, m.role, m.status,
            m.supervisor_id, m.created_at, m.updated_at,
            u.first_name, u.last_name, u.email
     FROM organization_members m
     JOIN users u ON u.id = m.user_id";

/// GET /api/organization/organization-membership — every membership of the
/// caller, each with its organization, its supervisor (and that
/// supervisor's identity) and the members it supervises.
pub async fn list(
    State(pool): State<PgPool>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<MembershipDetail>>>> {
    org_guard::authorize(&pool, &auth, None, &[]).await?;

    let rows = sqlx::query_as::<_, MembershipOrgRow>(
        "SELECT m.id, m.user_id, m.organization_id, m.role, m.status,
                m.supervisor_id, m.created_at, m.updated_at,
                o.name AS org_name, o.status AS org_status,
                o.created_at AS org_created_at, o.updated_at AS org_updated_at
         FROM organization_members m
         JOIN organizations o ON o.id = m.organization_id
         WHERE m.user_id = $1
         ORDER BY m.created_at DESC",
    )
    .bind(auth.id)
    .fetch_all(&pool)
    .await?;

    let membership_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let supervisor_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.supervisor_id).collect();

    // Supervisors of the caller's memberships, keyed by membership id
    let mut supervisors: HashMap<Uuid, MemberWithUser> = HashMap::new();
    if !supervisor_ids.is_empty() {
        let sup_rows = sqlx::query_as::<_, MemberUserRow>(&format!(
            "{MEMBER_USER_SELECT} WHERE m.id = ANY($1)"
        ))
        .bind(&supervisor_ids)
        .fetch_all(&pool)
        .await?;
        for row in sup_rows {
            supervisors.insert(row.id, row.into());
        }
    }

    // Members supervised by the caller's memberships, grouped by the
    // supervising membership id
    let mut employees: HashMap<Uuid, Vec<MemberWithUser>> = HashMap::new();
    if !membership_ids.is_empty() {
        let emp_rows = sqlx::query_as::<_, MemberUserRow>(&format!(
            "{MEMBER_USER_SELECT} WHERE m.supervisor_id = ANY($1)
             ORDER BY m.created_at DESC"
        ))
        .bind(&membership_ids)
        .fetch_all(&pool)
        .await?;
        for row in emp_rows {
            if let Some(supervisor_id) = row.supervisor_id {
                employees
                    .entry(supervisor_id)
                    .or_default()
                    .push(row.into());
            }
        }
    }

    let details = rows
        .into_iter()
        .map(|r| MembershipDetail {
            organization: Organization {
                id: r.organization_id,
                name: r.org_name,
                status: r.org_status,
                created_at: r.org_created_at,
                updated_at: r.org_updated_at,
            },
            supervisor: r.supervisor_id.and_then(|sid| supervisors.get(&sid).cloned()),
            employees: employees.remove(&r.id).unwrap_or_default(),
            member: Member {
                id: r.id,
                user_id: r.user_id,
                organization_id: r.organization_id,
                role: r.role,
                status: r.status,
                supervisor_id: r.supervisor_id,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
        })
        .collect();

    Ok(ApiResponse::ok(details))
}
