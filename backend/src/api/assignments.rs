use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    models::common::{clamp_page, clamp_size, search_pattern, ApiResponse, Paginated},
    models::member::{
        AssignRequest, AssignResult, Member, MemberRole, MemberStatus, RosterEmployee,
        SupervisorAssignments,
    },
    org_guard, permissions,
};

const MEMBER_COLUMNS: &str =
    "id, user_id, organization_id, role, status, supervisor_id, created_at, updated_at";

/// An ACTIVE SUPERVISOR membership for the given user in the organization.
async fn find_supervisor_member(
    pool: &PgPool,
    org_id: Uuid,
    supervisor_user_id: Uuid,
) -> Result<Option<Member>> {
    let member = sqlx::query_as::<_, Member>(&format!(
        "SELECT {MEMBER_COLUMNS}
         FROM organization_members
         WHERE user_id = $1
           AND organization_id = $2
           AND role = 'SUPERVISOR'
           AND status = 'ACTIVE'"
    ))
    .bind(supervisor_user_id)
    .bind(org_id)
    .fetch_optional(pool)
    .await?;

    Ok(member)
}

/// POST /api/organization/:id/assign-employee-to-supervisor — re-parent
/// the given employees to the supervisor.
///
/// Validation reads and the bulk update are not wrapped in a transaction:
/// the update is the only mutation, so a failure before it leaves the
/// prior state intact. A concurrent status change between check and update
/// is not guarded against; overlapping assigns are last-writer-wins.
pub async fn assign(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<ApiResponse<AssignResult>>> {
    use validator::Validate;
    req.validate()?;

    org_guard::authorize(&pool, &auth, Some(org_id), permissions::ASSIGNMENTS_WRITE).await?;
    org_guard::require_active_org(&pool, org_id).await?;

    if find_supervisor_member(&pool, org_id, req.supervisor_id)
        .await?
        .is_none()
    {
        return Err(AppError::SupervisorNotFound);
    }

    // Every requested id must be an ACTIVE EMPLOYEE member here; reject the
    // whole request otherwise so no partial assignment happens
    let existing: Vec<Uuid> = sqlx::query_scalar(
        "SELECT user_id
         FROM organization_members
         WHERE user_id = ANY($1)
           AND organization_id = $2
           AND role = 'EMPLOYEE'
           AND status = 'ACTIVE'",
    )
    .bind(&req.employee_ids)
    .bind(org_id)
    .fetch_all(&pool)
    .await?;

    let missing: Vec<Uuid> = req
        .employee_ids
        .iter()
        .filter(|id| !existing.contains(id))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(AppError::EmployeesNotFound(missing));
    }

    // Re-resolve the supervisor's membership right before the write; it may
    // have been deactivated since the first check
    let supervisor_member = find_supervisor_member(&pool, org_id, req.supervisor_id)
        .await?
        .ok_or(AppError::SupervisorMemberNotFound)?;

    sqlx::query(
        "UPDATE organization_members
         SET supervisor_id = $1, updated_at = NOW()
         WHERE user_id = ANY($2) AND organization_id = $3",
    )
    .bind(supervisor_member.id)
    .bind(&req.employee_ids)
    .bind(org_id)
    .execute(&pool)
    .await?;

    tracing::info!(
        org = %org_id,
        supervisor = %supervisor_member.user_id,
        count = req.employee_ids.len(),
        "assigned employees to supervisor"
    );

    Ok(ApiResponse::ok(AssignResult {
        assigned_employees: req.employee_ids.len() as i64,
        supervisor_id: supervisor_member.user_id,
        organization_member_id: supervisor_member.id,
        organization_id: org_id,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRosterParams {
    pub search: Option<String>,
    pub assigned_page: Option<i64>,
    pub assigned_size: Option<i64>,
    pub unassigned_page: Option<i64>,
    pub unassigned_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentRoster {
    pub assigned: Paginated<SupervisorAssignments>,
    pub unassigned: Paginated<RosterEmployee>,
}

#[derive(sqlx::FromRow)]
struct RosterMemberRow {
    member_id: Uuid,
    user_id: Uuid,
    role: MemberRole,
    status: MemberStatus,
    supervisor_id: Option<Uuid>,
    first_name: String,
    last_name: String,
}

/// GET /api/organization/:id/assign-employee-to-supervisor — two
/// independently paginated views: supervisors with their employees, and
/// employees with no supervisor. Unassigned means `supervisor_id IS NULL`
/// across the whole organization, not just the supervisors on the current
/// page.
pub async fn roster(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Query(params): Query<AssignmentRosterParams>,
) -> Result<Json<ApiResponse<AssignmentRoster>>> {
    org_guard::authorize(&pool, &auth, Some(org_id), permissions::ASSIGNMENTS_VIEW).await?;
    org_guard::require_active_org(&pool, org_id).await?;

    let assigned_page = clamp_page(params.assigned_page);
    let assigned_size = clamp_size(params.assigned_size);
    let unassigned_page = clamp_page(params.unassigned_page);
    let unassigned_size = clamp_size(params.unassigned_size);
    let pattern = search_pattern(params.search.as_deref());

    // Assigned view: one page of ACTIVE supervisors
    let supervisors_total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)
         FROM organization_members
         WHERE organization_id = $1 AND role = 'SUPERVISOR' AND status = 'ACTIVE'",
    )
    .bind(org_id)
    .fetch_one(&pool)
    .await?;

    let supervisor_rows = sqlx::query_as::<_, RosterMemberRow>(
        "SELECT m.id AS member_id, m.user_id, m.role, m.status, m.supervisor_id,
                u.first_name, u.last_name
         FROM organization_members m
         JOIN users u ON u.id = m.user_id
         WHERE m.organization_id = $1 AND m.role = 'SUPERVISOR' AND m.status = 'ACTIVE'
         ORDER BY m.created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(org_id)
    .bind(assigned_size)
    .bind((assigned_page - 1) * assigned_size)
    .fetch_all(&pool)
    .await?;

    // Their employees, grouped by supervising membership id
    let supervisor_member_ids: Vec<Uuid> =
        supervisor_rows.iter().map(|r| r.member_id).collect();
    let mut employees_by_supervisor: HashMap<Uuid, Vec<RosterEmployee>> = HashMap::new();
    if !supervisor_member_ids.is_empty() {
        let employee_rows = sqlx::query_as::<_, RosterMemberRow>(
            "SELECT m.id AS member_id, m.user_id, m.role, m.status, m.supervisor_id,
                    u.first_name, u.last_name
             FROM organization_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.supervisor_id = ANY($1) AND m.role = 'EMPLOYEE' AND m.status = 'ACTIVE'
             ORDER BY m.created_at DESC",
        )
        .bind(&supervisor_member_ids)
        .fetch_all(&pool)
        .await?;

        for row in employee_rows {
            if let Some(sid) = row.supervisor_id {
                employees_by_supervisor
                    .entry(sid)
                    .or_default()
                    .push(RosterEmployee {
                        employee_id: row.user_id,
                        first_name: row.first_name,
                        last_name: row.last_name,
                        role: row.role,
                        status: row.status,
                    });
            }
        }
    }

    let assigned_items = supervisor_rows
        .into_iter()
        .map(|row| SupervisorAssignments {
            supervisor_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role,
            status: row.status,
            employees: employees_by_supervisor
                .remove(&row.member_id)
                .unwrap_or_default(),
        })
        .collect();

    // Unassigned view: ACTIVE employees with no supervisor
    let unassigned_filter = "m.organization_id = $1
           AND m.role = 'EMPLOYEE'
           AND m.status = 'ACTIVE'
           AND m.supervisor_id IS NULL
           AND ($2::text IS NULL
                OR u.first_name ILIKE $2
                OR u.last_name ILIKE $2
                OR u.email ILIKE $2)";

    let unassigned_total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*)
         FROM organization_members m
         JOIN users u ON u.id = m.user_id
         WHERE {unassigned_filter}"
    ))
    .bind(org_id)
    .bind(pattern.as_deref())
    .fetch_one(&pool)
    .await?;

    let unassigned_rows = sqlx::query_as::<_, RosterMemberRow>(&format!(
        "SELECT m.id AS member_id, m.user_id, m.role, m.status, m.supervisor_id,
                u.first_name, u.last_name
         FROM organization_members m
         JOIN users u ON u.id = m.user_id
         WHERE {unassigned_filter}
         ORDER BY m.created_at DESC
         LIMIT $3 OFFSET $4"
    ))
    .bind(org_id)
    .bind(pattern.as_deref())
    .bind(unassigned_size)
    .bind((unassigned_page - 1) * unassigned_size)
    .fetch_all(&pool)
    .await?;

    let unassigned_items = unassigned_rows
        .into_iter()
        .map(|row| RosterEmployee {
            employee_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role,
            status: row.status,
        })
        .collect();

    Ok(ApiResponse::ok(AssignmentRoster {
        assigned: Paginated::new(
            assigned_items,
            supervisors_total,
            assigned_page,
            assigned_size,
        ),
        unassigned: Paginated::new(
            unassigned_items,
            unassigned_total,
            unassigned_page,
            unassigned_size,
        ),
    }))
}
