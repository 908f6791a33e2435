use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::Result,
    models::common::{clamp_page, clamp_size, search_pattern, ApiResponse, Paginated},
    models::member::MemberRole,
    models::user::MemberProfile,
    org_guard, permissions,
};

#[derive(Debug, serde::Deserialize)]
pub struct RosterParams {
    pub search: Option<String>,
    pub role: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl RosterParams {
    /// A recognized role narrows the roster; anything else (including
    /// "all" or absence) means both EMPLOYEE and SUPERVISOR.
    fn role_filter(&self) -> Option<MemberRole> {
        match self
            .role
            .as_deref()
            .map(str::trim)
            .map(str::to_uppercase)
            .as_deref()
        {
            Some("EMPLOYEE") => Some(MemberRole::Employee),
            Some("SUPERVISOR") => Some(MemberRole::Supervisor),
            _ => None,
        }
    }
}

/// GET /api/organization/:id/employees — paginated, search-filtered,
/// role-filtered member roster. Items carry the member's single role in
/// this organization and are ordered by user creation time, newest first.
pub async fn list(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Query(params): Query<RosterParams>,
) -> Result<Json<ApiResponse<Paginated<MemberProfile>>>> {
    org_guard::authorize(&pool, &auth, Some(org_id), permissions::EMPLOYEES_READ).await?;
    org_guard::require_active_org(&pool, org_id).await?;

    let page = clamp_page(params.page);
    let size = clamp_size(params.size);
    let offset = (page - 1) * size;
    let role = params.role_filter();
    let pattern = search_pattern(params.search.as_deref());

    let filter = "m.organization_id = $1
          AND (($2::member_role IS NULL AND m.role IN ('EMPLOYEE', 'SUPERVISOR'))
               OR m.role = $2)
          AND ($3::text IS NULL
               OR u.first_name ILIKE $3
               OR u.last_name ILIKE $3
               OR u.email ILIKE $3)";

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*)
         FROM users u
         JOIN organization_members m ON m.user_id = u.id
         WHERE {filter}"
    ))
    .bind(org_id)
    .bind(role)
    .bind(pattern.as_deref())
    .fetch_one(&pool)
    .await?;

    let items = sqlx::query_as::<_, MemberProfile>(&format!(
        "SELECT u.id, u.first_name, u.last_name, u.email, u.created_at, u.updated_at, m.role
         FROM users u
         JOIN organization_members m ON m.user_id = u.id
         WHERE {filter}
         ORDER BY u.created_at DESC
         LIMIT $4 OFFSET $5"
    ))
    .bind(org_id)
    .bind(role)
    .bind(pattern.as_deref())
    .bind(size)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::ok(Paginated::new(items, total, page, size)))
}
