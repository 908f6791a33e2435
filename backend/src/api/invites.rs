use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use axum::{
    extract::{Path, State},
    Json,
};
use rand_core::OsRng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    models::common::ApiResponse,
    models::member::{InviteRequest, InviteResult, Member, MemberRole},
    models::organization::OrgRef,
    org_guard, permissions,
};

/// POST /api/organization/:id/invite — add a user to the organization by
/// email. Unknown emails are provisioned with a placeholder password; the
/// invited user sets their own credentials out-of-band.
pub async fn create(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(req): Json<InviteRequest>,
) -> Result<Json<ApiResponse<InviteResult>>> {
    use validator::Validate;
    req.validate()?;

    org_guard::authorize(&pool, &auth, Some(org_id), permissions::INVITE).await?;
    let organization = org_guard::require_active_org(&pool, org_id).await?;

    if req.role == MemberRole::Owner {
        return Err(AppError::BadRequest(
            "INVALID_ROLE",
            "Only SUPERVISOR and EMPLOYEE roles can be invited.".into(),
        ));
    }

    let user_id = match sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
        .bind(&req.email)
        .fetch_optional(&pool)
        .await?
    {
        Some(id) => id,
        None => provision_user(&pool, &req).await?,
    };

    let already_member: bool = sqlx::query_scalar(
        "SELECT EXISTS(
             SELECT 1 FROM organization_members
             WHERE user_id = $1 AND organization_id = $2
         )",
    )
    .bind(user_id)
    .bind(org_id)
    .fetch_one(&pool)
    .await?;
    if already_member {
        return Err(AppError::BadRequest(
            "MEMBER_ALREADY_EXISTS",
            "User is already a member of this organization.".into(),
        ));
    }

    let membership = sqlx::query_as::<_, Member>(
        "INSERT INTO organization_members (id, user_id, organization_id, role)
         VALUES ($1, $2, $3, $4)
         RETURNING id, user_id, organization_id, role, status, supervisor_id,
                   created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(org_id)
    .bind(req.role)
    .fetch_one(&pool)
    .await?;

    // No mail transport here; the notification is recorded for delivery
    tracing::info!(
        email = %req.email,
        org = %organization.name,
        role = ?req.role,
        "invite recorded"
    );

    Ok(ApiResponse::ok(InviteResult {
        user_id,
        email: req.email,
        role: membership.role,
        status: membership.status,
        organization: OrgRef {
            id: organization.id,
            name: organization.name,
        },
        invite_sent: true,
    }))
}

/// Create the invited user with a random placeholder password.
async fn provision_user(pool: &PgPool, req: &InviteRequest) -> Result<Uuid> {
    let placeholder = Uuid::new_v4().to_string();
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(placeholder.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
        .to_string();

    let first_name = req
        .first_name
        .clone()
        .or_else(|| req.email.split('@').next().map(str::to_string))
        .unwrap_or_default();
    let last_name = req.last_name.clone().unwrap_or_default();

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (id, first_name, last_name, email, password_hash)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(first_name)
    .bind(last_name)
    .bind(&req.email)
    .bind(hash)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
