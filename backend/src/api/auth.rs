use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{extract::State, Json};
use rand_core::OsRng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::{create_token, AuthUser},
    error::{AppError, Result},
    models::common::ApiResponse,
    models::member::Member,
    models::organization::Organization,
    models::user::{
        LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, User, UserPublic,
        UserWithMemberships,
    },
    AppState,
};

const MEMBER_COLUMNS: &str =
    "id, user_id, organization_id, role, status, supervisor_id, created_at, updated_at";

/// All memberships for a user, newest first. Shared by login, register and
/// the identity endpoint so the client snapshot always has the same shape.
pub async fn fetch_user_memberships(pool: &PgPool, user_id: Uuid) -> Result<Vec<Member>> {
    let members = sqlx::query_as::<_, Member>(&format!(
        "SELECT {MEMBER_COLUMNS}
         FROM organization_members
         WHERE user_id = $1
         ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(members)
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
        .to_string();
    Ok(hash)
}

/// POST /api/auth/register — create the user, their organization and an
/// OWNER membership in one transaction.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterResponse>>> {
    use validator::Validate;
    req.validate()?;

    let hash = hash_password(&req.password)?;

    let mut tx = state.pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, first_name, last_name, email, password_hash)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, first_name, last_name, email, password_hash, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(&req.email)
    .bind(&hash)
    .fetch_one(&mut *tx)
    .await?;

    let organization = sqlx::query_as::<_, Organization>(
        "INSERT INTO organizations (id, name)
         VALUES ($1, $2)
         RETURNING id, name, status, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(&req.organization_name)
    .fetch_one(&mut *tx)
    .await?;

    let membership = sqlx::query_as::<_, Member>(&format!(
        "INSERT INTO organization_members (id, user_id, organization_id, role)
         VALUES ($1, $2, $3, 'OWNER')
         RETURNING {MEMBER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(organization.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(user = %user.email, org = %organization.id, "registered new organization owner");

    let token = create_token(user.id, &state.jwt_secret, state.jwt_expiry_hours)
        .map_err(AppError::Internal)?;

    Ok(ApiResponse::ok(RegisterResponse {
        user: UserWithMemberships {
            user: user.into(),
            organization_members: vec![membership],
        },
        organization,
        token,
    }))
}

/// POST /api/auth/login — verify credentials, return the token and the
/// profile snapshot the client caches.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, first_name, last_name, email, password_hash, created_at, updated_at
         FROM users
         WHERE email = $1",
    )
    .bind(&req.email)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::Unauthenticated)?;

    let parsed = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid stored hash")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthenticated)?;

    let token = create_token(user.id, &state.jwt_secret, state.jwt_expiry_hours)
        .map_err(AppError::Internal)?;

    let organization_members = fetch_user_memberships(&state.pool, user.id).await?;

    Ok(ApiResponse::ok(LoginResponse {
        user: UserWithMemberships {
            user: user.into(),
            organization_members,
        },
        token,
    }))
}

/// GET /api/auth/me — the caller's profile with memberships.
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserWithMemberships>>> {
    let user = sqlx::query_as::<_, UserPublic>(
        "SELECT id, first_name, last_name, email, created_at, updated_at
         FROM users
         WHERE id = $1",
    )
    .bind(auth.id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let organization_members = fetch_user_memberships(&state.pool, auth.id).await?;

    Ok(ApiResponse::ok(UserWithMemberships {
        user,
        organization_members,
    }))
}
