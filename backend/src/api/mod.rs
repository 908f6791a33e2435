pub mod assignments;
pub mod auth;
pub mod employees;
pub mod invites;
pub mod memberships;
pub mod pages;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use crate::AppState;

/// Everything except POST /api/auth/login, which main.rs mounts behind the
/// rate limiter (tests add it without one).
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/me", get(auth::me))
        // Memberships
        .route(
            "/api/organization/organization-membership",
            get(memberships::list),
        )
        // Organization-scoped member management
        .route("/api/organization/:id/employees", get(employees::list))
        .route("/api/organization/:id/invite", post(invites::create))
        .route(
            "/api/organization/:id/assign-employee-to-supervisor",
            get(assignments::roster).post(assignments::assign),
        )
        // Health
        .route("/api/health", get(health))
        .with_state(state);

    api.merge(pages::router())
}

async fn health(State(pool): State<PgPool>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "database": "ok" },
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": { "code": "DATABASE_UNAVAILABLE", "message": "database unavailable" },
                })),
            )
        }
    }
}
