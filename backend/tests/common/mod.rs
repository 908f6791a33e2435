#![allow(dead_code)]
use std::net::SocketAddr;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use axum::routing::post;
use crewdeck_backend::{api, AppState};

pub const JWT_SECRET: &str = "test-secret-that-is-at-least-32-chars-long!!";
const JWT_EXPIRY_HOURS: u64 = 12;

/// Spin up a real Axum server on a random port, returning its address and
/// the database pool. Tests share the same database; isolation comes from
/// creating unique orgs/users per test and cleaning up afterwards.
///
/// Returns None (and the calling test passes as skipped) when
/// TEST_DATABASE_URL is unset — these tests write and delete data and must
/// never run against an implicit default database.
pub async fn setup_test_app() -> Option<(SocketAddr, PgPool)> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database-backed test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations to ensure schema is up-to-date
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState {
        pool: pool.clone(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiry_hours: JWT_EXPIRY_HOURS,
    };

    // Build the app router. The login route lives in main.rs (behind the
    // rate limiter) so we add it here for tests without one.
    let login_router = axum::Router::new()
        .route("/api/auth/login", post(api::auth::login))
        .with_state(state.clone());

    let app = api::router(state).merge(login_router);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some((addr, pool))
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}+{}@test.local", prefix, &Uuid::new_v4().to_string()[..8])
}

/// Create a test organization. Returns the org ID.
pub async fn create_test_org(pool: &PgPool, suffix: &str) -> Uuid {
    let id = Uuid::new_v4();
    let name = format!("Test Org {}", suffix);

    sqlx::query("INSERT INTO organizations (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(&name)
        .execute(pool)
        .await
        .expect("Failed to create test org");

    id
}

/// Create an INACTIVE test organization. Returns the org ID.
pub async fn create_inactive_org(pool: &PgPool, suffix: &str) -> Uuid {
    let id = Uuid::new_v4();
    let name = format!("Inactive Org {}", suffix);

    sqlx::query("INSERT INTO organizations (id, name, status) VALUES ($1, $2, 'INACTIVE')")
        .bind(id)
        .bind(&name)
        .execute(pool)
        .await
        .expect("Failed to create inactive org");

    id
}

/// Create a test user with an Argon2-hashed password.
/// Returns (user_id, plaintext_password).
pub async fn create_test_user(pool: &PgPool, email: &str) -> (Uuid, String) {
    let user_id = Uuid::new_v4();
    let password = "testpass123";
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("Failed to hash password")
        .to_string();

    sqlx::query(
        "INSERT INTO users (id, first_name, last_name, email, password_hash) \
         VALUES ($1, 'Test', 'User', $2, $3)",
    )
    .bind(user_id)
    .bind(email)
    .bind(&hash)
    .execute(pool)
    .await
    .expect("Failed to create test user");

    (user_id, password.to_string())
}

/// Add a user to an organization with the given role. Returns the
/// membership ID.
pub async fn create_membership(pool: &PgPool, user_id: Uuid, org_id: Uuid, role: &str) -> Uuid {
    create_membership_with_status(pool, user_id, org_id, role, "ACTIVE").await
}

pub async fn create_membership_with_status(
    pool: &PgPool,
    user_id: Uuid,
    org_id: Uuid,
    role: &str,
    status: &str,
) -> Uuid {
    let member_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO organization_members (id, user_id, organization_id, role, status) \
         VALUES ($1, $2, $3, $4::member_role, $5::member_status)",
    )
    .bind(member_id)
    .bind(user_id)
    .bind(org_id)
    .bind(role)
    .bind(status)
    .execute(pool)
    .await
    .expect("Failed to create membership");

    member_id
}

/// Create a user and their ACTIVE membership in one step.
/// Returns (user_id, member_id, plaintext_password).
pub async fn create_member(
    pool: &PgPool,
    org_id: Uuid,
    role: &str,
    email: &str,
) -> (Uuid, Uuid, String) {
    let (user_id, password) = create_test_user(pool, email).await;
    let member_id = create_membership(pool, user_id, org_id, role).await;
    (user_id, member_id, password)
}

/// Log in via the HTTP API and return the JWT token.
pub async fn get_auth_token(addr: SocketAddr, email: &str, password: &str) -> String {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{}/api/auth/login", addr))
        .json(&serde_json::json!({
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .expect("Login request failed");

    assert_eq!(resp.status(), 200, "Login should return 200");

    let body: serde_json::Value = resp.json().await.expect("Failed to parse login response");
    body["data"]["token"]
        .as_str()
        .expect("Response should contain token")
        .to_string()
}

/// Create a JWT token that is already expired (exp in the past).
/// Uses the same secret as the test app.
pub fn create_expired_token(user_id: Uuid) -> String {
    use crewdeck_backend::auth::Claims;
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = time::OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id,
        exp: (now - time::Duration::hours(1)).unix_timestamp(), // expired 1 hour ago
        iat: (now - time::Duration::hours(2)).unix_timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to create expired token")
}

/// Build a reqwest client (reusable across requests in a test).
pub fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Fetch a membership's supervisor_id straight from the database.
pub async fn fetch_supervisor_id(pool: &PgPool, org_id: Uuid, user_id: Uuid) -> Option<Uuid> {
    sqlx::query_scalar(
        "SELECT supervisor_id FROM organization_members \
         WHERE organization_id = $1 AND user_id = $2",
    )
    .bind(org_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .expect("Failed to fetch supervisor_id")
}

/// Clean up all test data for a given org. Call this at the end of tests.
pub async fn cleanup_test_org(pool: &PgPool, org_id: Uuid) {
    // Memberships first (self-referential FK), then the org, then any test
    // users left without memberships
    let cleanup_queries = [
        "UPDATE organization_members SET supervisor_id = NULL WHERE organization_id = $1",
        "DELETE FROM organization_members WHERE organization_id = $1",
        "DELETE FROM organizations WHERE id = $1",
    ];

    for q in cleanup_queries {
        let _ = sqlx::query(q).bind(org_id).execute(pool).await;
    }

    let _ = sqlx::query(
        "DELETE FROM users WHERE email LIKE '%@test.local' \
         AND NOT EXISTS (SELECT 1 FROM organization_members m WHERE m.user_id = users.id)",
    )
    .execute(pool)
    .await;
}
