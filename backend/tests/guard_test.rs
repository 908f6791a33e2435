//! Route-guard tests. These exercise the page router in-process (no
//! database, no network) via tower's oneshot.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

use crewdeck_backend::api::pages;

fn user_cookie(roles: &[&str]) -> String {
    let members: Vec<serde_json::Value> = roles
        .iter()
        .map(|r| serde_json::json!({ "role": r, "status": "ACTIVE" }))
        .collect();
    let user = serde_json::json!({
        "id": "3f3054b5-7761-4a46-b2e0-8a1f71c6e141",
        "OrganizationMembers": members,
    });
    format!("user-token=test-token; user={}", user)
}

async fn send(path: &str, cookie: Option<String>) -> (StatusCode, Option<String>) {
    let app = pages::router();
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let response = app
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (response.status(), location)
}

#[tokio::test]
async fn unauthenticated_dashboard_request_redirects_to_login() {
    let (status, location) = send("/owner-dashboard/employees", None).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location.as_deref(),
        Some("/login?redirect_to=%2Fowner-dashboard%2Femployees")
    );
}

#[tokio::test]
async fn unauthenticated_home_redirects_to_login() {
    let (status, location) = send("/", None).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/login?redirect_to=%2F"));
}

#[tokio::test]
async fn unauthenticated_login_page_renders() {
    let (status, _) = send("/login", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn authenticated_login_page_redirects_home() {
    let (status, location) = send("/login", Some(user_cookie(&["OWNER"]))).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/"));
}

#[tokio::test]
async fn owner_reaches_owner_dashboard() {
    let (status, _) = send("/owner-dashboard/employees", Some(user_cookie(&["OWNER"]))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn employee_is_bounced_from_owner_dashboard() {
    let (status, location) = send(
        "/owner-dashboard/employees",
        Some(user_cookie(&["EMPLOYEE"])),
    )
    .await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/"));
}

#[tokio::test]
async fn employee_reaches_employee_dashboard() {
    let (status, _) = send("/employee-dashboard", Some(user_cookie(&["EMPLOYEE"]))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn multi_role_user_reaches_both_dashboards() {
    let cookie = user_cookie(&["OWNER", "SUPERVISOR"]);
    let (status, _) = send("/owner-dashboard", Some(cookie.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send("/supervisor-dashboard", Some(cookie)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn redirect_to_preserves_query_parameters() {
    let (status, location) = send("/owner-dashboard/employees?page=2&size=20", None).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location.as_deref(),
        Some("/login?redirect_to=%2Fowner-dashboard%2Femployees%3Fpage%3D2%26size%3D20")
    );
}
