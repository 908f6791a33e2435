//! Dashboard page shells.
//!
//! The real UI is a separate client; these routes exist so the route guard
//! has a server-side surface: each returns a minimal page descriptor, and
//! the guard middleware decides whether the caller may see it or gets
//! redirected.

use axum::{
    http::Uri,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};

use crate::guard;

pub fn router() -> Router {
    Router::new()
        .route("/", get(page_shell))
        .route("/login", get(page_shell))
        .route("/register", get(page_shell))
        .route("/owner-dashboard", get(page_shell))
        .route("/owner-dashboard/*rest", get(page_shell))
        .route("/supervisor-dashboard", get(page_shell))
        .route("/supervisor-dashboard/*rest", get(page_shell))
        .route("/employee-dashboard", get(page_shell))
        .route("/employee-dashboard/*rest", get(page_shell))
        .layer(middleware::from_fn(guard::page_guard))
}

async fn page_shell(uri: Uri) -> Json<Value> {
    Json(json!({ "page": uri.path() }))
}
