//! Client session state, reconstructed from cookies on each request.
//!
//! The client persists three cookies after login: the JWT, a JSON snapshot
//! of the user (with memberships), and the selected organization
//! membership. The server only ever reads them; the route guard consumes
//! the snapshot for its advisory role checks, while API authorization
//! always re-resolves the membership from the database.

use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::member::{MemberRole, MemberStatus};

pub const USER_TOKEN_COOKIE: &str = "user-token";
pub const USER_COOKIE: &str = "user";
pub const SELECTED_ORGANIZATION_COOKIE: &str = "selected-organization";

/// Membership fields the client snapshot carries. Unknown fields in the
/// cookie are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMembership {
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    pub role: MemberRole,
    #[serde(default)]
    pub status: Option<MemberStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(rename = "OrganizationMembers", default)]
    pub organization_members: Vec<SessionMembership>,
}

/// The reconstructed session. Any cookie that is absent or fails to parse
/// simply yields `None`; a malformed snapshot must never take a page down.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<SessionUser>,
    pub selected_organization: Option<SessionMembership>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Roles the cached user holds across all organizations.
    pub fn roles(&self) -> Vec<MemberRole> {
        self.user
            .as_ref()
            .map(|u| u.organization_members.iter().map(|m| m.role).collect())
            .unwrap_or_default()
    }

    pub fn has_role(&self, role: MemberRole) -> bool {
        self.roles().contains(&role)
    }
}

/// Storage adapter for session state, keeping the guard logic agnostic of
/// where the snapshot lives.
pub trait SessionStore {
    fn load(&self) -> Session;
}

/// Cookie-backed store: the only production adapter.
pub struct CookieSessionStore<'a> {
    jar: &'a CookieJar,
}

impl<'a> CookieSessionStore<'a> {
    pub fn new(jar: &'a CookieJar) -> Self {
        Self { jar }
    }

    fn json_cookie<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        let raw = self.jar.get(name)?.value().to_string();
        serde_json::from_str(&raw).ok()
    }
}

impl SessionStore for CookieSessionStore<'_> {
    fn load(&self) -> Session {
        let token = self
            .jar
            .get(USER_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty());

        Session {
            token,
            user: self.json_cookie(USER_COOKIE),
            selected_organization: self.json_cookie(SELECTED_ORGANIZATION_COOKIE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    fn jar_with_cookie_header(value: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn empty_jar_is_unauthenticated() {
        let jar = CookieJar::from_headers(&HeaderMap::new());
        let session = CookieSessionStore::new(&jar).load();
        assert!(!session.is_authenticated());
        assert!(session.roles().is_empty());
    }

    #[test]
    fn token_and_user_snapshot_are_read() {
        let user = serde_json::json!({
            "id": "3f3054b5-7761-4a46-b2e0-8a1f71c6e141",
            "firstName": "Ada",
            "OrganizationMembers": [
                { "role": "OWNER", "status": "ACTIVE" },
                { "role": "EMPLOYEE" }
            ]
        });
        let jar = jar_with_cookie_header(&format!("user-token=tok123; user={}", user));

        let session = CookieSessionStore::new(&jar).load();
        assert!(session.is_authenticated());
        assert!(session.has_role(MemberRole::Owner));
        assert!(session.has_role(MemberRole::Employee));
        assert!(!session.has_role(MemberRole::Supervisor));
    }

    #[test]
    fn malformed_user_cookie_is_ignored() {
        let jar = jar_with_cookie_header("user-token=tok123; user=not-json");
        let session = CookieSessionStore::new(&jar).load();
        assert!(session.is_authenticated());
        assert!(session.user.is_none());
        assert!(session.roles().is_empty());
    }
}
