//! Route guard for the dashboard page routes.
//!
//! Advisory only: it reads the client-side cookie snapshot, so a tampered
//! cookie can reach a page shell, but every API call behind that page is
//! re-authorized against the database (`org_guard::authorize`). The two
//! checks are kept in sync through `permissions` and `MemberRole`.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::models::member::MemberRole;
use crate::session::{CookieSessionStore, Session, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Reachable only without a session (login/register).
    PublicOnly,
    /// Requires a session and a membership with the given role somewhere.
    RoleScoped(MemberRole),
    /// Requires a session.
    Protected,
}

pub fn classify(path: &str) -> PathClass {
    if matches!(path, "/login" | "/register") {
        return PathClass::PublicOnly;
    }
    if path.contains("owner-dashboard") {
        return PathClass::RoleScoped(MemberRole::Owner);
    }
    if path.contains("employee-dashboard") {
        return PathClass::RoleScoped(MemberRole::Employee);
    }
    if path.contains("supervisor-dashboard") {
        return PathClass::RoleScoped(MemberRole::Supervisor);
    }
    PathClass::Protected
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    RedirectToLogin { location: String },
    RedirectHome,
}

/// The guard state machine. `query` is the raw query string of the
/// original request, preserved inside `redirect_to`.
pub fn evaluate(session: &Session, path: &str, query: Option<&str>) -> Decision {
    let class = classify(path);

    if !session.is_authenticated() {
        if class == PathClass::PublicOnly {
            return Decision::Proceed;
        }
        return Decision::RedirectToLogin {
            location: login_redirect(path, query),
        };
    }

    match class {
        PathClass::PublicOnly => Decision::RedirectHome,
        PathClass::RoleScoped(role) if !session.has_role(role) => Decision::RedirectHome,
        _ => Decision::Proceed,
    }
}

fn login_redirect(path: &str, query: Option<&str>) -> String {
    let target = match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    };
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect_to", &target)
        .finish();
    format!("/login?{}", encoded)
}

/// Axum middleware applying the guard to the page router.
pub async fn page_guard(request: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let session = CookieSessionStore::new(&jar).load();

    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    match evaluate(&session, &path, query.as_deref()) {
        Decision::Proceed => next.run(request).await,
        Decision::RedirectToLogin { location } => Redirect::temporary(&location).into_response(),
        Decision::RedirectHome => Redirect::temporary("/").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionMembership, SessionUser};
    use uuid::Uuid;

    fn session_with_roles(roles: &[MemberRole]) -> Session {
        Session {
            token: Some("tok".into()),
            user: Some(SessionUser {
                id: Uuid::new_v4(),
                organization_members: roles
                    .iter()
                    .map(|&role| SessionMembership {
                        organization_id: None,
                        role,
                        status: None,
                    })
                    .collect(),
            }),
            selected_organization: None,
        }
    }

    #[test]
    fn anonymous_protected_path_redirects_to_login_with_redirect_to() {
        let decision = evaluate(&Session::default(), "/owner-dashboard/employees", None);
        assert_eq!(
            decision,
            Decision::RedirectToLogin {
                location: "/login?redirect_to=%2Fowner-dashboard%2Femployees".into()
            }
        );
    }

    #[test]
    fn redirect_to_preserves_query_parameters() {
        let decision = evaluate(
            &Session::default(),
            "/owner-dashboard/employees",
            Some("page=2&size=20"),
        );
        assert_eq!(
            decision,
            Decision::RedirectToLogin {
                location:
                    "/login?redirect_to=%2Fowner-dashboard%2Femployees%3Fpage%3D2%26size%3D20"
                        .into()
            }
        );
    }

    #[test]
    fn anonymous_login_page_proceeds() {
        assert_eq!(
            evaluate(&Session::default(), "/login", None),
            Decision::Proceed
        );
        assert_eq!(
            evaluate(&Session::default(), "/register", None),
            Decision::Proceed
        );
    }

    #[test]
    fn authenticated_login_page_redirects_home() {
        let session = session_with_roles(&[MemberRole::Owner]);
        assert_eq!(evaluate(&session, "/login", None), Decision::RedirectHome);
    }

    #[test]
    fn role_scoped_paths_require_the_matching_role() {
        let owner = session_with_roles(&[MemberRole::Owner]);
        let employee = session_with_roles(&[MemberRole::Employee]);

        assert_eq!(
            evaluate(&owner, "/owner-dashboard/employees", None),
            Decision::Proceed
        );
        assert_eq!(
            evaluate(&employee, "/owner-dashboard/employees", None),
            Decision::RedirectHome
        );
        assert_eq!(
            evaluate(&employee, "/employee-dashboard", None),
            Decision::Proceed
        );
        assert_eq!(
            evaluate(&owner, "/supervisor-dashboard", None),
            Decision::RedirectHome
        );
    }

    #[test]
    fn authenticated_home_proceeds_without_roles() {
        // A session whose user cookie failed to parse still reaches
        // non-role-scoped pages.
        let session = Session {
            token: Some("tok".into()),
            user: None,
            selected_organization: None,
        };
        assert_eq!(evaluate(&session, "/", None), Decision::Proceed);
        assert_eq!(
            evaluate(&session, "/owner-dashboard", None),
            Decision::RedirectHome
        );
    }
}
