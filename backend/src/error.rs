use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use uuid::Uuid;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Organization not found or inactive.")]
    OrgNotFound,

    #[error("Supervisor not found in the organization.")]
    SupervisorNotFound,

    #[error("Supervisor not found in the organization.")]
    SupervisorMemberNotFound,

    #[error("The following employees are not in the organization: {}", format_ids(.0))]
    EmployeesNotFound(Vec<Uuid>),

    #[error("{1}")]
    BadRequest(&'static str, String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn format_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl AppError {
    /// Stable machine code carried in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::OrgNotFound => "ORG_NOT_FOUND",
            AppError::SupervisorNotFound => "SUPERVISOR_NOT_FOUND",
            AppError::SupervisorMemberNotFound => "SUPERVISOR_MEMBER_NOT_FOUND",
            AppError::EmployeesNotFound(_) => "EMPLOYEES_NOT_FOUND",
            AppError::BadRequest(code, _) => code,
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::OrgNotFound
            | AppError::SupervisorNotFound
            | AppError::SupervisorMemberNotFound
            | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmployeesNotFound(_)
            | AppError::BadRequest(_, _)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let message = match &self {
            AppError::Validation(e) => {
                let messages: Vec<String> = e
                    .field_errors()
                    .into_iter()
                    .map(|(field, errors)| {
                        let msgs: Vec<&str> = errors
                            .iter()
                            .filter_map(|err| err.message.as_ref().map(|m| m.as_ref()))
                            .collect();
                        if msgs.is_empty() {
                            let codes: Vec<&str> =
                                errors.iter().map(|err| err.code.as_ref()).collect();
                            format!("{}: {}", field, codes.join(", "))
                        } else {
                            format!("{}: {}", field, msgs.join(", "))
                        }
                    })
                    .collect();
                messages.join("; ")
            }
            AppError::Database(e) => {
                // Map unique violations to a client error before giving up
                if let sqlx::Error::Database(ref db_err) = e {
                    if db_err.code().as_deref() == Some("23505") {
                        tracing::warn!("Unique constraint violation: {}", db_err.message());
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "success": false,
                                "error": {
                                    "code": "EMAIL_TAKEN",
                                    "message": "A record with that value already exists",
                                },
                            })),
                        )
                            .into_response();
                    }
                }
                tracing::error!("Database error: {:?}", e);
                "An error occurred while processing your request".into()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "An error occurred while processing your request".into()
            }
            other => other.to_string(),
        };

        (
            self.status(),
            Json(json!({
                "success": false,
                "error": { "code": self.code(), "message": message },
            })),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
