/// Request principal and bearer-token extraction
///
/// The API layer validates the `Authorization: Bearer <token>` header on
/// every protected route, loads the referenced user, and injects a
/// [`Principal`] into request extensions. Handlers read it back with Axum's
/// `Extension` extractor; no session state is kept server-side.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use teamline_shared::auth::middleware::Principal;
///
/// async fn handler(Extension(principal): Extension<Principal>) -> String {
///     format!("Hello, {} {}!", principal.user.name, principal.user.surname)
/// }
/// ```

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::models::user::{Role, User};

/// The authenticated user attached to a request
///
/// Built by the authentication middleware from a verified access token and a
/// fresh database load of the user row, so role changes and deactivation take
/// effect on the next request, not at the token's expiry.
#[derive(Debug, Clone)]
pub struct Principal {
    /// The loaded user row
    pub user: User,
}

impl Principal {
    /// The principal's user id
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    /// The principal's current role (from the database, not the token)
    pub fn role(&self) -> Role {
        self.user.role
    }

    /// Whether the principal is an administrator
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Administrator
    }
}

/// Error type for authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing Authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a Bearer token
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Token verification failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token's subject no longer exists
    #[error("Unknown principal")]
    UnknownPrincipal,

    /// The token's subject has been deactivated
    #[error("Account is deactivated")]
    Inactive,

    /// Database error while loading the principal
    #[error("Database error: {0}")]
    Database(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AuthError::Database(msg) => {
                tracing::error!("Auth principal lookup failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "An internal error occurred".to_string(),
                )
            }
            // Every other failure is the same 401 class: the caller is not
            // told which part of the credential was wrong.
            other => (StatusCode::UNAUTHORIZED, "unauthorized", other.to_string()),
        };

        let body = Json(serde_json::json!({
            "error": kind,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Extracts the bearer token from request headers
///
/// # Errors
///
/// - `AuthError::MissingCredentials` if there is no Authorization header
/// - `AuthError::InvalidFormat` if it is not a `Bearer <token>` value
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header.strip_prefix("Bearer ").ok_or(AuthError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());

        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(extract_bearer(&headers), Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_extract_bearer_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());

        assert!(matches!(extract_bearer(&headers), Err(AuthError::InvalidFormat)));
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Inactive.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Database("boom".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
