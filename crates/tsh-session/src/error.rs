use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::cookies::all_removal_cookies;
use crate::identity::IdentityError;
use crate::session::SessionError;

/// Errors surfaced by the auth routes and the [`AuthUser`](crate::AuthUser) extractor.
///
/// Cipher faults never reach the client as anything but "not logged in".
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No session cookies.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Access cookie gone, refresh cookie still present: call `/refresh`.
    #[error("Access token expired")]
    AccessExpired,

    /// The session cannot be used any more; all session cookies are cleared.
    #[error("Session invalid")]
    SessionInvalid,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Identity provider rejected the request or is down.
    #[error("Identity provider error: {0}")]
    Identity(String),

    /// Token could not be encrypted; nothing was stored.
    #[error("Session could not be established")]
    Encryption,
}

impl AuthError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AccessExpired => "access_expired",
            Self::SessionInvalid => "session_invalid",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Identity(_) => "identity_unavailable",
            Self::Encryption => "try_again",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.code() }));
        match self {
            Self::Unauthenticated | Self::AccessExpired | Self::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, body).into_response()
            }
            Self::SessionInvalid => {
                let jar = all_removal_cookies()
                    .into_iter()
                    .fold(CookieJar::new(), |jar, c| jar.add(c));
                (StatusCode::UNAUTHORIZED, jar, body).into_response()
            }
            Self::Identity(ref msg) => {
                tracing::error!(error = %msg, "identity provider error");
                (StatusCode::BAD_GATEWAY, body).into_response()
            }
            Self::Encryption => (StatusCode::SERVICE_UNAVAILABLE, body).into_response(),
        }
    }
}

impl From<IdentityError> for AuthError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::InvalidCredentials => Self::InvalidCredentials,
            IdentityError::InvalidToken => Self::SessionInvalid,
            IdentityError::Rejected(msg) | IdentityError::Unreachable(msg) => Self::Identity(msg),
        }
    }
}

impl From<SessionError> for AuthError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Encrypt(_) | SessionError::Serialize(_) => Self::Encryption,
            SessionError::Undecryptable { .. } => Self::SessionInvalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;

    #[test]
    fn test_session_invalid_clears_cookies() {
        let resp = AuthError::SessionInvalid.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let cleared: Vec<_> = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cleared.len(), 3);
        assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AuthError::AccessExpired.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Encryption.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AuthError::Identity("down".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_identity_error_mapping() {
        assert!(matches!(
            AuthError::from(IdentityError::InvalidToken),
            AuthError::SessionInvalid
        ));
        assert!(matches!(
            AuthError::from(IdentityError::InvalidCredentials),
            AuthError::InvalidCredentials
        ));
    }
}
