use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use tsh_core::IdentityUser;

use super::error::AuthError;
use super::identity::{IdentityError, IdentityProvider};
use super::session::{SessionError, SessionState};
use super::state::AuthState;

/// Authenticated user resolved from the access cookie.
///
/// Rejections:
/// - no cookies → `401 unauthenticated`
/// - access cookie expired, refresh cookie present → `401 access_expired`
///   (the client calls `/refresh` and retries)
/// - undecryptable cookie or token rejected by the provider → `401
///   session_invalid` with all session cookies cleared
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: IdentityUser,
}

impl<P: IdentityProvider> FromRequestParts<AuthState<P>> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AuthState<P>,
    ) -> Result<Self, Self::Rejection> {
        let mut jar = CookieJar::from_headers(&parts.headers);
        let session = state.session(&mut jar);

        let access_token = match session.read_access_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                return Err(match session.state() {
                    SessionState::AccessExpiredRefreshValid => AuthError::AccessExpired,
                    _ => AuthError::Unauthenticated,
                })
            }
            Err(SessionError::Undecryptable { cookie }) => {
                tracing::warn!(cookie, "ending session: undecryptable cookie");
                return Err(AuthError::SessionInvalid);
            }
            Err(e) => return Err(e.into()),
        };
        let has_refresh = matches!(session.read_refresh_token(), Ok(Some(_)));

        match state.provider.resolve_user(&access_token).await {
            Ok(user) => Ok(AuthUser { user }),
            // The provider may reject an access token before its cookie expires.
            Err(IdentityError::InvalidToken) if has_refresh => Err(AuthError::AccessExpired),
            Err(e) => Err(e.into()),
        }
    }
}
