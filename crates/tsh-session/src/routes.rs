use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tsh_core::SessionInfo;

use super::error::AuthError;
use super::extractor::AuthUser;
use super::identity::{IdentityGrant, IdentityProvider};
use super::metrics::SessionMetrics;
use super::session::SessionError;
use super::state::{AuthConfig, AuthState};

/// Create the session router.
///
/// Routes (under `config.base_path`, default `/api/auth`):
///   POST /login     — sign in, set session cookies
///   POST /register  — sign up, set session cookies
///   POST /refresh   — rotate the token pair from the refresh cookie
///   POST /logout    — revoke with the provider, clear session cookies
///   GET  /session   — current user
pub fn auth_routes<P: IdentityProvider>(
    config: AuthConfig,
    provider: P,
    metrics: SessionMetrics,
) -> Router {
    let base = config.base_path.trim_end_matches('/').to_string();

    let state = AuthState {
        provider: Arc::new(provider),
        cipher: Arc::new(config.cipher),
        settings: config.settings,
        metrics,
    };

    Router::new()
        .route(&format!("{base}/login"), post(login::<P>))
        .route(&format!("{base}/register"), post(register::<P>))
        .route(&format!("{base}/refresh"), post(refresh::<P>))
        .route(&format!("{base}/logout"), post(logout::<P>))
        .route(&format!("{base}/session"), get(current_session))
        .with_state(state)
}

// ── Login / register ───────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    email: String,
    password: String,
    #[serde(default)]
    username: Option<String>,
}

async fn login<P: IdentityProvider>(
    State(state): State<AuthState<P>>,
    mut jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<(CookieJar, Json<SessionInfo>), AuthError> {
    let grant = state.provider.sign_in(&body.email, &body.password).await?;
    let info = establish(&state, &mut jar, &grant)?;
    tracing::info!(user_id = %info.user_id, "login succeeded");
    Ok((jar, Json(info)))
}

async fn register<P: IdentityProvider>(
    State(state): State<AuthState<P>>,
    mut jar: CookieJar,
    Json(body): Json<RegisterBody>,
) -> Result<(CookieJar, Json<SessionInfo>), AuthError> {
    let grant = state
        .provider
        .sign_up(&body.email, &body.password, body.username.as_deref())
        .await?;
    let info = establish(&state, &mut jar, &grant)?;
    tracing::info!(user_id = %info.user_id, "registration succeeded");
    Ok((jar, Json(info)))
}

/// Write the encrypted pair and the display cookie for a fresh grant.
fn establish<P>(
    state: &AuthState<P>,
    jar: &mut CookieJar,
    grant: &IdentityGrant,
) -> Result<SessionInfo, SessionError> {
    let info = SessionInfo::from(&grant.user);
    let mut session = state.session(jar);
    session.set_auth_cookies(&grant.tokens.access_token, &grant.tokens.refresh_token)?;
    session.set_session_cookie(&info)?;
    Ok(info)
}

// ── Refresh ────────────────────────────────────────────────────────

async fn refresh<P: IdentityProvider>(
    State(state): State<AuthState<P>>,
    mut jar: CookieJar,
) -> Result<(CookieJar, Json<SessionInfo>), AuthError> {
    let refresh_token = match state.session(&mut jar).read_refresh_token() {
        Ok(Some(token)) => token,
        Ok(None) => return Err(AuthError::Unauthenticated),
        Err(e) => {
            state.metrics.session_refresh_failures.inc();
            tracing::warn!(error = %e, "refresh cookie unusable, ending session");
            return Err(AuthError::SessionInvalid);
        }
    };

    let grant = match state.provider.refresh(&refresh_token).await {
        Ok(grant) => grant,
        Err(e) => {
            state.metrics.session_refresh_failures.inc();
            tracing::warn!(error = %e, "token refresh failed, ending session");
            return Err(AuthError::SessionInvalid);
        }
    };

    // No partial state: if the new pair cannot be stored the session ends.
    let info = establish(&state, &mut jar, &grant).map_err(|e| {
        state.metrics.session_refresh_failures.inc();
        tracing::error!(error = %e, "could not store refreshed tokens, ending session");
        AuthError::SessionInvalid
    })?;

    state.metrics.session_refreshes.inc();
    tracing::debug!(user_id = %info.user_id, "token pair refreshed");
    Ok((jar, Json(info)))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<P: IdentityProvider>(
    State(state): State<AuthState<P>>,
    mut jar: CookieJar,
) -> (CookieJar, StatusCode) {
    let access_token = state.session(&mut jar).read_access_token().ok().flatten();

    if let Some(token) = access_token {
        if let Err(e) = state.provider.sign_out(&token).await {
            tracing::warn!(error = %e, "provider sign-out failed, clearing cookies anyway");
        }
    }

    state.session(&mut jar).clear_auth_cookies();
    (jar, StatusCode::NO_CONTENT)
}

// ── Session ────────────────────────────────────────────────────────

async fn current_session(AuthUser { user }: AuthUser) -> Json<SessionInfo> {
    Json(SessionInfo::from(&user))
}
