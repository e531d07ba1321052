//! External identity provider: issues, refreshes, resolves and revokes tokens.
//!
//! The session boundary never validates tokens itself. It hands the decrypted
//! plaintext to an [`IdentityProvider`] and stores whatever pair comes back.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tsh_core::{IdentityUser, TokenPair};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A token pair together with the user it was issued for.
#[derive(Debug, Clone)]
pub struct IdentityGrant {
    pub tokens: TokenPair,
    pub user: IdentityUser,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token rejected by identity provider")]
    InvalidToken,

    #[error("identity provider rejected request: {0}")]
    Rejected(String),

    #[error("identity provider unreachable: {0}")]
    Unreachable(String),
}

/// Operations the session boundary consumes from the identity provider.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Exchange email + password for a token pair.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<IdentityGrant, IdentityError>> + Send;

    /// Register a new account and sign it in.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> impl Future<Output = Result<IdentityGrant, IdentityError>> + Send;

    /// Mint a new pair from a refresh token.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<IdentityGrant, IdentityError>> + Send;

    /// Resolve an access token to its user.
    fn resolve_user(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<IdentityUser, IdentityError>> + Send;

    /// Invalidate the session behind an access token.
    fn sign_out(&self, access_token: &str)
        -> impl Future<Output = Result<(), IdentityError>> + Send;
}

/// REST client for a hosted token service.
///
/// Endpoints (relative to `base_url`):
///   POST /auth/v1/token?grant_type=password
///   POST /auth/v1/token?grant_type=refresh_token
///   POST /auth/v1/signup
///   GET  /auth/v1/user
///   POST /auth/v1/logout
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

#[derive(Deserialize)]
struct GrantBody {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserBody>,
}

#[derive(Deserialize)]
struct UserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Deserialize, Default)]
struct UserMetadata {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl From<UserBody> for IdentityUser {
    fn from(body: UserBody) -> Self {
        Self {
            id: body.id,
            email: body.email.unwrap_or_default(),
            username: body.user_metadata.username,
        }
    }
}

impl HttpIdentityProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build from `[identity]` config. The API key env var is optional.
    pub fn from_config(cfg: &tsh_core::config::IdentityConfig) -> Result<Self, IdentityError> {
        let api_key = std::env::var(&cfg.api_key_env).ok().map(SecretString::from);
        if api_key.is_none() {
            tracing::warn!(var = %cfg.api_key_env, "identity API key not set, sending requests without it");
        }
        Self::new(&cfg.base_url, api_key, Duration::from_secs(cfg.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.header("apikey", key.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, IdentityError> {
        builder
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))
    }

    /// Turn a token endpoint response into a grant; `unauthorized` is the
    /// error reported for 400/401/403/422.
    async fn grant(
        &self,
        response: Response,
        unauthorized: IdentityError,
    ) -> Result<IdentityGrant, IdentityError> {
        let response = check_status(response, unauthorized).await?;
        let body: GrantBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Rejected(format!("malformed token response: {e}")))?;

        match (body.access_token, body.refresh_token, body.user) {
            (Some(access_token), Some(refresh_token), Some(user)) => Ok(IdentityGrant {
                tokens: TokenPair {
                    access_token,
                    refresh_token,
                },
                user: user.into(),
            }),
            (None, _, Some(_)) => Err(IdentityError::Rejected(
                "account created, email confirmation required".into(),
            )),
            _ => Err(IdentityError::Rejected(
                "token response missing tokens or user".into(),
            )),
        }
    }
}

async fn check_status(
    response: Response,
    unauthorized: IdentityError,
) -> Result<Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.json::<ErrorBody>().await.ok();
    tracing::debug!(status = status.as_u16(), ?body, "identity provider error response");

    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::UNPROCESSABLE_ENTITY => Err(unauthorized),
        _ => {
            let msg = body
                .and_then(|b| b.error_description.or(b.msg).or(b.message).or(b.error))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            Err(IdentityError::Rejected(msg))
        }
    }
}

impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityGrant, IdentityError> {
        let req = self
            .request(Method::POST, "/auth/v1/token?grant_type=password")
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(req).await?;
        self.grant(response, IdentityError::InvalidCredentials).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> Result<IdentityGrant, IdentityError> {
        let req = self.request(Method::POST, "/auth/v1/signup").json(&json!({
            "email": email,
            "password": password,
            "data": { "username": username },
        }));
        let response = self.send(req).await?;
        self.grant(response, IdentityError::InvalidCredentials).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<IdentityGrant, IdentityError> {
        let req = self
            .request(Method::POST, "/auth/v1/token?grant_type=refresh_token")
            .json(&json!({ "refresh_token": refresh_token }));
        let response = self.send(req).await?;
        self.grant(response, IdentityError::InvalidToken).await
    }

    async fn resolve_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        let req = self
            .request(Method::GET, "/auth/v1/user")
            .bearer_auth(access_token);
        let response = check_status(self.send(req).await?, IdentityError::InvalidToken).await?;
        let user: UserBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Rejected(format!("malformed user response: {e}")))?;
        Ok(user.into())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let req = self
            .request(Method::POST, "/auth/v1/logout")
            .bearer_auth(access_token);
        check_status(self.send(req).await?, IdentityError::InvalidToken).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let p = HttpIdentityProvider::new("https://auth.example.com/", None, Duration::from_secs(1))
            .unwrap();
        assert_eq!(p.base_url(), "https://auth.example.com");
    }

    #[test]
    fn test_grant_body_parses_provider_shape() {
        let body: GrantBody = serde_json::from_str(
            r#"{
                "access_token": "acc",
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "ref",
                "user": {
                    "id": "9f1c",
                    "email": "reader@example.com",
                    "user_metadata": { "username": "panel_fan" }
                }
            }"#,
        )
        .unwrap();

        let user: IdentityUser = body.user.unwrap().into();
        assert_eq!(body.access_token.as_deref(), Some("acc"));
        assert_eq!(user.id, "9f1c");
        assert_eq!(user.username.as_deref(), Some("panel_fan"));
    }

    #[test]
    fn test_user_body_without_metadata() {
        let user: UserBody = serde_json::from_str(r#"{"id":"u"}"#).unwrap();
        let user: IdentityUser = user.into();
        assert_eq!(user.email, "");
        assert_eq!(user.username, None);
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let p = HttpIdentityProvider::new("http://127.0.0.1:9", None, Duration::from_secs(2))
            .unwrap();
        let err = p.resolve_user("acc").await.unwrap_err();
        assert!(matches!(err, IdentityError::Unreachable(_)));
    }
}
