use serde::{Deserialize, Serialize};

/// Access cookie name. Part of the client compatibility surface.
pub const ACCESS_COOKIE: &str = "access_token";
/// Refresh cookie name.
pub const REFRESH_COOKIE: &str = "refresh_token";
/// Script-readable session info cookie name.
pub const SESSION_COOKIE: &str = "user_session";

/// Access cookie lifetime in seconds (15 minutes)
pub const ACCESS_TTL_SECS: i64 = 15 * 60;
/// Refresh cookie lifetime in seconds (7 days)
pub const REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;
/// Session info cookie lifetime in seconds (7 days)
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Bearer credentials issued by the identity provider.
#[derive(Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// A user as resolved by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Non-confidential record kept in the script-readable session cookie.
///
/// Holds display data only; it must never carry a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<&IdentityUser> for SessionInfo {
    fn from(user: &IdentityUser) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_info_json_shape() {
        let info = SessionInfo {
            user_id: "u-1".into(),
            email: "reader@example.com".into(),
            username: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"user_id":"u-1","email":"reader@example.com"}"#);

        let parsed: SessionInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn test_session_info_from_user() {
        let user = IdentityUser {
            id: "u-2".into(),
            email: "a@b.c".into(),
            username: Some("panel_fan".into()),
        };
        let info = SessionInfo::from(&user);
        assert_eq!(info.user_id, "u-2");
        assert_eq!(info.username.as_deref(), Some("panel_fan"));
    }

    #[test]
    fn test_token_pair_debug_is_redacted() {
        let pair = TokenPair {
            access_token: "acc123".into(),
            refresh_token: "ref456".into(),
        };
        let debug = format!("{pair:?}");
        assert!(!debug.contains("acc123"));
        assert!(!debug.contains("ref456"));
    }

    #[test]
    fn test_ttls_differ() {
        assert_eq!(ACCESS_TTL_SECS, 900);
        assert_eq!(REFRESH_TTL_SECS, 604_800);
        assert!(ACCESS_TTL_SECS < REFRESH_TTL_SECS);
    }
}
