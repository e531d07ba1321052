//! Cookie Session Boundary: wraps the token cipher around the three session cookies.
//!
//! Writes always encrypt. Reads classify the stored value first: tagged or
//! envelope-shaped values are decrypted, anything else is a legacy raw token
//! and is returned as-is.

use tsh_core::types::{ACCESS_COOKIE, REFRESH_COOKIE, SESSION_COOKIE};
use tsh_core::SessionInfo;
use tsh_crypto::{tag_version, CipherError, StoredValue, TokenCipher};

use crate::cookies;
use crate::metrics::SessionMetrics;
use crate::store::CookieStore;

/// Cookie behaviour switches, taken from `[session]` config.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Set the `Secure` attribute (HTTPS only)
    pub secure_cookies: bool,
    /// Write new envelopes as `v1.<envelope>`
    pub write_version_tag: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            secure_cookies: true,
            write_version_tag: true,
        }
    }
}

impl From<&tsh_core::config::SessionConfig> for SessionSettings {
    fn from(cfg: &tsh_core::config::SessionConfig) -> Self {
        Self {
            secure_cookies: cfg.secure_cookies,
            write_version_tag: cfg.write_version_tag,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A token could not be encrypted; nothing was written.
    #[error("token encryption failed: {0}")]
    Encrypt(#[source] CipherError),

    /// A stored value looked like an envelope but did not decrypt.
    #[error("{cookie} cookie could not be decrypted")]
    Undecryptable { cookie: &'static str },

    #[error("session info serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Session lifecycle state as observable from the cookies alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    Authenticated,
    AccessExpiredRefreshValid,
}

/// The session view of one request's cookie store.
pub struct CookieSession<'a, S: CookieStore> {
    cipher: &'a TokenCipher,
    settings: &'a SessionSettings,
    metrics: &'a SessionMetrics,
    store: &'a mut S,
}

impl<'a, S: CookieStore> CookieSession<'a, S> {
    pub fn new(
        cipher: &'a TokenCipher,
        settings: &'a SessionSettings,
        metrics: &'a SessionMetrics,
        store: &'a mut S,
    ) -> Self {
        Self {
            cipher,
            settings,
            metrics,
            store,
        }
    }

    /// Encrypt and store both tokens.
    ///
    /// Both envelopes are built before either cookie is written, so a failure
    /// leaves the existing pair untouched.
    pub fn set_auth_cookies(&mut self, access: &str, refresh: &str) -> Result<(), SessionError> {
        let access_value = self.seal(ACCESS_COOKIE, access)?;
        let refresh_value = self.seal(REFRESH_COOKIE, refresh)?;

        let secure = self.settings.secure_cookies;
        self.store.set(cookies::access_cookie(access_value, secure));
        self.store.set(cookies::refresh_cookie(refresh_value, secure));
        Ok(())
    }

    /// Tolerant read: a value that fails to decrypt is returned unchanged.
    pub fn get_access_token(&self) -> Option<String> {
        self.get_token(ACCESS_COOKIE)
    }

    /// Tolerant read: a value that fails to decrypt is returned unchanged.
    pub fn get_refresh_token(&self) -> Option<String> {
        self.get_token(REFRESH_COOKIE)
    }

    /// Strict read: a value that fails to decrypt is an error.
    pub fn read_access_token(&self) -> Result<Option<String>, SessionError> {
        self.read_token(ACCESS_COOKIE)
    }

    /// Strict read: a value that fails to decrypt is an error.
    pub fn read_refresh_token(&self) -> Result<Option<String>, SessionError> {
        self.read_token(REFRESH_COOKIE)
    }

    /// Remove all three session cookies. Safe to call repeatedly.
    pub fn clear_auth_cookies(&mut self) {
        self.store.remove(ACCESS_COOKIE);
        self.store.remove(REFRESH_COOKIE);
        self.store.remove(SESSION_COOKIE);
    }

    pub fn set_session_cookie(&mut self, info: &SessionInfo) -> Result<(), SessionError> {
        let json = serde_json::to_string(info)?;
        self.store
            .set(cookies::session_info_cookie(json, self.settings.secure_cookies));
        Ok(())
    }

    /// The stored session info, or `None` if absent or unparseable.
    pub fn get_session_cookie(&self) -> Option<SessionInfo> {
        let raw = self.stored(SESSION_COOKIE)?;
        match serde_json::from_str(&raw) {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed session info cookie");
                None
            }
        }
    }

    /// Authenticated needs all three cookies; a refresh cookie alone means the
    /// access cookie expired. Any other combination is not a session.
    pub fn state(&self) -> SessionState {
        let access = self.stored(ACCESS_COOKIE).is_some();
        let refresh = self.stored(REFRESH_COOKIE).is_some();
        let info = self.stored(SESSION_COOKIE).is_some();
        match (access, refresh, info) {
            (true, true, true) => SessionState::Authenticated,
            (false, true, _) => SessionState::AccessExpiredRefreshValid,
            _ => SessionState::NoSession,
        }
    }

    fn stored(&self, name: &str) -> Option<String> {
        self.store.get(name).filter(|v| !v.is_empty())
    }

    fn seal(&self, cookie: &'static str, token: &str) -> Result<String, SessionError> {
        let envelope = self.cipher.encrypt(token).map_err(|e| {
            self.metrics.token_encrypt_failures.inc();
            tracing::error!(cookie, error = %e, "token encryption failed");
            SessionError::Encrypt(e)
        })?;

        Ok(if self.settings.write_version_tag {
            tag_version(&envelope)
        } else {
            envelope
        })
    }

    fn get_token(&self, cookie: &'static str) -> Option<String> {
        let raw = self.stored(cookie)?;
        Some(self.open(cookie, &raw).unwrap_or(raw))
    }

    fn read_token(&self, cookie: &'static str) -> Result<Option<String>, SessionError> {
        match self.stored(cookie) {
            Some(raw) => self.open(cookie, &raw).map(Some),
            None => Ok(None),
        }
    }

    fn open(&self, cookie: &'static str, raw: &str) -> Result<String, SessionError> {
        let stored = StoredValue::classify(raw);
        let Some(envelope) = stored.envelope() else {
            self.metrics.legacy_token_reads.inc();
            tracing::debug!(cookie, "legacy unencrypted token read");
            return Ok(raw.to_string());
        };

        self.cipher.decrypt(envelope).map_err(|e| {
            self.metrics.token_decrypt_failures.inc();
            tracing::warn!(
                cookie,
                versioned = matches!(stored, StoredValue::Versioned(_)),
                error = %e,
                "stored token failed to decrypt"
            );
            SessionError::Undecryptable { cookie }
        })
    }
}
