use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;
use tsh_crypto::TokenCipher;

use crate::metrics::SessionMetrics;
use crate::session::{CookieSession, SessionSettings};

/// Auth router configuration.
///
/// The cipher is a constructor parameter: there is no way to build the
/// router without a validated secret.
pub struct AuthConfig {
    pub(crate) cipher: TokenCipher,
    pub(crate) settings: SessionSettings,
    pub(crate) base_path: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(cipher: TokenCipher, settings: SessionSettings) -> Self {
        Self {
            cipher,
            settings,
            base_path: "/api/auth".into(),
        }
    }

    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into();
        self
    }
}

/// Shared state for auth route handlers.
pub struct AuthState<P> {
    pub(crate) provider: Arc<P>,
    pub(crate) cipher: Arc<TokenCipher>,
    pub(crate) settings: SessionSettings,
    pub(crate) metrics: SessionMetrics,
}

// Manual Clone: avoid derive adding a `P: Clone` bound.
impl<P> Clone for AuthState<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            cipher: self.cipher.clone(),
            settings: self.settings.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<P> AuthState<P> {
    pub(crate) fn session<'a>(&'a self, jar: &'a mut CookieJar) -> CookieSession<'a, CookieJar> {
        CookieSession::new(&self.cipher, &self.settings, &self.metrics, jar)
    }
}
