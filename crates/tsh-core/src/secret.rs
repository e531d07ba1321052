//! The shared token encryption secret.
//!
//! There is no built-in default: a deployment must supply the secret through
//! its environment, and startup fails if it is missing or too short.

use secrecy::{ExposeSecret, SecretString};

use crate::error::{TshError, TshResult};

/// Minimum accepted secret length, in characters.
pub const MIN_SECRET_LEN: usize = 32;

/// A validated shared secret from which the token key is derived.
pub struct TokenSecret {
    inner: SecretString,
}

impl TokenSecret {
    pub fn new(secret: SecretString) -> TshResult<Self> {
        let len = secret.expose_secret().chars().count();
        if len < MIN_SECRET_LEN {
            return Err(TshError::Config(format!(
                "token secret too short: {len} characters (minimum {MIN_SECRET_LEN})"
            )));
        }
        Ok(Self { inner: secret })
    }

    /// Read and validate the secret from the environment variable `var`.
    pub fn from_env(var: &str) -> TshResult<Self> {
        let value = std::env::var(var)
            .map_err(|_| TshError::Config(format!("{var} is required (token secret)")))?;
        Self::new(SecretString::from(value))
    }

    pub fn expose_secret(&self) -> &str {
        self.inner.expose_secret()
    }
}

impl std::fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSecret")
            .field("inner", &"[REDACTED]")
            .finish()
    }
}
