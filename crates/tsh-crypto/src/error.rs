use thiserror::Error;

/// Token cipher failures. None of these carry token material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("refusing to encrypt an empty token")]
    EmptyPlaintext,

    #[error("token encryption failed")]
    Encrypt,

    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("envelope authentication failed: wrong key or tampered data")]
    Authentication,

    #[error("decrypted token is not valid UTF-8")]
    NotUtf8,
}

impl From<CipherError> for tsh_core::TshError {
    fn from(e: CipherError) -> Self {
        tsh_core::TshError::Crypto(e.to_string())
    }
}
