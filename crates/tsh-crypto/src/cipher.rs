//! AES-256-GCM token encryption/decryption
//!
//! Every call draws a fresh random 96-bit IV. The tag is kept detached so the
//! envelope can place it ahead of the ciphertext. No AAD is bound: envelopes
//! are opaque blobs moved between the server and its own cookies.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use rand::RngCore;
use tsh_core::TokenSecret;

use crate::envelope::{is_envelope, Envelope, StoredValue};
use crate::error::CipherError;
use crate::kdf::{derive_token_key, KdfParams, TokenKey};
use crate::IV_SIZE;

/// Encrypts and decrypts identity-provider tokens under one derived key.
///
/// The key is derived once at construction; each operation is synchronous
/// and touches no shared mutable state.
pub struct TokenCipher {
    key: TokenKey,
}

impl TokenCipher {
    /// Derive the key from `secret` with the default Argon2id parameters.
    pub fn new(secret: &TokenSecret) -> anyhow::Result<Self> {
        Self::with_params(secret, &KdfParams::default())
    }

    pub fn with_params(secret: &TokenSecret, params: &KdfParams) -> anyhow::Result<Self> {
        let key = derive_token_key(secret, params)?;
        Ok(Self::from_key(key))
    }

    pub fn from_key(key: TokenKey) -> Self {
        Self { key }
    }

    /// Encrypt a token into a hex envelope.
    ///
    /// Never falls back to the plaintext: callers decide what a failure means
    /// for the request.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Err(CipherError::EmptyPlaintext);
        }

        let cipher = Aes256Gcm::new(self.key.as_bytes().into());

        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| CipherError::Encrypt)?;

        let mut tag_bytes = [0u8; crate::TAG_SIZE];
        tag_bytes.copy_from_slice(tag.as_slice());

        Ok(Envelope {
            iv,
            tag: tag_bytes,
            ciphertext: buffer,
        }
        .encode())
    }

    /// Decrypt an unprefixed envelope. Fails on bad format or tag mismatch.
    pub fn decrypt(&self, envelope: &str) -> Result<String, CipherError> {
        let Envelope {
            iv,
            tag,
            mut ciphertext,
        } = Envelope::parse(envelope)?;

        let cipher = Aes256Gcm::new(self.key.as_bytes().into());
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&iv),
                b"",
                &mut ciphertext,
                Tag::from_slice(&tag),
            )
            .map_err(|_| CipherError::Authentication)?;

        String::from_utf8(ciphertext).map_err(|_| CipherError::NotUtf8)
    }

    /// Tolerant decryption of a stored value, tagged or not.
    ///
    /// Raw legacy tokens, and envelopes that fail to decrypt, are returned
    /// unchanged.
    pub fn decrypt_or_passthrough(&self, value: &str) -> String {
        let Some(envelope) = StoredValue::classify(value).envelope() else {
            return value.to_string();
        };
        match self.decrypt(envelope) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                tracing::debug!(error = %e, "token decryption failed, passing value through");
                value.to_string()
            }
        }
    }

    /// Whether `value` is an envelope, bare or carrying the `v1.` tag.
    pub fn is_encrypted(value: &str) -> bool {
        match StoredValue::classify(value) {
            StoredValue::Versioned(envelope) => is_envelope(envelope),
            StoredValue::Unversioned(_) => true,
            StoredValue::Raw(_) => false,
        }
    }
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher").field("key", &self.key).finish()
    }
}

/// `encryptToken`: encrypt a plaintext token.
pub fn encrypt_token(cipher: &TokenCipher, plaintext: &str) -> Result<String, CipherError> {
    cipher.encrypt(plaintext)
}

/// `decryptToken`: tolerant decryption, see [`TokenCipher::decrypt_or_passthrough`].
pub fn decrypt_token(cipher: &TokenCipher, value: &str) -> String {
    cipher.decrypt_or_passthrough(value)
}

/// `isEncrypted`: whether `value` has the envelope shape, with or without the tag.
pub fn is_encrypted(value: &str) -> bool {
    TokenCipher::is_encrypted(value)
}
