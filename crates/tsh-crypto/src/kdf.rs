//! Key derivation: Argon2id shared secret → token key

use argon2::{Algorithm, Argon2, Params, Version};
use tsh_core::TokenSecret;
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// Fixed salt. The secret is the confidentiality boundary; the salt only has
/// to be stable so the same secret always derives the same key.
const TOKEN_KEY_SALT: [u8; 16] = *b"toonshield-tok-1";

/// The 256-bit AES key used for token envelopes.
///
/// Zeroized on drop.
#[derive(Clone)]
pub struct TokenKey {
    bytes: [u8; KEY_SIZE],
}

impl TokenKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for TokenKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id parameters for KDF
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 16384 = 16 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 2)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 16384,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl From<&tsh_core::config::SessionConfig> for KdfParams {
    fn from(cfg: &tsh_core::config::SessionConfig) -> Self {
        Self {
            mem_cost_kib: cfg.argon2_mem_cost_kib,
            time_cost: cfg.argon2_time_cost,
            parallelism: cfg.argon2_parallelism,
        }
    }
}

/// Derive the token key from the shared secret using Argon2id and the fixed salt.
pub fn derive_token_key(secret: &TokenSecret, params: &KdfParams) -> anyhow::Result<TokenKey> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| anyhow::anyhow!("invalid Argon2id params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(secret.expose_secret().as_bytes(), &TOKEN_KEY_SALT, &mut key)
        .map_err(|e| anyhow::anyhow!("Argon2id KDF failed: {e}"))?;

    let token_key = TokenKey::from_bytes(key);
    key.zeroize();
    Ok(token_key)
}
