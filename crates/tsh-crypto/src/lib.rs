//! tsh-crypto: confidentiality for identity-provider tokens stored in cookies
//!
//! Envelope layout (hex, no separators):
//! ```text
//! [24 hex: 12-byte IV][32 hex: 16-byte GCM tag][2N hex: N-byte ciphertext]
//! ```
//!
//! Key: AES-256, Argon2id(shared secret, fixed salt). Stored cookie values may
//! carry a `v1.` scheme prefix; unprefixed all-hex values longer than the
//! header are treated as pre-versioning envelopes, anything else as a raw
//! legacy token.

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod kdf;

pub use cipher::{decrypt_token, encrypt_token, is_encrypted, TokenCipher};
pub use envelope::{is_envelope, tag_version, Envelope, StoredValue, VERSION_PREFIX};
pub use error::CipherError;
pub use kdf::{derive_token_key, KdfParams, TokenKey};

/// Size of the AES-256 token key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM initialization vector
pub const IV_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Hex length of the fixed `IV || tag` header
pub const HEADER_HEX_LEN: usize = 2 * (IV_SIZE + TAG_SIZE);
