//! Envelope wire format and stored-value classification
//!
//! ```text
//! hex(IV: 12 bytes) || hex(tag: 16 bytes) || hex(ciphertext)
//! ```
//!
//! IV and tag have fixed widths, so the ciphertext is simply the remainder and
//! no separator is needed. The output is lowercase ASCII and cookie-safe.

use crate::error::CipherError;
use crate::{HEADER_HEX_LEN, IV_SIZE, TAG_SIZE};

/// Scheme tag written in front of envelopes stored in cookies.
pub const VERSION_PREFIX: &str = "v1.";

/// A parsed token envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub iv: [u8; IV_SIZE],
    pub tag: [u8; TAG_SIZE],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Encode as `hex(iv) || hex(tag) || hex(ciphertext)`.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(HEADER_HEX_LEN + 2 * self.ciphertext.len());
        out.push_str(&hex::encode(self.iv));
        out.push_str(&hex::encode(self.tag));
        out.push_str(&hex::encode(&self.ciphertext));
        out
    }

    /// Parse an unprefixed envelope string.
    pub fn parse(value: &str) -> Result<Self, CipherError> {
        if value.len() <= HEADER_HEX_LEN {
            return Err(CipherError::Malformed(format!(
                "{} characters (minimum {})",
                value.len(),
                HEADER_HEX_LEN + 1
            )));
        }
        if !value.is_ascii() {
            return Err(CipherError::Malformed("non-ASCII characters".into()));
        }

        let (iv_hex, rest) = value.split_at(2 * IV_SIZE);
        let (tag_hex, ct_hex) = rest.split_at(2 * TAG_SIZE);

        let mut iv = [0u8; IV_SIZE];
        hex::decode_to_slice(iv_hex, &mut iv)
            .map_err(|e| CipherError::Malformed(format!("IV: {e}")))?;

        let mut tag = [0u8; TAG_SIZE];
        hex::decode_to_slice(tag_hex, &mut tag)
            .map_err(|e| CipherError::Malformed(format!("tag: {e}")))?;

        let ciphertext =
            hex::decode(ct_hex).map_err(|e| CipherError::Malformed(format!("ciphertext: {e}")))?;

        Ok(Self {
            iv,
            tag,
            ciphertext,
        })
    }
}

/// Heuristic used for values without a scheme tag: longer than the fixed
/// header and made only of hex digits.
///
/// A raw token that happens to be long, all-hex will be misclassified and then
/// fail to decrypt. Accepted: opaque provider tokens are not shaped that way.
pub fn is_envelope(value: &str) -> bool {
    value.len() > HEADER_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Add the scheme tag to an encoded envelope.
pub fn tag_version(envelope: &str) -> String {
    format!("{VERSION_PREFIX}{envelope}")
}

/// How a value read back from a cookie should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredValue<'a> {
    /// Carried the `v1.` tag; holds the envelope without the tag.
    Versioned(&'a str),
    /// Untagged value that looks like an envelope (written before tagging).
    Unversioned(&'a str),
    /// Raw legacy token, returned as-is.
    Raw(&'a str),
}

impl<'a> StoredValue<'a> {
    pub fn classify(value: &'a str) -> Self {
        if let Some(envelope) = value.strip_prefix(VERSION_PREFIX) {
            StoredValue::Versioned(envelope)
        } else if is_envelope(value) {
            StoredValue::Unversioned(value)
        } else {
            StoredValue::Raw(value)
        }
    }

    /// The envelope to decrypt, if this value should be decrypted at all.
    pub fn envelope(&self) -> Option<&'a str> {
        match self {
            StoredValue::Versioned(e) | StoredValue::Unversioned(e) => Some(e),
            StoredValue::Raw(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Envelope {
        Envelope {
            iv: [0x01; IV_SIZE],
            tag: [0xAB; TAG_SIZE],
            ciphertext: vec![0xDE, 0xAD, 0xBE, 0xEF],
        }
    }

    #[test]
    fn test_encode_layout() {
        let encoded = sample().encode();

        assert_eq!(encoded.len(), HEADER_HEX_LEN + 8);
        assert_eq!(&encoded[..24], "010101010101010101010101");
        assert_eq!(&encoded[24..56], "ab".repeat(16));
        assert_eq!(&encoded[56..], "deadbeef");
    }

    #[test]
    fn test_parse_encoded() {
        let env = sample();
        assert_eq!(Envelope::parse(&env.encode()).unwrap(), env);
    }

    #[test]
    fn test_parse_rejects_header_only() {
        let header_only = "0".repeat(HEADER_HEX_LEN);
        assert!(matches!(
            Envelope::parse(&header_only),
            Err(CipherError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_odd_ciphertext() {
        let value = format!("{}abc", "0".repeat(HEADER_HEX_LEN));
        assert!(Envelope::parse(&value).is_err());
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let value = format!("{}zz", "0".repeat(HEADER_HEX_LEN));
        assert!(Envelope::parse(&value).is_err());
    }

    #[test]
    fn test_parse_rejects_multibyte() {
        let value = format!("{}é", "0".repeat(HEADER_HEX_LEN));
        assert!(Envelope::parse(&value).is_err());
    }

    #[test]
    fn test_is_envelope_boundaries() {
        assert!(!is_envelope(""));
        assert!(!is_envelope("short"));
        assert!(!is_envelope(&"g".repeat(60)));
        assert!(!is_envelope(&"a".repeat(HEADER_HEX_LEN)));
        assert!(is_envelope(&"a".repeat(HEADER_HEX_LEN + 1)));
        assert!(is_envelope(&"AbCdEf0123".repeat(6)));
    }

    #[test]
    fn test_classify() {
        let env = sample().encode();
        let tagged = tag_version(&env);

        assert_eq!(StoredValue::classify(&tagged), StoredValue::Versioned(&env));
        assert_eq!(StoredValue::classify(&env), StoredValue::Unversioned(&env));
        assert_eq!(
            StoredValue::classify("raw-legacy-token-not-hex"),
            StoredValue::Raw("raw-legacy-token-not-hex")
        );
        assert_eq!(StoredValue::classify("raw-legacy-token-not-hex").envelope(), None);
        assert_eq!(StoredValue::classify(&tagged).envelope(), Some(env.as_str()));
    }

    #[test]
    fn test_versioned_classification_is_exact() {
        // The tag decides, even when the remainder would fail the heuristic.
        assert_eq!(StoredValue::classify("v1.short"), StoredValue::Versioned("short"));
    }

    proptest! {
        #[test]
        fn encoded_is_always_envelope(
            iv in any::<[u8; IV_SIZE]>(),
            tag in any::<[u8; TAG_SIZE]>(),
            ciphertext in proptest::collection::vec(any::<u8>(), 1..=256),
        ) {
            let encoded = Envelope { iv, tag, ciphertext }.encode();
            prop_assert!(is_envelope(&encoded));
        }

        #[test]
        fn non_hex_is_never_envelope(s in "[g-z_.-]{57,120}") {
            prop_assert!(!is_envelope(&s));
        }
    }
}
