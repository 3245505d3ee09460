use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content-derived identifier: a 32-byte BLAKE3 digest.
///
/// Used for fact identities (so re-ingesting a fact is idempotent), slug
/// suffixes, and snapshot digests. Produced by `hg_crypto::ContentHasher`,
/// which domain-separates each use.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Wrap a pre-computed hash.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.short_hex())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let id = ContentId::from_hash([0xab; 32]);
        assert_eq!(ContentId::from_hex(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert_eq!(
            ContentId::from_hex("abcd"),
            Err(TypeError::InvalidLength {
                expected: 32,
                actual: 2
            })
        );
        assert!(matches!(
            ContentId::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn short_hex_is_prefix() {
        let id = ContentId::from_hash([7; 32]);
        assert_eq!(id.short_hex().len(), 8);
        assert!(id.to_hex().starts_with(&id.short_hex()));
    }
}
