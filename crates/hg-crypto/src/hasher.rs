use hg_types::ContentId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"hg-fact-v1"`) that is prepended
/// to every hash computation, so a fact and a slug key with identical bytes
/// produce different digests.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for fact identities.
    pub const FACT: Self = Self {
        domain: "hg-fact-v1",
    };
    /// Hasher for output slug suffixes.
    pub const SLUG: Self = Self {
        domain: "hg-slug-v1",
    };
    /// Hasher for rendered snapshot bodies.
    pub const SNAPSHOT: Self = Self {
        domain: "hg-snapshot-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentId {
        let mut hasher = self.start();
        hasher.update(data);
        ContentId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash a sequence of fields without ambiguity.
    ///
    /// Each part is length-prefixed, so `["ab", "c"]` and `["a", "bc"]`
    /// hash differently.
    pub fn hash_parts(&self, parts: &[&[u8]]) -> ContentId {
        let mut hasher = self.start();
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        ContentId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash a serializable value as JSON with domain separation.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<ContentId, HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }

    /// Verify that data produces the expected id.
    pub fn verify(&self, data: &[u8], expected: &ContentId) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    fn start(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
