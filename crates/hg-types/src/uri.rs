use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// External identifier of an entity.
///
/// URIs come from several vocabularies at once (Wikidata, Getty AAT,
/// CIDOC-CRM, project-local namespaces) and are compared byte-for-byte. The
/// only normalization applied is trimming surrounding whitespace.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uri(String);

impl Uri {
    /// Parse and validate a URI string.
    ///
    /// A URI must be non-empty and contain no interior whitespace.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TypeError::InvalidUri {
                uri: raw.to_string(),
                reason: "must not be empty".into(),
            });
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidUri {
                uri: raw.to_string(),
                reason: "must not contain whitespace".into(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The URI as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path or fragment segment, e.g. `Q42` for
    /// `http://www.wikidata.org/entity/Q42`.
    pub fn local_name(&self) -> &str {
        let trimmed = self.0.trim_end_matches(['/', '#']);
        trimmed
            .rsplit(['/', '#'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.0)
    }
}

impl TryFrom<String> for Uri {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Uri> for String {
    fn from(uri: Uri) -> Self {
        uri.0
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uri({})", self.0)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle of a registered entity in the identifier arena.
///
/// Handles are dense, assigned in registration order, and never reused.
/// They carry no meaning outside the registry that issued them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef(u32);

impl EntityRef {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position in the arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef(#{})", self.0)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
