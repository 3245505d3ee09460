use serde::Serialize;

use hg_types::{ContentId, Timestamp, Uri};

/// Line that separates documents sharing one output file.
///
/// An HTML comment, so grouped files still read as plain markdown.
pub const DOCUMENT_SEPARATOR: &str = "<!-- hgraph:document -->";

/// Rendered text of one snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Document {
    pub uri: Uri,
    /// The title label; drives the output path.
    pub label: String,
    pub as_of: Timestamp,
    /// Digest of the snapshot this was rendered from.
    pub digest: ContentId,
    pub body: String,
}

impl Document {
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Escape lines of literal text that would read as a separator.
pub(crate) fn escape_separator(line: &str) -> std::borrow::Cow<'_, str> {
    if line.trim() == DOCUMENT_SEPARATOR {
        std::borrow::Cow::Owned(format!("\\{line}"))
    } else {
        std::borrow::Cow::Borrowed(line)
    }
}
