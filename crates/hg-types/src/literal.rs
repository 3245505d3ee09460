use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker left by upstream exporters on comments they cut short.
pub const TRUNCATION_MARKER: &str = "...[truncated]";

/// Literal object of a fact: a date, a label, a comment, a raw identifier.
///
/// The value is kept exactly as ingested. Nothing in hgraph repairs,
/// normalizes or re-expands literal text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

/// Why a literal looks damaged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnomalyKind {
    /// Contains U+FFFD, the trace of an earlier lossy decode.
    ReplacementCharacter,
    /// UTF-8 bytes that were decoded as Latin-1 / Windows-1252 (`Ã©` for `é`).
    Mojibake,
    /// Control characters other than tab and newline.
    ControlCharacter,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReplacementCharacter => f.write_str("replacement character"),
            Self::Mojibake => f.write_str("mixed encoding"),
            Self::ControlCharacter => f.write_str("control character"),
        }
    }
}

impl Literal {
    /// Literal without a language tag.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: None,
        }
    }

    /// Literal with a language tag (`el`, `en`, `grc`, ...).
    pub fn tagged(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: Some(lang.into()),
        }
    }

    /// Whether upstream cut this text short.
    pub fn is_truncated(&self) -> bool {
        self.value.ends_with(TRUNCATION_MARKER)
    }

    /// Detect malformed or mixed-encoding text.
    ///
    /// Detection only flags; the literal is always passed through unchanged.
    pub fn encoding_anomaly(&self) -> Option<AnomalyKind> {
        detect_anomaly(&self.value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn detect_anomaly(text: &str) -> Option<AnomalyKind> {
    if text.contains('\u{FFFD}') {
        return Some(AnomalyKind::ReplacementCharacter);
    }
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let lead = matches!(c, '\u{00C2}'..='\u{00C5}' | '\u{00CE}' | '\u{00CF}' | '\u{00E2}');
        if lead {
            if let Some(&next) = chars.peek() {
                // Continuation bytes 0x80..=0xBF decoded as Latin-1, plus the
                // Windows-1252 punctuation block that `â€` sequences produce.
                if matches!(next, '\u{0080}'..='\u{00BF}' | '\u{20AC}' | '\u{2018}'..='\u{201E}')
                {
                    return Some(AnomalyKind::Mojibake);
                }
            }
        }
    }
    // Checked after mojibake: C1 controls are what Latin-1 decoding leaves
    // behind for continuation bytes 0x80..=0x9F.
    if text
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\t' && c != '\r')
    {
        return Some(AnomalyKind::ControlCharacter);
    }
    None
}
