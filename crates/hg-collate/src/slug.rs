use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use hg_crypto::ContentHasher;

/// Slug used when a label has no alphanumeric character at all.
const FALLBACK_SLUG: &str = "entity";

/// NFKD-decompose, drop combining marks and lowercase.
///
/// `Panagía` and `PANAGIA` fold to the same text. Compatibility forms are
/// unfolded too, so `ﬁ` becomes `fi`.
pub fn fold_label(label: &str) -> String {
    label
        .nfkd()
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// The collision key of a label: folded, with whitespace runs collapsed.
pub fn label_key(label: &str) -> String {
    fold_label(label)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// File-system slug of a label.
///
/// Runs of anything but letters and digits collapse to one `-`; leading and
/// trailing dashes are dropped. Letters outside ASCII survive, so Greek and
/// Arabic labels keep readable names.
pub fn slug_for(label: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in fold_label(label).chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// `<slug>-<8 hex>.md` for a label.
///
/// The suffix hashes the collision key, so two labels share a file name
/// exactly when they fold to the same key.
pub fn file_name_for(label: &str) -> String {
    let suffix = ContentHasher::SLUG.hash(label_key(label).as_bytes()).short_hex();
    format!("{}-{suffix}.md", slug_for(label))
}
