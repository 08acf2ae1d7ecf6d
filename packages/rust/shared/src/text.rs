//! Text normalization and slugging.
//!
//! [`normalize`] is a comparison key and is never shown to users.
//! [`slugify`] produces the stable, ASCII-only fragments that node
//! identifiers are built from.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Dash variants folded to an ASCII hyphen by [`normalize`].
const DASH_VARIANTS: &[char] = &[
    '\u{2010}', // hyphen
    '\u{2011}', // non-breaking hyphen
    '\u{2012}', // figure dash
    '\u{2013}', // en dash
    '\u{2014}', // em dash
    '\u{2212}', // minus sign
];

/// Trim, collapse whitespace runs, fold dash variants and lower-case.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .map(|c| if DASH_VARIANTS.contains(&c) { '-' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Decompose and drop combining marks (`"Súmernosť"` → `"Sumernost"`).
pub fn strip_diacritics(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Normalization used for matching labels regardless of case, accents,
/// whitespace and dash style.
pub fn match_key(text: &str) -> String {
    strip_diacritics(&normalize(text))
}

/// Build a URL-safe slug: strip diacritics, lower-case, replace every run of
/// non-alphanumeric characters with a single hyphen, trim hyphens.
pub fn slugify(text: &str) -> String {
    let folded = strip_diacritics(text).to_lowercase();

    let mut slug = String::with_capacity(folded.len());
    let mut pending_hyphen = false;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Slug for a statement label. Trailing periods are dropped first so that
/// `"Uses percent."` and `"Uses percent"` share an identifier.
pub fn statement_slug(text: &str) -> String {
    slugify(text.trim().trim_end_matches('.'))
}

/// Display form of a buffered statement: trimmed, trailing commas removed.
pub fn clean_statement(text: &str) -> String {
    text.trim().trim_end_matches(',').trim_end().to_string()
}
