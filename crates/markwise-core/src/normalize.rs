//! Text normalization shared by matching, scoring and display.
//!
//! Every comparison in markwise goes through [`fold`], and every stored or
//! displayed text goes through [`normalize`], so canonicalization is the same
//! everywhere.

/// Clean raw extracted text.
///
/// Line breaks and whitespace runs collapse to single spaces, a leading run of
/// non-word characters (bullets, numbering punctuation, stray symbols) is
/// stripped, and the result is trimmed. Idempotent.
pub fn normalize(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_start_matches(|c: char| !is_word_char(c))
        .trim_end()
        .to_string()
}

/// [`normalize`] then lower-case. Used for all equality checks.
pub fn fold(text: &str) -> String {
    normalize(text).to_lowercase()
}

/// Word characters: Unicode letters and digits plus `_`.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
