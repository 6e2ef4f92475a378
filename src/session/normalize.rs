use std::sync::LazyLock;

use regex::Regex;

/// Apostrophe look-alikes that count as `'` when matching.
const APOSTROPHES: [char; 5] = ['\u{2019}', '\u{2018}', '\u{02BC}', '`', '\u{FF07}'];

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+(?:'[A-Za-z]+)?").expect("word pattern compiles"));

pub fn normalize_apostrophes(text: &str) -> String {
    text.chars().map(fold_apostrophe).collect()
}

fn fold_apostrophe(c: char) -> char {
    if APOSTROPHES.contains(&c) { '\'' } else { c }
}

/// Comparison form of a single character: apostrophes folded, lowercased.
pub fn normalize_char(c: char) -> char {
    let c = fold_apostrophe(c);
    c.to_lowercase().next().unwrap_or(c)
}

/// The words a learner has to type for `sentence`, in order. Punctuation and
/// digits are not typed.
pub fn expected_words(sentence: &str) -> Vec<String> {
    let normalized = normalize_apostrophes(sentence);
    WORD_RE
        .find_iter(&normalized)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn chars_match(typed: char, expected: char) -> bool {
    normalize_char(typed) == normalize_char(expected)
}

/// Exact match of a whole word: same length, same characters after
/// normalization.
pub fn words_match(typed: &str, expected: &str) -> bool {
    typed.chars().count() == expected.chars().count()
        && typed
            .chars()
            .zip(expected.chars())
            .all(|(t, e)| chars_match(t, e))
}

/// Position of the first typed character that does not match, including
/// characters typed past the end of the expected word.
pub fn first_mismatch(typed: &str, expected: &str) -> Option<usize> {
    let mut expected = expected.chars();
    typed
        .chars()
        .position(|t| expected.next().is_none_or(|e| !chars_match(t, e)))
}
