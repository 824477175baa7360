//! String canonicalization.
//!
//! Raw input strings are folded into a canonical form before any distance is
//! computed: punctuation becomes whitespace, camel-case runs are split into
//! words, everything is lowercased and reduced to the ASCII subset, and runs
//! of whitespace collapse to single spaces. Canonical forms are the unit of
//! comparison; the raw forms are discarded.
//!
//! `normalize` is idempotent: its output is a fixed point of the function.

use std::collections::BTreeSet;

/// Canonicalize a raw string.
///
/// Steps, in order:
/// 1. Replace every character that is neither alphanumeric nor whitespace
///    with a space.
/// 2. Insert a space at each camel-case boundary: a lowercase letter or digit
///    followed by an uppercase letter, or an uppercase run ending where a
///    capitalized word begins (`"HTTPServer"` splits before `"Server"`).
/// 3. Lowercase, drop characters outside the ASCII subset, collapse runs of
///    whitespace to single spaces, and trim.
pub fn normalize(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_alphanumeric() || c.is_whitespace() {
            cleaned.push(c);
        } else {
            cleaned.push(' ');
        }
    }

    let chars: Vec<char> = cleaned.chars().collect();
    let mut spaced = String::with_capacity(chars.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let after_lower = prev.is_lowercase() || prev.is_numeric();
            let starts_word = prev.is_alphabetic()
                && chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            if after_lower || starts_word {
                spaced.push(' ');
            }
        }
        spaced.push(c);
    }

    let mut out = String::with_capacity(spaced.len());
    for part in spaced.split_whitespace() {
        let mut word = String::new();
        for c in part.chars().flat_map(char::to_lowercase) {
            if c.is_ascii() {
                word.push(c);
            }
        }
        if !word.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&word);
        }
    }
    out
}

/// Normalize a batch of raw strings into a deduplicated, sorted token set.
///
/// Strings that normalize to the empty string are dropped; raw inputs with
/// the same canonical form collapse to a single token. The result is sorted
/// so downstream matrices and artifacts are reproducible across runs.
pub fn normalize_tokens<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let set: BTreeSet<String> = raw
        .iter()
        .map(|s| normalize(s.as_ref()))
        .filter(|t| !t.is_empty())
        .collect();
    set.into_iter().collect()
}
