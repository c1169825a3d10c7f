//! Individual cleaning passes for organisation names.
//!
//! Each pass is a function `&str -> String` (or `&str -> &str` for
//! extraction); [`crate::NameNormalizer`] applies them in a fixed order.

use std::sync::LazyLock;

use regex::Regex;

/// Characters treated as dashes and turned into spaces.
const DASHES: &[char] = &['-', '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}'];

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

/// Collapse every whitespace run into a single space and trim the ends.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    WS_RE.replace_all(s, " ").trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Noise tokens
// ---------------------------------------------------------------------------

/// Compile a noise vocabulary into one case-insensitive, whole-word regex.
///
/// Longer entries come first so `annual report` wins over `report`.
/// Internal spaces of multi-word entries match any whitespace run.
/// Returns `Ok(None)` for an empty vocabulary.
pub(crate) fn compile_noise_pattern<S: AsRef<str>>(
    words: &[S],
) -> Result<Option<Regex>, regex::Error> {
    let mut alternatives: Vec<String> = words
        .iter()
        .map(|w| w.as_ref().trim())
        .filter(|w| !w.is_empty())
        .map(|w| {
            w.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    alternatives.dedup();

    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    Regex::new(&pattern).map(Some)
}

/// Strip noise tokens, collapse whitespace, trim.
pub(crate) fn remove_noise(noise: Option<&Regex>, name: &str) -> String {
    match noise {
        Some(re) => collapse_whitespace(&re.replace_all(name, " ")),
        None => collapse_whitespace(name),
    }
}

// ---------------------------------------------------------------------------
// Pass 2: Year-like numbers and dashes
// ---------------------------------------------------------------------------

/// Strip standalone 4-digit numbers, turn dashes into spaces, collapse, trim.
///
/// Runs of 3 or 5+ digits are left alone.
pub(crate) fn clean_numbers(name: &str) -> String {
    static YEAR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\b\d{4}\b").expect("valid regex"));

    let without_years = YEAR_RE.replace_all(name, "");
    let without_dashes = without_years.replace(DASHES, " ");
    collapse_whitespace(&without_dashes)
}

// ---------------------------------------------------------------------------
// Passes 3 & 4: Parentheticals
// ---------------------------------------------------------------------------

static PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*?)\)").expect("valid regex"));

/// Inner text of the first `(...)` group, verbatim; `""` when there is none.
pub(crate) fn extract_parenthetical(name: &str) -> &str {
    PAREN_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str())
}

/// Remove every `(...)` group together with its surrounding whitespace.
///
/// Each group is deliberately replaced by one space rather than removed, so
/// `Fonds(x)Vlaanderen` becomes `Fonds Vlaanderen` instead of gluing the
/// neighbouring words together.
pub(crate) fn strip_parentheticals(name: &str) -> String {
    static STRIP_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s*\(.*?\)\s*").expect("valid regex"));

    STRIP_RE.replace_all(name, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_mixed_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn noise_pattern_prefers_longest_entry() {
        let re = compile_noise_pattern(&["report", "annual report"])
            .unwrap()
            .unwrap();
        assert_eq!(remove_noise(Some(&re), "ACME Annual   Report"), "ACME");
    }

    #[test]
    fn empty_vocabulary_compiles_to_none() {
        let words: [&str; 2] = ["", "  "];
        assert!(compile_noise_pattern(&words).unwrap().is_none());
        assert_eq!(remove_noise(None, " De  Lijn "), "De Lijn");
    }

    #[test]
    fn noise_vocabulary_is_escaped() {
        let re = compile_noise_pattern(&["a.b"]).unwrap().unwrap();
        assert_eq!(remove_noise(Some(&re), "axb a.b"), "axb");
    }

    #[test]
    fn clean_numbers_only_touches_four_digit_runs() {
        assert_eq!(clean_numbers("VMM 2021"), "VMM");
        assert_eq!(clean_numbers("Route 123"), "Route 123");
        assert_eq!(clean_numbers("Dossier 12345"), "Dossier 12345");
        assert_eq!(clean_numbers("2020a"), "2020a");
    }

    #[test]
    fn clean_numbers_replaces_dashes() {
        assert_eq!(clean_numbers("Agentschap - Natuur"), "Agentschap Natuur");
        assert_eq!(clean_numbers("Agentschap\u{2013}Natuur"), "Agentschap Natuur");
        assert_eq!(clean_numbers("2019-2020"), "");
    }

    #[test]
    fn extract_first_parenthetical_only() {
        assert_eq!(extract_parenthetical("Vlaamse Milieumaatschappij (VMM)"), "VMM");
        assert_eq!(extract_parenthetical("A (B) and (C)"), "B");
        assert_eq!(extract_parenthetical("No group"), "");
        assert_eq!(extract_parenthetical("Unclosed (group"), "");
    }

    #[test]
    fn strip_keeps_neighbouring_words_apart() {
        assert_eq!(strip_parentheticals("De Lijn (DL) Vlaanderen"), "De Lijn Vlaanderen");
        assert_eq!(strip_parentheticals("Fonds(x)Vlaanderen"), "Fonds Vlaanderen");
        assert_eq!(strip_parentheticals("(X) Agentschap"), "Agentschap");
        assert_eq!(strip_parentheticals("Agentschap"), "Agentschap");
    }
}
