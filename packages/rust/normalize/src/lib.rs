//! Organisation-name normalization.
//!
//! Raw names scraped from the portals look like
//! `"Jaarverslag 2022 - Vlaamse Milieumaatschappij (VMM)"`. The normalizer
//! turns them into a display name (`"VMM"`) and, when the display name is an
//! abbreviation, an extended name (`"Vlaamse Milieumaatschappij"`).
//!
//! The transform is total and deterministic:
//! 1. strip noise tokens (whole words, case-insensitive)
//! 2. strip standalone 4-digit numbers, turn dashes into spaces
//! 3. read the first parenthetical from the *raw* name
//! 4. strip parentheticals before running 1–2 on the rest
//!
//! A non-blank raw name never normalizes to an empty display name.

mod passes;

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use jaarverslag_shared::{DEFAULT_NOISE_WORDS, JaarverslagError, NormalizeConfig, Result};

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// A raw name split into its first parenthetical and the parenthetical-free rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts {
    /// Inner text of the first `(...)` group, verbatim. Empty if none.
    pub parenthetical: String,
    /// The raw name with every `(...)` group removed, trimmed.
    pub base: String,
}

impl NameParts {
    pub fn split(raw: &str) -> Self {
        Self {
            parenthetical: passes::extract_parenthetical(raw).to_string(),
            base: passes::strip_parentheticals(raw),
        }
    }

    /// Whether the parenthetical can serve as a display name.
    fn has_abbreviation(&self) -> bool {
        !self.parenthetical.trim().is_empty()
    }
}

/// Output of [`NameNormalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedName {
    /// Canonical display name.
    pub display_name: String,
    /// Cleaned full name when `display_name` is an abbreviation, else empty.
    pub extended_name: String,
}

impl NormalizedName {
    /// The extended name, or `None` when there is none.
    pub fn extended(&self) -> Option<&str> {
        (!self.extended_name.is_empty()).then_some(self.extended_name.as_str())
    }
}

// ---------------------------------------------------------------------------
// NameNormalizer
// ---------------------------------------------------------------------------

/// Name normalizer with a compiled noise vocabulary.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    noise: Option<Regex>,
}

impl NameNormalizer {
    /// Build a normalizer for the given noise vocabulary.
    pub fn new<S: AsRef<str>>(noise_words: &[S]) -> Result<Self> {
        let noise = passes::compile_noise_pattern(noise_words)
            .map_err(|e| JaarverslagError::config(format!("invalid noise vocabulary: {e}")))?;
        Ok(Self { noise })
    }

    /// Build a normalizer from the `[normalize]` config section.
    pub fn from_config(config: &NormalizeConfig) -> Result<Self> {
        Self::new(config.noise_words.as_slice())
    }

    /// Steps 1 and 2: noise tokens, then years and dashes.
    pub fn clean(&self, name: &str) -> String {
        passes::clean_numbers(&passes::remove_noise(self.noise.as_ref(), name))
    }

    /// Normalize a raw organisation name.
    pub fn normalize(&self, raw: &str) -> NormalizedName {
        let parts = NameParts::split(raw);
        let cleaned = self.clean(&parts.base);

        let result = if parts.has_abbreviation() {
            NormalizedName {
                display_name: parts.parenthetical,
                extended_name: cleaned,
            }
        } else {
            NormalizedName {
                display_name: non_empty_fallback(cleaned, &parts.base, raw),
                extended_name: String::new(),
            }
        };

        trace!(
            raw,
            display = %result.display_name,
            extended = %result.extended_name,
            "normalized name"
        );
        result
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        DEFAULT_NORMALIZER.clone()
    }
}

static DEFAULT_NORMALIZER: LazyLock<NameNormalizer> = LazyLock::new(|| {
    NameNormalizer::new(DEFAULT_NOISE_WORDS).expect("default noise vocabulary compiles")
});

/// Normalize with the default noise vocabulary.
pub fn normalize(raw: &str) -> NormalizedName {
    DEFAULT_NORMALIZER.normalize(raw)
}

/// When cleaning wiped out the whole name, keep the number/dash-cleaned
/// name without the noise pass, then the trimmed raw name.
fn non_empty_fallback(cleaned: String, base: &str, raw: &str) -> String {
    if !cleaned.is_empty() {
        return cleaned;
    }
    let numbers_only = passes::clean_numbers(base);
    if !numbers_only.is_empty() {
        return numbers_only;
    }
    let numbers_only_raw = passes::clean_numbers(raw);
    if !numbers_only_raw.is_empty() {
        return numbers_only_raw;
    }
    passes::collapse_whitespace(raw)
}
