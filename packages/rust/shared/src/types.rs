//! Core domain types for the annual-report dataset.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CollectedPair
// ---------------------------------------------------------------------------

/// A raw `(organisation name, document URL)` pair produced by a source collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedPair {
    /// Organisation name exactly as scraped.
    #[serde(rename = "name")]
    pub organisation_name: String,
    /// Link to the annual-report document.
    pub url: String,
}

impl CollectedPair {
    pub fn new(organisation_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            organisation_name: organisation_name.into(),
            url: url.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// FetchStatus
// ---------------------------------------------------------------------------

/// How the `text` field of a [`Record`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetchStatus {
    /// The fetch stage has not run yet.
    #[default]
    Pending,
    /// Document parsed; text holds its leading pages.
    Text,
    /// Document parsed but had no pages.
    Empty,
    /// Connection, timeout, TLS, redirect, status or body failure.
    Transport,
    /// Download succeeded but the bytes were not a readable document.
    Document,
    /// Unclassified failure.
    Other,
}

impl FetchStatus {
    /// `true` for the outcomes that leave `text` absent.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Transport | Self::Document | Self::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Text => "text",
            Self::Empty => "empty",
            Self::Transport => "transport",
            Self::Document => "document",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FetchStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "text" => Ok(Self::Text),
            "empty" => Ok(Self::Empty),
            "transport" => Ok(Self::Transport),
            "document" => Ok(Self::Document),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown fetch status '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One row of the output table.
///
/// Built from a [`CollectedPair`]; the normalizer rewrites
/// `organisation_name` and fills `extended_name`, the fetcher fills `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Canonical display name (abbreviation when one was found).
    pub organisation_name: String,
    /// Document URL, never blank.
    pub url: String,
    /// Cleaned full name when the display name is an abbreviation.
    pub extended_name: Option<String>,
    /// Lead text of the document; `None` when the fetch failed.
    pub text: Option<String>,
    /// Which fetch outcome produced `text`.
    pub status: FetchStatus,
}

impl Record {
    /// A record straight from a collected pair, before any stage has run.
    pub fn from_pair(pair: CollectedPair) -> Self {
        Self {
            organisation_name: pair.organisation_name,
            url: pair.url,
            extended_name: None,
            text: None,
            status: FetchStatus::Pending,
        }
    }
}
