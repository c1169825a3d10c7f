//! Source collectors: each portal yields raw `(organisation name, document URL)` pairs.
//!
//! This crate provides:
//! - [`SourceCollector`]: the collector contract
//! - [`VlaanderenCollector`]: annual reports published on vlaanderen.be
//! - [`PairsFileCollector`]: pairs gathered elsewhere and stored as CSV

mod pairs_file;
mod vlaanderen;

use std::future::Future;

use jaarverslag_shared::{CollectedPair, Result};

pub use pairs_file::PairsFileCollector;
pub use vlaanderen::{VlaanderenCollector, parse_listing, parse_publication};

/// A data source producing `(organisation name, document URL)` pairs in a stable order.
pub trait SourceCollector: Send + Sync {
    /// Short source name, used for logging and output file names.
    fn name(&self) -> &str;

    /// Gather every pair this source offers.
    fn collect(&self) -> impl Future<Output = Result<Vec<CollectedPair>>> + Send;
}
