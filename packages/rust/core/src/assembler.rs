//! Dataset assembler.
//!
//! Turns collected pairs into [`Record`]s and attaches fetch outcomes to
//! them. Records are built once and only mutated in place afterwards; no
//! stage removes a row.

use tracing::{debug, info, instrument, warn};

use jaarverslag_fetcher::LeadText;
use jaarverslag_normalize::NameNormalizer;
use jaarverslag_shared::{CollectedPair, JaarverslagError, Record, Result};

/// Build one record per pair with a usable URL, names normalized.
///
/// Pairs whose URL is blank are dropped here, before any later stage sees
/// them.
#[instrument(skip_all, fields(pairs = pairs.len()))]
pub fn build_records(pairs: Vec<CollectedPair>, normalizer: &NameNormalizer) -> Vec<Record> {
    let total = pairs.len();
    let mut records = Vec::with_capacity(total);

    for pair in pairs {
        if pair.url.trim().is_empty() {
            warn!(name = %pair.organisation_name, "pair without document url, dropping");
            continue;
        }

        let normalized = normalizer.normalize(&pair.organisation_name);
        let mut record = Record::from_pair(CollectedPair {
            url: pair.url.trim().to_string(),
            ..pair
        });
        record.extended_name = normalized.extended().map(str::to_string);
        record.organisation_name = normalized.display_name;
        records.push(record);
    }

    info!(
        records = records.len(),
        dropped = total - records.len(),
        "records built"
    );
    records
}

/// Copy fetch outcomes onto their records, row for row.
pub fn attach_lead_texts(records: &mut [Record], outcomes: Vec<LeadText>) -> Result<()> {
    if records.len() != outcomes.len() {
        return Err(JaarverslagError::validation(format!(
            "{} records but {} fetch outcomes",
            records.len(),
            outcomes.len()
        )));
    }

    for (record, outcome) in records.iter_mut().zip(outcomes) {
        record.status = outcome.status();
        if let Some(err) = outcome.error() {
            debug!(url = %record.url, error = %err, "no lead text");
        }
        record.text = outcome.into_text();
    }

    Ok(())
}
