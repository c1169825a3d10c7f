//! Pairs supplied as a CSV file with `name,url` headers.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use jaarverslag_shared::{CollectedPair, JaarverslagError, Result};

use crate::SourceCollector;

/// Reads `(name, url)` pairs gathered by an external scraper.
pub struct PairsFileCollector {
    name: String,
    path: PathBuf,
}

impl PairsFileCollector {
    /// `name` labels the source in logs and output files.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// The CSV file this collector reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceCollector for PairsFileCollector {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(source = %self.name, path = %self.path.display()))]
    async fn collect(&self) -> Result<Vec<CollectedPair>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| JaarverslagError::io(&self.path, e))?;

        let pairs = parse_pairs(&content).map_err(|e| {
            JaarverslagError::parse(format!("{}: {e}", self.path.display()))
        })?;

        info!(pairs = pairs.len(), "pairs file loaded");
        Ok(pairs)
    }
}

fn parse_pairs(content: &str) -> std::result::Result<Vec<CollectedPair>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    reader.deserialize().collect()
}
