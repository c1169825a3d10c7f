//! Bounded worker pool applying the fetcher to a batch of URLs.
//!
//! One task per URL, at most `concurrency` in flight. Each task reports
//! `(index, outcome)` over a channel and the collector writes it into a slot
//! sized to the input, so the output order is the input order no matter
//! which download finishes first.

use tokio::sync::{Semaphore, mpsc};
use tracing::{info, instrument};

use jaarverslag_shared::{JaarverslagError, Result};

use crate::error::FetchError;
use crate::fetcher::{DocumentFetcher, LeadText, validate_request};

/// Batch-wide settings.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Leading pages to keep per document.
    pub max_pages: usize,
    /// Maximum concurrent downloads.
    pub concurrency: usize,
}

/// Reported to the caller each time one URL finishes.
#[derive(Debug)]
pub struct BatchProgress<'a> {
    /// Input position of the URL that finished.
    pub index: usize,
    /// How many URLs have finished so far, including this one.
    pub completed: usize,
    /// Batch size.
    pub total: usize,
    pub url: &'a str,
    pub outcome: &'a LeadText,
}

/// Per-batch tally of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub text: usize,
    pub empty: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn of(outcomes: &[LeadText]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, lead| {
            match lead {
                LeadText::Text(_) => acc.text += 1,
                LeadText::Empty => acc.empty += 1,
                LeadText::Failed(_) => acc.failed += 1,
            }
            acc
        })
    }

    pub fn present(&self) -> usize {
        self.text + self.empty
    }
}

/// Fetch every URL, returning outcomes in input order.
///
/// Fails fast, before any request, if an argument is invalid. A panic in a
/// worker is re-raised once the other workers have finished.
#[instrument(skip_all, fields(total = urls.len(), concurrency = opts.concurrency))]
pub async fn fetch_all<F>(
    fetcher: &DocumentFetcher,
    urls: Vec<String>,
    opts: BatchOptions,
    mut on_done: F,
) -> Result<Vec<LeadText>>
where
    F: FnMut(BatchProgress<'_>),
{
    if opts.concurrency == 0 {
        return Err(JaarverslagError::validation("concurrency must be at least 1"));
    }
    for (index, url) in urls.iter().enumerate() {
        validate_request(url, opts.max_pages).map_err(|e| {
            JaarverslagError::validation(format!("row {index}: {e}"))
        })?;
    }

    let total = urls.len();
    info!(total, max_pages = opts.max_pages, "fetching documents");

    let semaphore = std::sync::Arc::new(Semaphore::new(opts.concurrency));
    let (tx, mut rx) = mpsc::channel::<(usize, String, LeadText)>(opts.concurrency);

    let mut handles = Vec::with_capacity(total);
    for (index, url) in urls.into_iter().enumerate() {
        let fetcher = fetcher.clone();
        let sem = semaphore.clone();
        let tx = tx.clone();
        let max_pages = opts.max_pages;

        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire_owned().await.expect("semaphore closed");
            let outcome = fetcher.fetch_validated(&url, max_pages).await;
            // The receiver lives until every sender is gone.
            let _ = tx.send((index, url, outcome)).await;
        }));
    }
    drop(tx);

    let mut slots: Vec<Option<LeadText>> = std::iter::repeat_with(|| None).take(total).collect();
    let mut completed = 0;
    while let Some((index, url, outcome)) = rx.recv().await {
        completed += 1;
        on_done(BatchProgress {
            index,
            completed,
            total,
            url: &url,
            outcome: &outcome,
        });
        slots[index] = Some(outcome);
    }

    for handle in handles {
        if let Err(e) = handle.await {
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic());
            }
        }
    }

    let outcomes: Vec<LeadText> = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                LeadText::Failed(FetchError::Other(format!("no result for row {index}")))
            })
        })
        .collect();

    let summary = BatchSummary::of(&outcomes);
    info!(
        text = summary.text,
        empty = summary.empty,
        failed = summary.failed,
        "document batch completed"
    );

    Ok(outcomes)
}
