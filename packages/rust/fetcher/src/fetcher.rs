//! Single-document fetch: download, parse, keep the leading pages' text.
//!
//! This is the blast-radius boundary of a batch. Whatever happens on the
//! wire or inside the PDF parser is absorbed into [`LeadText::Failed`];
//! only invalid arguments come back as `Err`.

use std::time::Duration;

use reqwest::{Client, Url};
use tracing::{debug, instrument, warn};

use jaarverslag_shared::{FetchOptions, FetchStatus, JaarverslagError, Result};

use crate::document;
use crate::error::{DocumentKind, FetchError, TransportKind};

/// User-Agent string for document downloads.
const USER_AGENT: &str = concat!("jaarverslag/", env!("CARGO_PKG_VERSION"));

/// The portals serve Dutch content; ask for it explicitly.
const ACCEPT_LANGUAGE: &str = "nl-BE,nl;q=0.9,en;q=0.7";

// ---------------------------------------------------------------------------
// LeadText
// ---------------------------------------------------------------------------

/// Outcome of fetching one document.
#[derive(Debug)]
pub enum LeadText {
    /// The document parsed; text of its leading pages, concatenated in order.
    Text(String),
    /// The document parsed but has zero pages.
    Empty,
    /// Download or parsing failed.
    Failed(FetchError),
}

impl LeadText {
    /// Present-or-absent view: `Empty` becomes `Some("")`, `Failed` becomes `None`.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Empty => Some(String::new()),
            Self::Failed(_) => None,
        }
    }

    /// Borrowing variant of [`LeadText::into_text`].
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Empty => Some(""),
            Self::Failed(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// The table status for this outcome.
    pub fn status(&self) -> FetchStatus {
        match self {
            Self::Text(_) => FetchStatus::Text,
            Self::Empty => FetchStatus::Empty,
            Self::Failed(err) => err.status(),
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentFetcher
// ---------------------------------------------------------------------------

/// Downloads documents and extracts their lead text.
///
/// Cheap to clone; clones share the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: Client,
    max_document_bytes: u64,
}

impl DocumentFetcher {
    /// Create a fetcher with the given options.
    pub fn new(opts: &FetchOptions) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(opts.max_redirects))
            .timeout(opts.timeout)
            .connect_timeout(opts.timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| JaarverslagError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_document_bytes: opts.max_document_bytes,
        })
    }

    /// Fetch `url` and return the text of its first `max_pages` pages.
    ///
    /// Errors only for a blank `url` or `max_pages == 0`; every network or
    /// document failure is reported as [`LeadText::Failed`].
    pub async fn fetch_lead_text(&self, url: &str, max_pages: usize) -> Result<LeadText> {
        validate_request(url, max_pages)?;
        Ok(self.fetch_validated(url, max_pages).await)
    }

    /// Fetch with arguments already checked by [`validate_request`].
    #[instrument(skip_all, fields(url = %url, max_pages))]
    pub(crate) async fn fetch_validated(&self, url: &str, max_pages: usize) -> LeadText {
        match self.try_fetch(url, max_pages).await {
            Ok(lead) => {
                debug!(status = %lead.status(), "document fetched");
                lead
            }
            Err(err) => {
                warn!(error = %err, "document unavailable");
                LeadText::Failed(err)
            }
        }
    }

    async fn try_fetch(&self, url: &str, max_pages: usize) -> std::result::Result<LeadText, FetchError> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| FetchError::transport(TransportKind::InvalidUrl, format!("{url}: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::transport(
                TransportKind::InvalidUrl,
                format!("{url}: unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        let bytes = self.download(parsed).await?;
        if bytes.is_empty() {
            return Err(FetchError::document(DocumentKind::Empty, "response body is empty"));
        }

        let pages = tokio::task::spawn_blocking(move || document::leading_pages(&bytes, max_pages))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    FetchError::document(DocumentKind::Corrupt, "PDF parser panicked")
                } else {
                    FetchError::Other(format!("extraction task cancelled: {e}"))
                }
            })??;

        if pages.is_empty() {
            Ok(LeadText::Empty)
        } else {
            Ok(LeadText::Text(pages.concat()))
        }
    }

    /// GET the URL and read the body, enforcing the size limit while streaming.
    async fn download(&self, url: Url) -> std::result::Result<Vec<u8>, FetchError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::transport(
                TransportKind::Status,
                format!("{url}: HTTP {status}"),
            ));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_document_bytes {
                return Err(self.too_large(len));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(FetchError::from_reqwest)? {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_document_bytes {
                return Err(self.too_large(body.len() as u64));
            }
        }

        Ok(body)
    }

    fn too_large(&self, len: u64) -> FetchError {
        FetchError::document(
            DocumentKind::TooLarge,
            format!("{len} bytes exceeds limit of {}", self.max_document_bytes),
        )
    }
}

/// Reject arguments that indicate a bug in the caller.
pub(crate) fn validate_request(url: &str, max_pages: usize) -> Result<()> {
    if max_pages == 0 {
        return Err(JaarverslagError::validation("max_pages must be at least 1"));
    }
    if url.trim().is_empty() {
        return Err(JaarverslagError::validation("document url is blank"));
    }
    Ok(())
}
