//! Resilient annual-report downloads and lead-text extraction.
//!
//! This crate provides:
//! - [`DocumentFetcher`]: fetch one URL, keep the text of its first pages
//! - [`LeadText`]: three-state outcome (text / empty document / failed)
//! - [`FetchError`]: transport and document-format failure taxonomy
//! - [`fetch_all`]: bounded worker pool preserving input order

pub mod document;
pub mod error;
pub mod fetcher;
pub mod pool;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use document::looks_like_pdf;
pub use error::{DocumentKind, FetchError, TransportKind};
pub use fetcher::{DocumentFetcher, LeadText};
pub use pool::{BatchOptions, BatchProgress, BatchSummary, fetch_all};
