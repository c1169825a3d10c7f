//! Failure taxonomy for document fetches.
//!
//! Every failure a single fetch can run into lands in one of three buckets:
//! transport, document format, or the `Other` fallback. None of them ever
//! escapes as an `Err`; they travel inside [`crate::LeadText::Failed`].

use std::error::Error as StdError;
use std::fmt;

use jaarverslag_shared::FetchStatus;

/// Which part of the HTTP exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The URL could not be parsed or is not http(s).
    InvalidUrl,
    /// DNS, connection refused/reset, TLS handshake.
    Connect,
    /// The per-request timeout elapsed.
    Timeout,
    /// Redirect limit exceeded or redirect loop.
    Redirect,
    /// Server answered with a non-success status.
    Status,
    /// Body could not be read (truncated, malformed chunked encoding, bad compression).
    Body,
    /// Any other request failure reported by the HTTP client.
    Request,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidUrl => "invalid url",
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Redirect => "redirect",
            Self::Status => "status",
            Self::Body => "body",
            Self::Request => "request",
        })
    }
}

/// Why downloaded bytes could not be read as a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Zero-byte response body.
    Empty,
    /// Body exceeded the configured size limit.
    TooLarge,
    /// Encrypted and not decryptable without a password.
    Encrypted,
    /// Not a PDF, or a damaged one.
    Corrupt,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty",
            Self::TooLarge => "too large",
            Self::Encrypted => "encrypted",
            Self::Corrupt => "corrupt",
        })
    }
}

/// A failed fetch, classified.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The document never arrived intact.
    #[error("transport error ({kind}): {message}")]
    Transport { kind: TransportKind, message: String },

    /// The document arrived but could not be parsed.
    #[error("document error ({kind}): {message}")]
    Document { kind: DocumentKind, message: String },

    /// Anything the other buckets do not recognise.
    #[error("fetch failed: {0}")]
    Other(String),
}

impl FetchError {
    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    pub fn document(kind: DocumentKind, message: impl Into<String>) -> Self {
        Self::Document {
            kind,
            message: message.into(),
        }
    }

    /// Classify an HTTP client error.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_redirect() {
            TransportKind::Redirect
        } else if err.is_connect() {
            TransportKind::Connect
        } else if err.is_status() {
            TransportKind::Status
        } else if err.is_body() || err.is_decode() {
            TransportKind::Body
        } else if err.is_builder() {
            TransportKind::InvalidUrl
        } else {
            TransportKind::Request
        };
        Self::transport(kind, error_chain(&err))
    }

    /// Classify a PDF parser error by its message.
    pub(crate) fn from_pdf_message(message: String) -> Self {
        let lower = message.to_lowercase();
        let kind = if lower.contains("encrypt") || lower.contains("decrypt") || lower.contains("password") {
            DocumentKind::Encrypted
        } else {
            DocumentKind::Corrupt
        };
        Self::document(kind, message)
    }

    /// The table status this failure maps to.
    pub fn status(&self) -> FetchStatus {
        match self {
            Self::Transport { .. } => FetchStatus::Transport,
            Self::Document { .. } => FetchStatus::Document,
            Self::Other(_) => FetchStatus::Other,
        }
    }
}

/// Render an error with its `source()` chain, `outer: inner: innermost`.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_bucket_and_kind() {
        let err = FetchError::transport(TransportKind::Timeout, "after 30s");
        assert_eq!(err.to_string(), "transport error (timeout): after 30s");

        let err = FetchError::document(DocumentKind::TooLarge, "200 MiB");
        assert_eq!(err.to_string(), "document error (too large): 200 MiB");
    }

    #[test]
    fn pdf_messages_are_classified() {
        let err = FetchError::from_pdf_message("failed to decrypt document".into());
        assert!(matches!(
            err,
            FetchError::Document {
                kind: DocumentKind::Encrypted,
                ..
            }
        ));

        let err = FetchError::from_pdf_message("invalid file header".into());
        assert!(matches!(
            err,
            FetchError::Document {
                kind: DocumentKind::Corrupt,
                ..
            }
        ));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            FetchError::transport(TransportKind::Connect, "refused").status(),
            FetchStatus::Transport
        );
        assert_eq!(
            FetchError::document(DocumentKind::Empty, "0 bytes").status(),
            FetchStatus::Document
        );
        assert_eq!(FetchError::Other("join".into()).status(), FetchStatus::Other);
    }

    #[test]
    fn error_chain_appends_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let outer = std::io::Error::other(inner);
        let rendered = error_chain(&outer);
        assert!(rendered.contains("reset by peer"));
    }
}
