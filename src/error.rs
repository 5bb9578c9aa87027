//! Error taxonomy of the mirroring pipeline
//!
//! Selector validation errors are fatal and abort the run before any network
//! activity. Index-level errors (remote status, text decoding, malformed
//! entries) abort one selector's contribution but let sibling selectors
//! proceed. Transfer-level errors are attempt-scoped: they are recorded in the
//! affected resource's outcome and a later run simply retries from scratch.

use thiserror::Error;

/// Classified errors from the discovery-and-fetch pipeline
#[derive(Debug, Error)]
pub enum MirrorError {
    /// A `--language` token is not a supported language code
    #[error("invalid language {0:?}")]
    InvalidLanguage(Box<str>),

    /// A `--ngram` token is not a supported n-gram order
    #[error("invalid ngram order {0:?}")]
    InvalidNgram(Box<str>),

    /// The remote answered with a non-success HTTP status
    #[error("GET {url} failed with HTTP status {status}")]
    Remote {
        url: Box<str>,
        status: reqwest::StatusCode,
    },

    /// An index page's body is not the strict Unicode text we expect
    ///
    /// A binary or mis-encoded response must never be silently accepted as a
    /// listing, as every URL extracted from it would be suspect.
    #[error("index page {url} is not valid UTF-8 text")]
    Decode { url: Box<str> },

    /// An index list item whose link carries no target
    ///
    /// This indicates that the index format has changed, so the extracted URL
    /// set would be silently incomplete. The whole parse is abandoned.
    #[error("index entry {text:?} has no link target")]
    MalformedEntry { text: Box<str> },

    /// Network failure or corrupt/truncated payload during a resource fetch
    #[error("transfer of {url} failed: {reason}")]
    Transfer { url: Box<str>, reason: Box<str> },

    /// The run was cancelled while this resource was in flight
    #[error("transfer of {url} was cancelled")]
    Cancelled { url: Box<str> },
}
//
impl MirrorError {
    /// Classify a network-level failure during a resource transfer
    pub fn transfer(url: &str, source: impl std::fmt::Display) -> Self {
        Self::Transfer {
            url: url.into(),
            reason: source.to_string().into(),
        }
    }
}
