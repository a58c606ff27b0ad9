/// Content provider trait and shared types.
///
/// A provider answers three questions: which verses mention a term in a
/// given edition, what one verse reads like in one edition, and what the
/// chapters are called. Every call is independent and stateless.
pub mod http;
pub mod mock;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to the content provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {endpoint}: {reason}")]
    Parse { endpoint: String, reason: String },

    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

/// A raw search hit, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub chapter: u32,
    pub verse: u32,
    /// Matched verse text in `edition`.
    pub text: String,
    /// Edition the search ran against.
    pub edition: String,
}

impl Match {
    pub fn new(chapter: u32, verse: u32, text: impl Into<String>, edition: impl Into<String>) -> Self {
        Self {
            chapter,
            verse,
            text: text.into(),
            edition: edition.into(),
        }
    }

    /// `chapter:verse`, the key verses are deduplicated on.
    #[must_use]
    pub fn id(&self) -> String {
        verse_id(self.chapter, self.verse)
    }
}

#[must_use]
pub fn verse_id(chapter: u32, verse: u32) -> String {
    format!("{chapter}:{verse}")
}

/// Trait for content provider implementations.
///
/// All implementations must be `Send + Sync` so a single provider can be
/// shared behind `Arc` by the pipeline and the chapter loader.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Verses whose text in `edition` contains `term`. The provider does
    /// the text matching.
    async fn search(&self, term: &str, edition: &str) -> Result<Vec<Match>, ProviderError>;

    /// Text of one verse in one edition.
    async fn fetch_field(
        &self,
        chapter: u32,
        verse: u32,
        edition: &str,
    ) -> Result<String, ProviderError>;

    /// Chapter number → English chapter name.
    async fn list_chapters(&self) -> Result<HashMap<u32, String>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_id() {
        let m = Match::new(2, 255, "Allah - there is no deity except Him", "en.sahih");
        assert_eq!(m.id(), "2:255");
    }

    #[test]
    fn test_status_error_message() {
        let err = ProviderError::Status {
            endpoint: "/ayah/1:1/en.sahih".to_string(),
            status: 404,
            body: "Not Found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "/ayah/1:1/en.sahih returned status 404: Not Found"
        );
    }
}
