/// Mock content provider for testing purposes.
///
/// Serves canned search hits and verse texts from memory, counts every call,
/// and records the peak number of calls in flight so concurrency limits can
/// be asserted without a network.
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{ContentProvider, Match, ProviderError};
use crate::config::EditionConfig;

#[derive(Clone)]
enum SearchReply {
    Hits(Vec<(u32, u32, String)>),
    Fail(u16),
}

/// A mock provider answering from in-memory tables.
///
/// Unknown searches answer with zero hits; unknown fields and a missing
/// chapter table answer with a 404 status error.
#[derive(Default)]
pub struct MockProvider {
    searches: HashMap<(String, String), SearchReply>,
    fields: HashMap<(u32, u32, String), String>,
    chapters: Option<HashMap<u32, String>>,
    search_delays: HashMap<String, Duration>,
    field_delay: Option<Duration>,

    search_calls: AtomicUsize,
    field_calls: Mutex<Vec<(u32, u32, String)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `search(term, edition)` with these `(chapter, verse, text)` hits.
    #[must_use]
    pub fn with_matches(mut self, term: &str, edition: &str, hits: &[(u32, u32, &str)]) -> Self {
        let hits = hits
            .iter()
            .map(|&(c, v, t)| (c, v, t.to_string()))
            .collect();
        self.searches
            .insert((term.to_string(), edition.to_string()), SearchReply::Hits(hits));
        self
    }

    /// Make `search(term, edition)` fail with an HTTP status error.
    #[must_use]
    pub fn with_search_failure(mut self, term: &str, edition: &str, status: u16) -> Self {
        self.searches
            .insert((term.to_string(), edition.to_string()), SearchReply::Fail(status));
        self
    }

    #[must_use]
    pub fn with_field(mut self, chapter: u32, verse: u32, edition: &str, text: &str) -> Self {
        self.fields
            .insert((chapter, verse, edition.to_string()), text.to_string());
        self
    }

    /// Register Arabic, English and explanation texts for one verse.
    #[must_use]
    pub fn with_complete_verse(self, chapter: u32, verse: u32, editions: &EditionConfig) -> Self {
        self.with_field(chapter, verse, &editions.arabic, &format!("arabic {chapter}:{verse}"))
            .with_field(
                chapter,
                verse,
                &editions.translation,
                &format!("english {chapter}:{verse}"),
            )
            .with_field(
                chapter,
                verse,
                &editions.explanation,
                &format!("explanation {chapter}:{verse}"),
            )
    }

    #[must_use]
    pub fn with_chapters(mut self, chapters: &[(u32, &str)]) -> Self {
        self.chapters = Some(
            chapters
                .iter()
                .map(|&(n, name)| (n, name.to_string()))
                .collect(),
        );
        self
    }

    /// Delay every search for `term` before answering.
    #[must_use]
    pub fn with_search_delay(mut self, term: &str, delay: Duration) -> Self {
        self.search_delays.insert(term.to_string(), delay);
        self
    }

    /// Delay every field fetch before answering.
    #[must_use]
    pub fn with_field_delay(mut self, delay: Duration) -> Self {
        self.field_delay = Some(delay);
        self
    }

    /// Total calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.search_calls() + self.field_calls().len()
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Every field fetch as `(chapter, verse, edition)`, in call order.
    pub fn field_calls(&self) -> Vec<(u32, u32, String)> {
        self.field_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Distinct verse ids that had at least one field fetched, in first-call order.
    pub fn enriched_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for (c, v, _) in self.field_calls() {
            let id = super::verse_id(c, v);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// Highest number of calls that were in flight at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn track<T>(&self, delay: Option<Duration>, answer: impl FnOnce() -> T) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        match delay {
            Some(d) => tokio::time::sleep(d).await,
            None => tokio::task::yield_now().await,
        }
        let out = answer();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        out
    }
}

fn not_found(endpoint: String) -> ProviderError {
    ProviderError::Status {
        endpoint,
        status: 404,
        body: "Not Found".to_string(),
    }
}

#[async_trait]
impl ContentProvider for MockProvider {
    async fn search(&self, term: &str, edition: &str) -> Result<Vec<Match>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.search_delays.get(term).copied();
        let reply = self
            .searches
            .get(&(term.to_string(), edition.to_string()))
            .cloned();

        self.track(delay, || match reply {
            None => Ok(Vec::new()),
            Some(SearchReply::Hits(hits)) => Ok(hits
                .into_iter()
                .map(|(c, v, t)| Match::new(c, v, t, edition))
                .collect()),
            Some(SearchReply::Fail(status)) => Err(ProviderError::Status {
                endpoint: format!("/search/{term}/all/{edition}"),
                status,
                body: "mock failure".to_string(),
            }),
        })
        .await
    }

    async fn fetch_field(
        &self,
        chapter: u32,
        verse: u32,
        edition: &str,
    ) -> Result<String, ProviderError> {
        if let Ok(mut calls) = self.field_calls.lock() {
            calls.push((chapter, verse, edition.to_string()));
        }
        let text = self.fields.get(&(chapter, verse, edition.to_string())).cloned();

        self.track(self.field_delay, || {
            text.ok_or_else(|| not_found(format!("/ayah/{chapter}:{verse}/{edition}")))
        })
        .await
    }

    async fn list_chapters(&self) -> Result<HashMap<u32, String>, ProviderError> {
        let chapters = self.chapters.clone();
        self.track(None, || chapters.ok_or_else(|| not_found("/surah".to_string())))
            .await
    }
}
