//! Verse aggregation pipeline.
//!
//! One search invocation runs, in order:
//!
//! 1. **Guard** — a blank term returns [`Outcome::Empty`] without any request.
//! 2. **Search** — every configured search edition is queried concurrently.
//!    A failed edition is logged and ignored; only when *all* fail does the
//!    caller see [`SearchError::AllEditionsFailed`].
//! 3. **Merge** — hits are concatenated in edition priority order and
//!    deduplicated by `chapter:verse`, first occurrence wins.
//! 4. **Truncate** — at most `max_results` matches go on to enrichment.
//! 5. **Enrich** — Arabic, English and explanation texts are fetched
//!    concurrently per match; all matches are enriched concurrently.
//! 6. **Filter** — a match missing any text is dropped.
//!
//! Every provider call holds a permit from a shared semaphore, so the
//! fan-out of up to `3 × max_results` field fetches never exceeds
//! `max_concurrent_requests` requests in flight.
//!
//! [`Outcome::Empty`]: crate::models::Outcome::Empty
use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::chapters::{self, ChapterDirectory};
use crate::config::{Config, EditionConfig};
use crate::models::{ResultSet, Verse};
use crate::provider::{ContentProvider, Match, ProviderError};

/// Failure of the search step itself.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search failed in every edition: {}", .editions.join(", "))]
    AllEditionsFailed { editions: Vec<String> },
}

pub struct VersePipeline {
    provider: Arc<dyn ContentProvider>,
    chapters: ChapterDirectory,
    editions: EditionConfig,
    max_results: usize,
    gate: Semaphore,
}

impl VersePipeline {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        chapters: ChapterDirectory,
        config: &Config,
    ) -> Self {
        Self {
            provider,
            chapters,
            editions: config.editions.clone(),
            max_results: config.max_results,
            gate: Semaphore::new(config.max_concurrent_requests.max(1)),
        }
    }

    pub fn provider(&self) -> Arc<dyn ContentProvider> {
        Arc::clone(&self.provider)
    }

    pub fn chapters(&self) -> &ChapterDirectory {
        &self.chapters
    }

    /// Fill the chapter directory, holding a gate permit like any other call.
    pub async fn load_chapters(&self) -> Result<usize, ProviderError> {
        let _permit = self.gate.acquire().await.ok();
        chapters::load_directory(self.provider.as_ref(), &self.chapters).await
    }

    /// Search `term` and return fully enriched verses.
    pub async fn run_search(&self, term: &str) -> Result<ResultSet, SearchError> {
        let term = term.trim();
        if term.is_empty() {
            debug!("Blank search term, nothing to do");
            return Ok(ResultSet::empty());
        }

        let groups = self.search_editions(term).await?;
        let candidates = merge_matches(groups, self.max_results);
        if candidates.is_empty() {
            info!(term, "No matches");
            return Ok(ResultSet::no_matches());
        }

        let enriched = join_all(candidates.iter().map(|m| self.enrich(m))).await;
        let verses: Vec<Verse> = enriched.into_iter().flatten().collect();

        info!(
            term,
            candidates = candidates.len(),
            complete = verses.len(),
            "Search finished"
        );
        Ok(ResultSet::from_verses(verses))
    }

    /// Query every search edition concurrently; results in priority order.
    async fn search_editions(&self, term: &str) -> Result<Vec<Vec<Match>>, SearchError> {
        let editions = self.editions.search_editions();
        let results = join_all(editions.iter().map(|&edition| async move {
            let _permit = self.gate.acquire().await.ok();
            self.provider.search(term, edition).await
        }))
        .await;

        let mut groups = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for (edition, result) in editions.iter().zip(results) {
            match result {
                Ok(matches) => {
                    debug!(edition, hits = matches.len(), "Edition search done");
                    groups.push(matches);
                }
                Err(e) => {
                    debug!(edition, "Edition search failed: {e}");
                    failed.push((*edition).to_string());
                }
            }
        }

        if groups.is_empty() {
            return Err(SearchError::AllEditionsFailed { editions: failed });
        }
        Ok(groups)
    }

    /// Resolve all three texts for one match; `None` if any is missing.
    async fn enrich(&self, m: &Match) -> Option<Verse> {
        let (arabic, english, explanation) = tokio::join!(
            self.field(m, &self.editions.arabic),
            self.field(m, &self.editions.translation),
            self.field(m, &self.editions.explanation),
        );

        match (arabic, english, explanation) {
            (Some(arabic), Some(english), Some(explanation)) => Some(Verse {
                id: m.id(),
                arabic,
                english,
                explanation,
                chapter: m.chapter,
                verse_number: m.verse,
                surah_name: self.chapters.label(m.chapter),
            }),
            _ => {
                debug!(id = %m.id(), "Dropping incomplete verse");
                None
            }
        }
    }

    async fn field(&self, m: &Match, edition: &str) -> Option<String> {
        // The hit already carries its own edition's text.
        if m.edition == edition && !m.text.trim().is_empty() {
            return Some(m.text.clone());
        }

        let _permit = self.gate.acquire().await.ok()?;
        match self.provider.fetch_field(m.chapter, m.verse, edition).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                warn!(chapter = m.chapter, verse = m.verse, edition, "Empty text");
                None
            }
            Err(e) => {
                debug!(chapter = m.chapter, verse = m.verse, edition, "Missing text: {e}");
                None
            }
        }
    }
}

/// Concatenate edition groups, keep the first hit per `chapter:verse`, and
/// cap the result at `cap` entries.
#[must_use]
pub fn merge_matches(groups: impl IntoIterator<Item = Vec<Match>>, cap: usize) -> Vec<Match> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for m in groups.into_iter().flatten() {
        if merged.len() == cap {
            break;
        }
        if seen.insert((m.chapter, m.verse)) {
            merged.push(m);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Outcome;
    use crate::provider::mock::MockProvider;
    use std::time::Duration;

    fn m(chapter: u32, verse: u32, edition: &str) -> Match {
        Match::new(chapter, verse, format!("text {chapter}:{verse}"), edition)
    }

    fn build(mock: MockProvider, config: &Config) -> (Arc<MockProvider>, VersePipeline) {
        let mock = Arc::new(mock);
        let provider: Arc<dyn ContentProvider> = mock.clone();
        let pipeline = VersePipeline::new(provider, ChapterDirectory::new(), config);
        (mock, pipeline)
    }

    #[test]
    fn test_merge_dedupes_primary_first() {
        let primary = vec![m(2, 263, "en.sahih"), m(2, 264, "en.sahih")];
        let secondary = vec![m(2, 264, "ar.quran-simple"), m(9, 60, "ar.quran-simple")];
        let merged = merge_matches([primary, secondary], 10);

        let ids: Vec<String> = merged.iter().map(Match::id).collect();
        assert_eq!(ids, vec!["2:263", "2:264", "9:60"]);
        assert_eq!(merged[1].edition, "en.sahih");
    }

    #[test]
    fn test_merge_truncates_after_dedupe() {
        let group: Vec<Match> = (1..=5).flat_map(|v| [m(1, v, "a"), m(1, v, "a")]).collect();
        let merged = merge_matches([group], 3);
        let ids: Vec<String> = merged.iter().map(Match::id).collect();
        assert_eq!(ids, vec!["1:1", "1:2", "1:3"]);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_matches(Vec::<Vec<Match>>::new(), 10).is_empty());
    }

    #[tokio::test]
    async fn test_blank_term_makes_no_calls() {
        let config = Config::default();
        let (mock, pipeline) = build(MockProvider::new(), &config);
        for term in ["", "   ", "\t\n"] {
            let rs = pipeline.run_search(term).await.unwrap();
            assert_eq!(rs.outcome, Outcome::Empty);
            assert!(rs.is_empty());
        }
        assert_eq!(mock.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_term_is_trimmed() {
        let config = Config::default();
        let e = &config.editions;
        let mock = MockProvider::new()
            .with_matches("mercy", &e.translation, &[(1, 3, "The Most Merciful")])
            .with_complete_verse(1, 3, e);
        let (_, pipeline) = build(mock, &config);

        let rs = pipeline.run_search("  mercy ").await.unwrap();
        assert_eq!(rs.outcome, Outcome::Success(1));
    }

    #[tokio::test]
    async fn test_english_reused_from_primary_match() {
        let config = Config::default();
        let e = &config.editions;
        let mock = MockProvider::new()
            .with_matches("light", &e.translation, &[(24, 35, "Allah is the Light")])
            .with_field(24, 35, &e.arabic, "اللَّهُ نُورُ")
            .with_field(24, 35, &e.explanation, "The parable of His light");
        let (mock, pipeline) = build(mock, &config);

        let rs = pipeline.run_search("light").await.unwrap();
        assert_eq!(rs.verses[0].english, "Allah is the Light");
        let editions: Vec<String> = mock.field_calls().into_iter().map(|(_, _, ed)| ed).collect();
        assert!(!editions.contains(&e.translation));
        assert_eq!(editions.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_field_text_drops_verse() {
        let config = Config::default();
        let e = &config.editions;
        let mock = MockProvider::new()
            .with_matches("t", &e.translation, &[(1, 1, "x"), (1, 2, "y")])
            .with_complete_verse(1, 1, e)
            .with_complete_verse(1, 2, e)
            .with_field(1, 2, &e.explanation, "   ");
        let (_, pipeline) = build(mock, &config);

        let rs = pipeline.run_search("t").await.unwrap();
        assert_eq!(rs.outcome, Outcome::Success(1));
        assert_eq!(rs.verses[0].id, "1:1");
    }

    #[tokio::test]
    async fn test_all_incomplete_is_success_empty() {
        let config = Config::default();
        let e = &config.editions;
        let mock = MockProvider::new().with_matches("t", &e.translation, &[(1, 1, "x")]);
        let (_, pipeline) = build(mock, &config);

        let rs = pipeline.run_search("t").await.unwrap();
        assert_eq!(rs.outcome, Outcome::SuccessEmpty);
        assert!(rs.is_empty());
    }

    #[tokio::test]
    async fn test_single_edition_failure_is_search_error() {
        let mut config = Config::default();
        config.editions.secondary_search = None;
        let mock =
            MockProvider::new().with_search_failure("t", &config.editions.translation, 503);
        let (_, pipeline) = build(mock, &config);

        let err = pipeline.run_search("t").await.unwrap_err();
        let SearchError::AllEditionsFailed { editions } = err;
        assert_eq!(editions, vec!["en.sahih"]);
    }

    #[tokio::test]
    async fn test_surah_name_from_directory() {
        let config = Config::default();
        let e = &config.editions;
        let mock = Arc::new(
            MockProvider::new()
                .with_matches("t", &e.translation, &[(2, 1, "x"), (3, 1, "y")])
                .with_complete_verse(2, 1, e)
                .with_complete_verse(3, 1, e),
        );
        let chapters = ChapterDirectory::new();
        chapters.install([(2, "Al-Baqara".to_string())].into());
        let pipeline = VersePipeline::new(mock, chapters, &config);

        let rs = pipeline.run_search("t").await.unwrap();
        assert_eq!(rs.verses[0].surah_name, "Al-Baqara");
        assert_eq!(rs.verses[1].surah_name, "Chapter 3");
    }

    #[tokio::test]
    async fn test_chapter_load_waits_for_gate() {
        let mut config = Config::default();
        config.max_concurrent_requests = 1;
        let mock = MockProvider::new().with_chapters(&[(1, "Al-Faatiha")]);
        let (_, pipeline) = build(mock, &config);

        let held = pipeline.gate.acquire().await.unwrap();
        let blocked =
            tokio::time::timeout(Duration::from_millis(30), pipeline.load_chapters()).await;
        assert!(blocked.is_err(), "loader must wait for a free permit");
        assert!(!pipeline.chapters().is_loaded());

        drop(held);
        assert_eq!(pipeline.load_chapters().await.unwrap(), 1);
        assert_eq!(pipeline.chapters().label(1), "Al-Faatiha");
    }

    #[tokio::test]
    async fn test_concurrency_gate_bounds_in_flight_calls() {
        let mut config = Config::default();
        config.max_concurrent_requests = 2;
        let e = config.editions.clone();

        let hits: Vec<(u32, u32, &str)> = (1..=8).map(|v| (7, v, "hit")).collect();
        let mut mock = MockProvider::new()
            .with_matches("t", &e.translation, &hits)
            .with_field_delay(Duration::from_millis(5));
        for v in 1..=8 {
            mock = mock.with_complete_verse(7, v, &e);
        }
        let (mock, pipeline) = build(mock, &config);

        let rs = pipeline.run_search("t").await.unwrap();
        assert_eq!(rs.outcome, Outcome::Success(8));
        assert!(mock.peak_in_flight() <= 2, "peak was {}", mock.peak_in_flight());
        assert_eq!(mock.field_calls().len(), 16);
    }
}
