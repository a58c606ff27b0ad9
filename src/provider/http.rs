/// HTTP content provider backed by the alquran.cloud REST API.
///
/// Endpoints used:
/// - `GET /search/{term}/{scope}/{edition}` → `{ data: { matches: [...] } }`
/// - `GET /ayah/{chapter}:{verse}/{edition}` → `{ data: { text } }`
/// - `GET /surah` → `{ data: [ { number, englishName } ] }`
///
/// No retries and no caching: each call is one GET.
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ContentProvider, Match, ProviderError};
use crate::config::Config;

const USER_AGENT: &str = concat!("verse-finder/", env!("CARGO_PKG_VERSION"));
const BODY_PREVIEW_CHARS: usize = 200;

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct SearchData {
    #[serde(default)]
    matches: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawMatch {
    surah: Option<RawSurah>,
    #[serde(rename = "numberInSurah")]
    number_in_surah: Option<u32>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct RawSurah {
    number: Option<u32>,
}

#[derive(Deserialize)]
struct AyahData {
    text: String,
}

#[derive(Deserialize)]
struct ChapterEntry {
    number: u32,
    #[serde(rename = "englishName")]
    english_name: String,
}

// ── Provider ─────────────────────────────────────────────────────────

pub struct HttpProvider {
    client: reqwest::Client,
    base_url: Url,
    search_scope: String,
}

impl HttpProvider {
    pub fn new(
        base_url: &str,
        search_scope: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ProviderError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidUrl(base_url.to_string()));
        }

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| ProviderError::Transport {
            endpoint: base_url.to_string(),
            source,
        })?;

        Ok(Self {
            client,
            base_url,
            search_scope: search_scope.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        Self::new(
            &config.base_url,
            &config.editions.search_scope,
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_body(&self, url: Url) -> Result<String, ProviderError> {
        let endpoint = url.path().to_string();
        debug!(%endpoint, "GET");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|source| ProviderError::Transport {
            endpoint: endpoint.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint,
                status: status.as_u16(),
                body: preview(&body),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ContentProvider for HttpProvider {
    async fn search(&self, term: &str, edition: &str) -> Result<Vec<Match>, ProviderError> {
        let url = self.endpoint(&["search", term, &self.search_scope, edition])?;
        let endpoint = url.path().to_string();

        search_outcome(self.get_body(url).await, edition, &endpoint).inspect_err(log_failure)
    }

    async fn fetch_field(
        &self,
        chapter: u32,
        verse: u32,
        edition: &str,
    ) -> Result<String, ProviderError> {
        let reference = format!("{chapter}:{verse}");
        let url = self.endpoint(&["ayah", &reference, edition])?;
        let endpoint = url.path().to_string();

        self.get_body(url)
            .await
            .and_then(|body| parse_ayah_body(&body, &endpoint))
            .inspect_err(log_failure)
    }

    async fn list_chapters(&self) -> Result<HashMap<u32, String>, ProviderError> {
        let url = self.endpoint(&["surah"])?;
        let endpoint = url.path().to_string();

        self.get_body(url)
            .await
            .and_then(|body| parse_chapters_body(&body, &endpoint))
            .inspect_err(log_failure)
    }
}

// ── Parsing ──────────────────────────────────────────────────────────

fn parse_error(endpoint: &str, e: serde_json::Error) -> ProviderError {
    ProviderError::Parse {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    }
}

/// Parse a search response. Hits without chapter, verse or text are
/// skipped with a warning instead of failing the whole response.
pub(crate) fn parse_search_body(
    body: &str,
    edition: &str,
    endpoint: &str,
) -> Result<Vec<Match>, ProviderError> {
    let envelope: Envelope<SearchData> =
        serde_json::from_str(body).map_err(|e| parse_error(endpoint, e))?;

    let mut matches = Vec::with_capacity(envelope.data.matches.len());
    for value in envelope.data.matches {
        let raw: RawMatch = match serde_json::from_value(value.clone()) {
            Ok(r) => r,
            Err(e) => {
                warn!(%endpoint, "Skipping malformed match {value}: {e}");
                continue;
            }
        };
        let chapter = raw.surah.and_then(|s| s.number);
        match (chapter, raw.number_in_surah, raw.text) {
            (Some(chapter), Some(verse), Some(text)) if !text.is_empty() => {
                matches.push(Match::new(chapter, verse, text, edition));
            }
            _ => warn!(%endpoint, "Skipping malformed match {value}"),
        }
    }
    Ok(matches)
}

/// Map a raw search response to matches. The API answers "no hits" with a
/// 404; any other error status fails the edition.
pub(crate) fn search_outcome(
    response: Result<String, ProviderError>,
    edition: &str,
    endpoint: &str,
) -> Result<Vec<Match>, ProviderError> {
    match response {
        Ok(body) => parse_search_body(&body, edition, endpoint),
        Err(ProviderError::Status { status: 404, .. }) => {
            debug!(%endpoint, "no matches");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn parse_ayah_body(body: &str, endpoint: &str) -> Result<String, ProviderError> {
    let envelope: Envelope<AyahData> =
        serde_json::from_str(body).map_err(|e| parse_error(endpoint, e))?;
    Ok(envelope.data.text)
}

pub(crate) fn parse_chapters_body(
    body: &str,
    endpoint: &str,
) -> Result<HashMap<u32, String>, ProviderError> {
    let envelope: Envelope<Vec<ChapterEntry>> =
        serde_json::from_str(body).map_err(|e| parse_error(endpoint, e))?;
    Ok(envelope
        .data
        .into_iter()
        .map(|c| (c.number, c.english_name))
        .collect())
}

fn log_failure(err: &ProviderError) {
    match err {
        ProviderError::Status {
            endpoint,
            status,
            body,
        } => warn!(%endpoint, status, %body, "provider returned an error status"),
        ProviderError::Transport { endpoint, source } => {
            warn!(%endpoint, "provider request failed: {source}")
        }
        ProviderError::Parse { endpoint, reason } => {
            warn!(%endpoint, "unparseable provider response: {reason}")
        }
        ProviderError::InvalidUrl(url) => warn!("invalid provider url: {url}"),
    }
}

fn preview(body: &str) -> String {
    match body.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
