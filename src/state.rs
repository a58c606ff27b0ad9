//! Search session state.
//!
//! The presentation layer only ever sees immutable [`SearchState`]
//! snapshots. Every change goes through [`update`], a pure function of the
//! previous snapshot and an [`Action`].
//!
//! Each submitted search gets a generation number. A result whose
//! generation is not the latest submitted one is stale and is discarded,
//! so a slow earlier search can never overwrite a newer one.
use std::borrow::Cow;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::{Outcome, ResultSet};
use crate::pipeline::{SearchError, VersePipeline};

pub const SEARCH_FAILED_MESSAGE: &str = "Failed to perform search. Please try again later.";

/// Transient user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Searching,
    Complete(usize),
    NoCompleteVerses,
    NoMatches,
    SearchFailed,
    ChaptersUnavailable,
}

impl Notice {
    #[must_use]
    pub fn message(&self) -> Cow<'static, str> {
        let text = match self {
            Self::Searching => "Searching for verses and explanations...",
            Self::Complete(1) => "Search complete: 1 verse with explanation!",
            Self::Complete(n) => {
                return Cow::Owned(format!("Search complete: {n} verses with explanations!"));
            }
            Self::NoCompleteVerses => {
                "Initial search found matches, but no complete verses with Arabic text and explanation could be retrieved."
            }
            Self::NoMatches => "No verses found for your search term.",
            Self::SearchFailed => "Failed to perform search.",
            Self::ChaptersUnavailable => {
                "Chapter names could not be loaded; chapters are shown by number."
            }
        };
        Cow::Borrowed(text)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::SearchFailed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchState {
    pub term: String,
    pub results: ResultSet,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<Notice>,
    /// Generation of the latest submitted search.
    pub generation: u64,
}

impl SearchState {
    /// Nothing searched yet, or the term was cleared.
    pub fn is_idle(&self) -> bool {
        self.term.trim().is_empty() && !self.loading
    }
}

#[derive(Debug)]
pub enum Action {
    Submitted {
        term: String,
        generation: u64,
    },
    Resolved {
        generation: u64,
        result: Result<ResultSet, SearchError>,
    },
    ChaptersUnavailable,
}

/// Compute the next snapshot.
#[must_use]
pub fn update(state: &SearchState, action: Action) -> SearchState {
    match action {
        Action::Submitted { generation, .. } if generation <= state.generation => {
            debug!(
                stale = generation,
                latest = state.generation,
                "Ignoring out-of-order submission"
            );
            state.clone()
        }

        Action::Submitted { term, generation } => {
            if term.trim().is_empty() {
                return SearchState {
                    term,
                    generation,
                    ..SearchState::default()
                };
            }
            SearchState {
                term,
                results: ResultSet::empty(),
                loading: true,
                error: None,
                notice: Some(Notice::Searching),
                generation,
            }
        }

        Action::Resolved { generation, .. } if generation != state.generation => {
            debug!(
                stale = generation,
                latest = state.generation,
                "Discarding stale search result"
            );
            state.clone()
        }

        Action::Resolved { result, .. } => match result {
            Ok(results) => {
                let notice = match results.outcome {
                    Outcome::Empty => None,
                    Outcome::NoMatches => Some(Notice::NoMatches),
                    Outcome::SuccessEmpty => Some(Notice::NoCompleteVerses),
                    Outcome::Success(n) => Some(Notice::Complete(n)),
                };
                SearchState {
                    results,
                    loading: false,
                    error: None,
                    notice,
                    ..state.clone()
                }
            }
            Err(_) => SearchState {
                results: ResultSet::empty(),
                loading: false,
                error: Some(SEARCH_FAILED_MESSAGE.to_string()),
                notice: Some(Notice::SearchFailed),
                ..state.clone()
            },
        },

        Action::ChaptersUnavailable => SearchState {
            notice: Some(Notice::ChaptersUnavailable),
            ..state.clone()
        },
    }
}

/// Owns the pipeline and the current snapshot.
pub struct SearchSession {
    pipeline: Arc<VersePipeline>,
    state: watch::Sender<SearchState>,
}

impl SearchSession {
    pub fn new(pipeline: Arc<VersePipeline>) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            pipeline,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn dispatch(&self, action: Action) {
        self.state.send_modify(|s| *s = update(s, action));
    }

    /// Run a search and return the snapshot as it stands once this search
    /// has resolved. If a newer search was submitted meanwhile, the returned
    /// snapshot belongs to that newer search.
    pub async fn submit(&self, term: &str) -> SearchState {
        // Allocate and publish the generation in one step.
        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = s.generation + 1;
            *s = update(
                s,
                Action::Submitted {
                    term: term.to_string(),
                    generation,
                },
            );
        });

        let result = self.pipeline.run_search(term).await;
        self.dispatch(Action::Resolved { generation, result });
        self.snapshot()
    }

    /// Load chapter names in the background. Failure only posts a notice.
    pub fn spawn_chapter_loader(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            if session.pipeline.load_chapters().await.is_err() {
                session.dispatch(Action::ChaptersUnavailable);
            }
        })
    }
}
