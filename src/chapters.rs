//! Chapter directory: chapter number → English chapter name.
//!
//! Filled at most once, in the background, independent of any search.
//! Until (or unless) it is filled, names fall back to `Chapter N`.
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::provider::{ContentProvider, ProviderError};

/// Shared, write-once chapter name table. Cloning shares the table.
#[derive(Debug, Clone, Default)]
pub struct ChapterDirectory {
    names: Arc<OnceLock<HashMap<u32, String>>>,
}

impl ChapterDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the table. Returns `false` if it was already installed.
    pub fn install(&self, names: HashMap<u32, String>) -> bool {
        self.names.set(names).is_ok()
    }

    pub fn is_loaded(&self) -> bool {
        self.names.get().is_some()
    }

    pub fn len(&self) -> usize {
        self.names.get().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name(&self, chapter: u32) -> Option<&str> {
        self.names.get()?.get(&chapter).map(String::as_str)
    }

    /// Chapter name, or `Chapter N` when unknown.
    #[must_use]
    pub fn label(&self, chapter: u32) -> String {
        self.name(chapter)
            .map_or_else(|| format!("Chapter {chapter}"), str::to_string)
    }
}

/// Fetch the chapter list and install it into `directory`.
pub async fn load_directory(
    provider: &dyn ContentProvider,
    directory: &ChapterDirectory,
) -> Result<usize, ProviderError> {
    let names = provider.list_chapters().await?;
    let count = names.len();
    if directory.install(names) {
        info!("Loaded {count} chapter names");
    } else {
        warn!("Chapter directory already loaded, ignoring second load");
    }
    Ok(directory.len())
}
