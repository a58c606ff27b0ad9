use serde::Serialize;

/// A fully enriched, displayable verse.
///
/// Only ever built once Arabic, English and explanation texts are all
/// present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    /// `chapter:verse_number`
    pub id: String,
    pub arabic: String,
    pub english: String,
    pub explanation: String,
    pub chapter: u32,
    pub verse_number: u32,
    pub surah_name: String,
}

/// How a search invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum Outcome {
    /// Blank term; nothing was requested.
    Empty,
    /// The provider found nothing in any edition.
    NoMatches,
    /// Matches existed but none could be fully enriched.
    SuccessEmpty,
    Success(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    pub verses: Vec<Verse>,
    pub outcome: Outcome,
}

impl ResultSet {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            verses: Vec::new(),
            outcome: Outcome::Empty,
        }
    }

    #[must_use]
    pub fn no_matches() -> Self {
        Self {
            verses: Vec::new(),
            outcome: Outcome::NoMatches,
        }
    }

    /// Wrap enriched verses, picking `Success` or `SuccessEmpty`.
    #[must_use]
    pub fn from_verses(verses: Vec<Verse>) -> Self {
        let outcome = if verses.is_empty() {
            Outcome::SuccessEmpty
        } else {
            Outcome::Success(verses.len())
        };
        Self { verses, outcome }
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::empty()
    }
}
