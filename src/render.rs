//! Plain-text rendering of search state for the terminal.
use crate::models::{Outcome, Verse};
use crate::state::SearchState;

pub const TITLE: &str = "Quran Explorer";
pub const TAGLINE: &str = "Search and explore verses of the Holy Quran by topic. Discover the wisdom and guidance with Arabic text, English translations, and detailed explanations.";

const IDLE_HINT: &str = "Enter a topic to search for Quranic verses.";
const EMPTY_HINT: &str = "No verses found for your search term. Try 'Paradise' or 'Charity'!";
const LOADING_HINT: &str = "Loading verses and explanations...";
const RULE_WIDTH: usize = 60;

#[must_use]
pub fn header() -> String {
    let rule = "═".repeat(RULE_WIDTH);
    format!("{rule}\n{TITLE:^width$}\n{rule}\n{TAGLINE}\n", width = RULE_WIDTH)
}

/// One verse as a card.
#[must_use]
pub fn card(verse: &Verse) -> String {
    format!(
        "{rule}\n{name}\nSurah {chapter}, Verse {number}\n\n{english}\n\n{arabic}\n\nExplanation:\n{explanation}\n",
        rule = "─".repeat(RULE_WIDTH),
        name = verse.surah_name,
        chapter = verse.chapter,
        number = verse.verse_number,
        english = verse.english,
        arabic = verse.arabic,
        explanation = verse.explanation,
    )
}

/// The result area for a snapshot: error, loading hint, cards or hints.
#[must_use]
pub fn results(state: &SearchState) -> String {
    let mut out = state
        .error
        .as_ref()
        .map(|error| format!("{error}\n"))
        .unwrap_or_default();

    if state.loading && state.results.is_empty() {
        out.push_str(LOADING_HINT);
        out.push('\n');
        return out;
    }

    if !state.results.is_empty() {
        for verse in &state.results.verses {
            out.push_str(&card(verse));
        }
        return out;
    }

    if state.error.is_none() && !state.loading {
        let hint = match state.results.outcome {
            Outcome::Empty if state.term.trim().is_empty() => IDLE_HINT,
            _ => EMPTY_HINT,
        };
        out.push_str(hint);
        out.push('\n');
    }
    out
}
