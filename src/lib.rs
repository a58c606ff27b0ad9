//! # verse-finder — Quranic verse search
//!
//! Finds verses by topic keyword through the alquran.cloud REST API and
//! presents each match with its Arabic text, an English translation, and a
//! commentary.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading and validation (editions, base URL, limits)
//! - **[`provider`]** — Content provider trait, HTTP client, and an in-memory mock
//! - **[`chapters`]** — Write-once chapter name directory and its background loader
//! - **[`pipeline`]** — Search → merge → truncate → enrich → filter
//! - **[`state`]** — Immutable session snapshots with stale-result protection
//! - **[`models`]** — `Verse`, `Outcome`, `ResultSet`
//! - **[`render`]** — Terminal rendering of header, cards and hints

pub mod chapters;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod render;
pub mod state;
