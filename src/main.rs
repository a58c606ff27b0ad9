//! verse-finder CLI.
//!
//! ```bash
//! # One search, cards on stdout
//! verse-finder Charity
//! verse-finder "day of judgment" --json
//!
//! # Interactive: one search per line on stdin
//! verse-finder
//!
//! # Write the default configuration
//! verse-finder --init-config --config ./config.json
//! ```
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use verse_finder::chapters::ChapterDirectory;
use verse_finder::config::Config;
use verse_finder::pipeline::VersePipeline;
use verse_finder::provider::ContentProvider;
use verse_finder::provider::http::HttpProvider;
use verse_finder::render;
use verse_finder::state::{Notice, SearchSession, SearchState};

/// Search Quranic verses by topic.
#[derive(Parser)]
#[command(name = "verse-finder", version, about)]
struct Cli {
    /// Topic to search for; omit to read terms from stdin
    term: Option<String>,

    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Write the default configuration to --config and exit
    #[arg(long)]
    init_config: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.init_config {
        Config::default().save(&cli.config)?;
        println!("Wrote default configuration to {}", cli.config);
        return Ok(());
    }

    // 1. Load config
    let config = Config::load(&cli.config)?;
    config.validate().context("invalid configuration")?;

    // 2. Provider + pipeline
    let provider: Arc<dyn ContentProvider> =
        Arc::new(HttpProvider::from_config(&config).context("failed to build HTTP client")?);
    let pipeline = Arc::new(VersePipeline::new(provider, ChapterDirectory::new(), &config));
    let session = Arc::new(SearchSession::new(pipeline));

    // 3. Chapter names load in the background
    let loader = session.spawn_chapter_loader();

    match cli.term {
        Some(term) => {
            let (_, state) = tokio::join!(loader, session.submit(&term));
            print_once(&state, cli.json)?;
            if state.error.is_some() {
                std::process::exit(1);
            }
        }
        None => interactive(&session, cli.json).await?,
    }

    Ok(())
}

fn print_once(state: &SearchState, json: bool) -> Result<()> {
    if json {
        let out = match &state.error {
            Some(error) => serde_json::json!({ "term": state.term, "error": error }),
            None => serde_json::json!({ "term": state.term, "results": state.results }),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", render::results(state));
    }
    Ok(())
}

async fn interactive(session: &SearchSession, json: bool) -> Result<()> {
    if !json {
        println!("{}", render::header());
        println!("Topic (e.g., Paradise, Jannah, Charity, Sadaqa), empty line to clear, Ctrl-D to quit:");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let spinner = (!json && !line.trim().is_empty()).then(start_spinner);
        let state = session.submit(&line).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        if let Some(notice) = state.notice.filter(|_| !json) {
            let level = if notice.is_error() { "ERROR" } else { "INFO" };
            eprintln!("[{level}] {}", notice.message());
        }
        print_once(&state, json)?;
    }

    info!("stdin closed, exiting");
    Ok(())
}

fn start_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(Notice::Searching.message());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
