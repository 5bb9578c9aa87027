//! Mirror of the Google Books Ngram export files, whose general documentation
//! you can find at
//! <http://storage.googleapis.com/books/ngrams/books/datasetsv3.html>.
//!
//! Data file URLs are discovered from the per-(language, n-gram order) index
//! pages, then each file is downloaded, validated and atomically installed
//! into the destination directory, exactly once. Re-running the program picks
//! up where the previous run left off.

mod config;
mod error;
mod fetch;
mod index;
mod languages;
mod mirror;
mod progress;
#[cfg(test)]
mod testing;

use crate::{config::Config, fetch::FetchOutcome, progress::ProgressReport};
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use std::{num::NonZeroUsize, path::PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;

/// Download the Google Books Ngram export files to local storage
///
/// Files that are already present in the destination directory are skipped,
/// so an interrupted run can simply be restarted.
#[derive(Parser, Debug)]
#[command(version, author)]
struct Args {
    /// Comma-separated short names of the dataset languages to mirror, e.g.
    /// "eng,eng-fiction"
    ///
    /// Defaults to every supported language.
    #[arg(short, long, default_value = None)]
    language: Option<Box<str>>,

    /// Comma-separated n-gram orders to mirror, e.g. "1,2"
    ///
    /// Defaults to every published order (1 through 5).
    #[arg(short, long, default_value = None)]
    ngram: Option<Box<str>>,

    /// Directory where the data files are installed
    #[arg(short, long, default_value = ".")]
    destination: PathBuf,

    /// Maximal number of concurrent data file transfers
    #[arg(short, long, default_value = "4")]
    concurrency: NonZeroUsize,

    /// Base URL of the dataset host
    ///
    /// Mostly useful for pointing the program at a local mirror.
    #[arg(long, default_value = languages::DEFAULT_BASE_URL)]
    base_url: Box<str>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up logging
    setup_logging().map_err(|e| anyhow::format_err!("{e}"))?;

    // Decode CLI arguments and validate selectors before any network activity
    let args = Args::parse();
    let selectors = languages::selectors(args.language.as_deref(), args.ngram.as_deref())
        .context("validating the requested languages and ngram orders")?;
    let config = Config::new(args, selectors);
    tokio::fs::create_dir_all(&config.destination)
        .await
        .context("setting up the destination directory")?;

    // A Ctrl-C aborts in-flight transfers without leaving partial files under
    // their final names
    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupted, aborting in-flight transfers");
            ctrl_c.cancel();
        }
    });

    // Mirror everything the selectors point at
    let report = ProgressReport::new();
    let client = reqwest::Client::new();
    let outcomes = mirror::run(config, client, &report, token).await?;

    // Report the per-file outcomes
    {
        let stdout = tokio::io::stdout();
        let mut stdout = BufWriter::new(stdout);
        let mut installed = 0usize;
        let mut present = 0usize;
        let mut failed = 0usize;
        for (url, outcome) in &outcomes {
            match outcome {
                FetchOutcome::Installed => installed += 1,
                FetchOutcome::AlreadyPresent => present += 1,
                FetchOutcome::Failed(error) => {
                    failed += 1;
                    stdout
                        .write_all(format!("failed: {url}: {error}\n").as_bytes())
                        .await?;
                }
            }
        }
        stdout
            .write_all(
                format!(
                    "{installed} installed, {present} already present, {failed} failed\n"
                )
                .as_bytes(),
            )
            .await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Use anyhow for Result type erasure
pub use anyhow::Result;

/// Set up logging
fn setup_logging() -> syslog::Result<()> {
    syslog::init(
        syslog::Facility::LOG_USER,
        if cfg!(feature = "log-trace") {
            LevelFilter::Trace
        } else if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        None,
    )
}
