//! Orchestration of a full mirroring run
//!
//! Index pages are few and cheap, so they are fetched sequentially; the data
//! file transfers they reveal are fanned out over a bounded pool of workers.
//! The run is best-effort: one failed transfer never aborts its siblings, and
//! the caller receives a complete per-URL outcome map to report from.

use crate::{
    config::Config,
    fetch::{self, FetchOutcome},
    index,
    progress::{ProgressReport, Work},
    Result,
};
use anyhow::Context;
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;

/// Mirror every data file selected by the configuration
///
/// Returns one outcome per discovered URL, keyed deterministically. An index
/// page that cannot be fetched or parsed forfeits its selector's contribution
/// but leaves sibling selectors alone; the run only fails outright when
/// discovery yields no URL at all, when it is cancelled before any transfer
/// starts, or when task plumbing breaks.
pub async fn run(
    config: Arc<Config>,
    client: reqwest::Client,
    report: &ProgressReport,
    token: CancellationToken,
) -> Result<BTreeMap<Box<str>, FetchOutcome>> {
    // Discover data file URLs selector by selector, deduplicating across
    // selectors while preserving first-seen order
    let mut urls = Vec::new();
    let mut seen = HashSet::new();
    let mut failed_selectors = 0;
    for selector in &config.selectors {
        let index_url = selector.index_url(&config.base_url);
        log::debug!(
            "total counts reference for {}-{}grams: {}",
            selector.language,
            selector.order,
            selector.total_counts_url(&config.base_url)
        );
        // Discovery must honor cancellation too, including while an index
        // page request is in flight
        let discovered = tokio::select! {
            _ = token.cancelled() => anyhow::bail!("mirroring run was cancelled"),
            discovered = discover(&client, &index_url) => discovered,
        };
        match discovered {
            Ok(selector_urls) => {
                for url in selector_urls {
                    if seen.insert(url.clone()) {
                        urls.push(url);
                    }
                }
            }
            Err(error) => {
                log::error!(
                    "skipping {}-{}grams: {error}",
                    selector.language,
                    selector.order
                );
                failed_selectors += 1;
            }
        }
    }
    anyhow::ensure!(
        !urls.is_empty() || config.selectors.is_empty(),
        "discovery produced no data file URLs ({failed_selectors} of {} index pages unreadable)",
        config.selectors.len()
    );

    // Fan the transfers out over a bounded worker pool
    let downloads = report.add("Transferring data files", Work::Files(urls.len()), false);
    let bytes = report.add("Downloading", Work::Bytes(0), true);
    let workers = Arc::new(Semaphore::new(config.concurrency.get()));
    let mut transfers = JoinSet::new();
    for url in urls {
        let config = config.clone();
        let client = client.clone();
        let token = token.clone();
        let workers = workers.clone();
        let downloads = downloads.clone();
        let bytes = bytes.clone();
        transfers.spawn(async move {
            let _permit = workers
                .acquire_owned()
                .await
                .expect("the worker pool semaphore is never closed");
            let outcome = fetch::install(&client, &url, &config.destination, &token, &bytes).await;
            if downloads.make_progress(1) {
                bytes.done_adding_work();
            }
            (url, outcome)
        });
    }

    // Outcome keys are disjoint, so joining tasks one by one into a map never
    // contends on a key
    let mut outcomes = BTreeMap::new();
    while let Some(transfer) = transfers.join_next().await {
        let (url, outcome) = transfer.context("collecting the outcome of one transfer")?;
        outcomes.insert(url, outcome);
    }
    Ok(outcomes)
}

/// Fetch one index page and extract its data file URLs
async fn discover(client: &reqwest::Client, index_url: &str) -> Result<Vec<Box<str>>> {
    let page = index::fetch(client, index_url).await?;
    let urls = index::data_urls(&page)?;
    log::debug!("index {} lists {} data files", page.url, urls.len());
    Ok(urls)
}
