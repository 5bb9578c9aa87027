//! Download and atomic installation of one gzipped data file
//!
//! A data file is either wholly absent, a temporary not-yet-committed file, or
//! a complete validated file at its final path. A partially-written file is
//! never visible under the final name: the payload is streamed into a
//! temporary file in the destination directory, validated by a full gzip
//! decompression pass, and only then renamed into place. Every failure path
//! discards the temporary file instead.

use crate::{error::MirrorError, progress::ProgressTracker};
use async_compression::tokio::bufread::GzipDecoder;
use futures::stream::TryStreamExt;
use std::{
    io::{self, ErrorKind},
    path::Path,
};
use tempfile::TempPath;
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufReader},
};
use tokio_util::{io::StreamReader, sync::CancellationToken};
use url::Url;

/// Per-URL result of one installation attempt
#[derive(Debug)]
pub enum FetchOutcome {
    /// The file was already installed, no network request was made
    AlreadyPresent,

    /// The file was downloaded, validated and renamed into place
    Installed,

    /// The attempt failed and left no trace on disk
    ///
    /// A future run with the same arguments retries from scratch.
    Failed(MirrorError),
}

/// Install the data file behind `url` into `destination`
///
/// Repeated invocations are safe and cheap: a file that is already installed
/// is reported as such without any network I/O.
pub async fn install(
    client: &reqwest::Client,
    url: &str,
    destination: &Path,
    token: &CancellationToken,
    bytes: &ProgressTracker,
) -> FetchOutcome {
    match try_install(client, url, destination, token, bytes).await {
        Ok(outcome) => outcome,
        Err(error) => FetchOutcome::Failed(error),
    }
}

/// Fallible body of [`install`]
async fn try_install(
    client: &reqwest::Client,
    url: &str,
    destination: &Path,
    token: &CancellationToken,
    bytes: &ProgressTracker,
) -> Result<FetchOutcome, MirrorError> {
    // Idempotence gate: skip files that are already installed
    let final_path = destination.join(&*artifact_name(url)?);
    if tokio::fs::try_exists(&final_path)
        .await
        .map_err(|e| MirrorError::transfer(url, e))?
    {
        log::debug!("{url} is already installed, skipping");
        return Ok(FetchOutcome::AlreadyPresent);
    }
    if token.is_cancelled() {
        return Err(MirrorError::Cancelled { url: url.into() });
    }

    // The temporary file lives in the destination directory so that the final
    // rename stays within one filesystem and is atomic
    let temp_path = download(client, url, destination, token, bytes).await?;
    validate_gzip(url, &temp_path, token).await?;

    // Promotion is gated strictly behind confirmed success; on any earlier
    // error the TempPath drop deletes the partial file instead
    temp_path
        .persist(&final_path)
        .map_err(|e| MirrorError::transfer(url, e))?;
    log::info!("installed {}", final_path.display());
    Ok(FetchOutcome::Installed)
}

/// Stream the compressed payload of `url` into a fresh temporary file
async fn download(
    client: &reqwest::Client,
    url: &str,
    destination: &Path,
    token: &CancellationToken,
    bytes: &ProgressTracker,
) -> Result<TempPath, MirrorError> {
    // Start the download, bailing out if the run is cancelled while the
    // request is still connecting or awaiting response headers
    let response = tokio::select! {
        _ = token.cancelled() => {
            return Err(MirrorError::Cancelled { url: url.into() });
        }
        response = client.get(url).send() => {
            response.map_err(|e| MirrorError::transfer(url, e))?
        }
    };
    let status = response.status();
    if !status.is_success() {
        return Err(MirrorError::Remote {
            url: url.into(),
            status,
        });
    }
    if let Some(len) = response.content_length() {
        bytes.add_work(len);
    }

    // Slice the download into chunks of bytes
    let progress = bytes.clone();
    let mut payload = Box::pin(StreamReader::new(
        response
            .bytes_stream()
            .map_ok(move |chunk| {
                progress.make_progress(chunk.len() as u64);
                chunk
            })
            .map_err(|e| io::Error::new(ErrorKind::Other, Box::new(e))),
    ));

    // Write the raw compressed bytes to the temporary file, aborting promptly
    // if the run is cancelled
    let (file, temp_path) = tempfile::Builder::new()
        .prefix(".ngram-mirror.")
        .suffix(".part")
        .tempfile_in(destination)
        .map_err(|e| MirrorError::transfer(url, e))?
        .into_parts();
    let mut file = File::from_std(file);
    tokio::select! {
        _ = token.cancelled() => {
            return Err(MirrorError::Cancelled { url: url.into() });
        }
        copied = tokio::io::copy(&mut payload, &mut file) => {
            copied.map_err(|e| MirrorError::transfer(url, e))?;
        }
    }
    file.flush()
        .await
        .map_err(|e| MirrorError::transfer(url, e))?;
    Ok(temp_path)
}

/// Check that a downloaded file is a complete, well-formed gzip stream
///
/// A truncated download passes through the transfer layer undetected when the
/// connection closes cleanly, but it cannot pass the decompressor's end-of-
/// stream and checksum verification.
async fn validate_gzip(
    url: &str,
    temp_path: &Path,
    token: &CancellationToken,
) -> Result<(), MirrorError> {
    let compressed = File::open(temp_path)
        .await
        .map_err(|e| MirrorError::transfer(url, e))?;
    let mut decoder = GzipDecoder::new(BufReader::new(compressed));
    decoder.multiple_members(true);
    let mut sink = tokio::io::sink();
    tokio::select! {
        _ = token.cancelled() => Err(MirrorError::Cancelled { url: url.into() }),
        decoded = tokio::io::copy(&mut decoder, &mut sink) => decoded
            .map(|_decompressed_bytes| ())
            .map_err(|e| MirrorError::transfer(url, e)),
    }
}

/// Canonical local file name of a data file URL
///
/// The basename of the URL path identifies the artifact in the destination
/// directory.
pub fn artifact_name(url: &str) -> Result<Box<str>, MirrorError> {
    let parsed = Url::parse(url).map_err(|e| MirrorError::transfer(url, e))?;
    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .map(Box::from)
        .ok_or_else(|| MirrorError::transfer(url, "URL has no file name"))
}
