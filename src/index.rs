//! Fetching and parsing of ngram export index pages
//!
//! Each (language, n-gram order) selector maps to one HTML index page that
//! enumerates the downloadable data files as a list of links. Fetching is a
//! pure fetch-and-validate step with no retry and no caching; retry policy
//! belongs to the orchestration layer.

use crate::error::MirrorError;
use scraper::{Html, Selector as CssSelector};

/// Raw text of one index page, tagged with the URL it was fetched from
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct IndexPage {
    /// URL the page was fetched from
    pub url: Box<str>,

    /// Page markup, validated to be well-formed text
    pub body: Box<str>,
}

/// Download an index page and validate that it is well-formed text
///
/// A non-success status means the index does not exist or is unreachable. A
/// body that is not strict UTF-8 is rejected rather than lossily decoded, as
/// a binary response must never be silently accepted as a listing.
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<IndexPage, MirrorError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MirrorError::transfer(url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(MirrorError::Remote {
            url: url.into(),
            status,
        });
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| MirrorError::transfer(url, e))?;
    let body = String::from_utf8(bytes.to_vec())
        .map_err(|_| MirrorError::Decode { url: url.into() })?;
    Ok(IndexPage {
        url: url.into(),
        body: body.into(),
    })
}

/// Extract the data file URLs referenced by an index page, in document order
///
/// Every list item is expected to nest a link with an `href` target. A list
/// item that does not is a sign that the index format has changed, so
/// extraction fails fast rather than returning a silently incomplete URL set.
/// Duplicate URLs are preserved; deduplication across index pages is the
/// orchestrator's concern.
pub fn data_urls(page: &IndexPage) -> Result<Vec<Box<str>>, MirrorError> {
    let document = Html::parse_document(&page.body);
    let list_items = CssSelector::parse("li").expect("hardcoded CSS selector should be valid");
    let anchors = CssSelector::parse("a").expect("hardcoded CSS selector should be valid");
    document
        .select(&list_items)
        .map(|item| {
            let target = item
                .select(&anchors)
                .next()
                .and_then(|anchor| anchor.value().attr("href"));
            target.map(Box::from).ok_or_else(|| {
                let text = item.text().collect::<String>();
                MirrorError::MalformedEntry {
                    text: text.trim().into(),
                }
            })
        })
        .collect()
}
