//! Supported Google Books Ngrams languages and n-gram orders
//!
//! The dataset publishes one export index page per (language, n-gram order)
//! pair. Both coordinates are drawn from small fixed sets, so selector
//! validation is a plain membership check that fails fast on the first
//! unrecognized token, before any network activity.

use crate::error::MirrorError;

/// Version tag of the dataset release whose exports we mirror
pub const DATASET_VERSION: &str = "20200217";

/// Where the dataset is published
pub const DEFAULT_BASE_URL: &str = "http://storage.googleapis.com";

/// Language codes that appear in dataset URLs, keyed by human-readable name
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("English", "eng"),
    ("American English", "eng-us"),
    ("British English", "eng-gb"),
    ("English Fiction", "eng-fiction"),
    ("Simplified Chinese", "chi_sim"),
    ("French", "fre"),
    ("German", "ger"),
    ("Hebrew", "heb"),
    ("Italian", "ita"),
    ("Russian", "rus"),
    ("Spanish", "spa"),
];

/// N-gram orders for which exports are published
pub const SUPPORTED_ORDERS: &[&str] = &["1", "2", "3", "4", "5"];

/// One (language, n-gram order) pair, pointing to one export index page
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Selector {
    /// Short language name, as in dataset URLs
    pub language: &'static str,

    /// N-gram order, as in dataset URLs
    pub order: &'static str,
}
//
impl Selector {
    /// URL of the index page enumerating this selector's data files
    pub fn index_url(&self, base_url: &str) -> Box<str> {
        format!(
            "{base_url}/books/ngrams/books/{DATASET_VERSION}/{lang}/{lang}-{order}-ngrams_exports.html",
            lang = self.language,
            order = self.order,
        )
        .into()
    }

    /// URL of this selector's total match counts file
    ///
    /// Reference data for downstream consumers, not fetched by the mirror.
    pub fn total_counts_url(&self, base_url: &str) -> Box<str> {
        format!(
            "{base_url}/books/ngrams/books/{DATASET_VERSION}/{lang}/totalcounts-{order}",
            lang = self.language,
            order = self.order,
        )
        .into()
    }
}

/// Decode comma-separated language and order lists into selectors
///
/// Selectors are the cross product of the two lists, in the order given. An
/// omitted list defaults to the full supported set.
pub fn selectors(
    languages: Option<&str>,
    orders: Option<&str>,
) -> Result<Vec<Selector>, MirrorError> {
    let languages = match languages {
        Some(list) => parse_list(list, language_codes(), |token| {
            MirrorError::InvalidLanguage(token.into())
        })?,
        None => language_codes().collect(),
    };
    let orders = match orders {
        Some(list) => parse_list(list, SUPPORTED_ORDERS.iter().copied(), |token| {
            MirrorError::InvalidNgram(token.into())
        })?,
        None => SUPPORTED_ORDERS.to_vec(),
    };
    Ok(languages
        .iter()
        .flat_map(|&language| orders.iter().map(move |&order| Selector { language, order }))
        .collect())
}

/// Short names of all supported languages
pub fn language_codes() -> impl Iterator<Item = &'static str> + Clone {
    SUPPORTED_LANGUAGES.iter().map(|(_long_name, code)| *code)
}

/// Check every element of a comma-separated list against a supported set
///
/// The first unrecognized token is reported through `reject`.
fn parse_list(
    list: &str,
    supported: impl Iterator<Item = &'static str> + Clone,
    reject: impl FnOnce(&str) -> MirrorError,
) -> Result<Vec<&'static str>, MirrorError> {
    list.split(',')
        .map(|token| {
            supported
                .clone()
                .find(|supported| *supported == token)
                .ok_or(token)
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(reject)
}
