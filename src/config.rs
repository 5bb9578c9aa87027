//! Mirroring run configuration
//!
//! This is the result of combining digested [`Args`] with the validated
//! selector list. It is constructed once at startup and passed around as an
//! [`Arc`], so there is no process-wide mutable state.

use crate::{languages::Selector, Args};
use std::{num::NonZeroUsize, path::PathBuf, sync::Arc};

/// Final process configuration
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Config {
    /// Index pages to be discovered, in user-requested order
    pub selectors: Vec<Selector>,

    /// Directory where data files are installed
    pub destination: PathBuf,

    /// Maximal number of concurrent data file transfers
    pub concurrency: NonZeroUsize,

    /// Base URL of the dataset host
    pub base_url: Box<str>,
}
//
impl Config {
    /// Determine process configuration from initialization products
    pub(crate) fn new(args: Args, selectors: Vec<Selector>) -> Arc<Self> {
        let Args {
            language: _,
            ngram: _,
            destination,
            concurrency,
            base_url,
        } = args;
        Arc::new(Self {
            selectors,
            destination,
            concurrency,
            base_url,
        })
    }
}
