//! Dataset access layers for TuShare market data
//!
//! Each submodule pairs the provider client with the file cache for one data
//! family: futures contracts and bars, index bars, margin-trading detail, and
//! fund basics/NAV. Cache keys are derived by pure functions of the fetch
//! arguments so identical calls hit the same entry.

pub mod fund;
pub mod futures;
pub mod index;
pub mod margin;

pub use fund::FundClient;
pub use futures::FuturesClient;
pub use index::IndexClient;
pub use margin::MarginClient;

use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::PolarsError;
use thiserror::Error;

use crate::cache::CacheError;
use crate::pro::ProError;
use crate::table::TableError;

/// Errors surfaced by dataset fetches
///
/// Failures from the provider, the cache, or table handling propagate
/// unmodified; nothing here is retried or downgraded.
#[derive(Debug, Error)]
pub enum DataError {
    /// The provider call failed
    #[error(transparent)]
    Provider(#[from] ProError),

    /// The cache could not be read or written
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A table could not be combined or inspected
    #[error(transparent)]
    Table(#[from] TableError),

    /// A table operation failed
    #[error("table operation failed: {0}")]
    Frame(#[from] PolarsError),

    /// A required argument sequence was empty
    #[error("no {0} provided")]
    EmptyArgument(&'static str),
}

/// Progress bar for a sequential per-item fetch loop
pub(crate) fn fetch_progress(len: usize, what: &str) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")
            .expect("progress template is valid")
            .progress_chars("=>-"),
    );
    bar.set_message(what.to_string());
    bar
}
