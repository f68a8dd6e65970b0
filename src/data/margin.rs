//! Margin-trading detail
//!
//! One `margin_detail` query per trade date with a fixed pause between
//! requests. The batch is cached under the latest requested date, matching
//! the research workflow where the date list is a trading calendar prefix.

use std::time::Duration;

use polars::prelude::DataFrame;
use serde_json::json;
use tokio::time::sleep;
use tracing::info;

use super::{fetch_progress, DataError};
use crate::cache::FileCache;
use crate::pro::{FieldDef, ProClient};
use crate::table;

/// Columns of the margin detail table (`margin_detail`)
pub const DETAIL_FIELDS: &[FieldDef] = &[
    FieldDef::str("trade_date"),
    FieldDef::str("ts_code"),
    FieldDef::str("name"),
    FieldDef::float("rzye"),
    FieldDef::float("rqye"),
    FieldDef::float("rzmre"),
    FieldDef::float("rqyl"),
    FieldDef::float("rzche"),
    FieldDef::float("rqchl"),
    FieldDef::float("rqmcl"),
    FieldDef::float("rzrqye"),
];

/// Cache key for a margin detail batch: the latest requested trade date.
///
/// Returns `None` for an empty date list, which has no meaningful key.
pub fn detail_key(trade_dates: &[String]) -> Option<String> {
    trade_dates
        .iter()
        .max()
        .map(|latest| format!("margin_detail_{}", latest))
}

/// Access layer for margin-trading data
#[derive(Debug, Clone)]
pub struct MarginClient {
    pro: ProClient,
    cache: FileCache,
    request_delay: Duration,
}

impl MarginClient {
    /// Creates a margin access layer over the given provider client and cache
    pub fn new(pro: ProClient, cache: FileCache, request_delay: Duration) -> Self {
        Self {
            pro,
            cache,
            request_delay,
        }
    }

    /// Margin detail for the given trade dates, fetched one date at a time
    /// and concatenated in input order.
    pub async fn detail(&self, trade_dates: &[String]) -> Result<DataFrame, DataError> {
        let key = detail_key(trade_dates).ok_or(DataError::EmptyArgument("trade dates"))?;
        self.cache
            .get_or_compute(&key, || self.fetch_detail(trade_dates))
            .await
    }

    async fn fetch_detail(&self, trade_dates: &[String]) -> Result<DataFrame, DataError> {
        let progress = fetch_progress(trade_dates.len(), "margin detail");
        let mut pages = Vec::with_capacity(trade_dates.len());

        for trade_date in trade_dates {
            sleep(self.request_delay).await;
            let page = self
                .pro
                .query(
                    "margin_detail",
                    json!({ "trade_date": trade_date }),
                    DETAIL_FIELDS,
                )
                .await?;
            progress.inc(1);
            pages.push(page);
        }
        progress.finish_and_clear();

        info!(dates = trade_dates.len(), "fetched margin detail");
        Ok(table::concat(pages)?)
    }
}
