//! Futures market data: contract basics and daily bars
//!
//! Contract basics come from one `fut_basic` query per exchange. Daily bars
//! are fetched one contract at a time with a fixed pause between requests and
//! concatenated into a single table before caching.

use std::time::Duration;

use polars::prelude::DataFrame;
use serde_json::json;
use tokio::time::sleep;
use tracing::info;

use super::{fetch_progress, DataError};
use crate::cache::FileCache;
use crate::pro::{FieldDef, ProClient};
use crate::table;

/// Columns of the futures contract basics table (`fut_basic`)
pub const BASIC_FIELDS: &[FieldDef] = &[
    FieldDef::str("ts_code"),
    FieldDef::str("symbol"),
    FieldDef::str("exchange"),
    FieldDef::str("name"),
    FieldDef::str("fut_code"),
    FieldDef::float("multiplier"),
    FieldDef::str("trade_unit"),
    FieldDef::float("per_unit"),
    FieldDef::str("quote_unit"),
    FieldDef::str("list_date"),
    FieldDef::str("delist_date"),
];

/// Columns of the futures daily bar table (`fut_daily`)
pub const DAILY_FIELDS: &[FieldDef] = &[
    FieldDef::str("ts_code"),
    FieldDef::str("trade_date"),
    FieldDef::float("open"),
    FieldDef::float("high"),
    FieldDef::float("low"),
    FieldDef::float("close"),
    FieldDef::float("settle"),
    FieldDef::float("vol"),
    FieldDef::float("amount"),
    FieldDef::float("oi"),
];

/// Cache key for the contract basics of an exchange
pub fn basics_key(exchange: &str) -> String {
    format!("future_basic_{}", exchange)
}

/// Cache key for a daily-bar snapshot.
///
/// The contract list is itself derived from the cached basics table, so the
/// date range alone identifies the snapshot.
pub fn daily_key(start: &str, end: &str) -> String {
    format!("fut_daily_{}_{}", start, end)
}

/// Access layer for futures market data
#[derive(Debug, Clone)]
pub struct FuturesClient {
    pro: ProClient,
    cache: FileCache,
    request_delay: Duration,
}

impl FuturesClient {
    /// Creates a futures access layer over the given provider client and cache
    pub fn new(pro: ProClient, cache: FileCache, request_delay: Duration) -> Self {
        Self {
            pro,
            cache,
            request_delay,
        }
    }

    /// Contract basics for an exchange, cached under `future_basic_<exchange>`.
    pub async fn basics(&self, exchange: &str) -> Result<DataFrame, DataError> {
        self.cache
            .get_or_compute(&basics_key(exchange), || async move {
                let df = self
                    .pro
                    .query("fut_basic", json!({ "exchange": exchange }), BASIC_FIELDS)
                    .await?;
                Ok(df)
            })
            .await
    }

    /// Daily bars for a set of contracts over a date range, cached under
    /// `fut_daily_<start>_<end>`.
    ///
    /// On a cache miss this issues one provider request per contract, pausing
    /// `request_delay` before each, and concatenates the per-contract pages
    /// in input order.
    pub async fn daily(
        &self,
        ts_codes: &[String],
        start: &str,
        end: &str,
    ) -> Result<DataFrame, DataError> {
        self.cache
            .get_or_compute(&daily_key(start, end), || {
                self.fetch_daily(ts_codes, start, end)
            })
            .await
    }

    async fn fetch_daily(
        &self,
        ts_codes: &[String],
        start: &str,
        end: &str,
    ) -> Result<DataFrame, DataError> {
        let progress = fetch_progress(ts_codes.len(), "futures daily bars");
        let mut pages = Vec::with_capacity(ts_codes.len());

        for ts_code in ts_codes {
            sleep(self.request_delay).await;
            let page = self
                .pro
                .query(
                    "fut_daily",
                    json!({ "ts_code": ts_code, "start_date": start, "end_date": end }),
                    DAILY_FIELDS,
                )
                .await?;
            progress.inc(1);
            pages.push(page);
        }
        progress.finish_and_clear();

        info!(contracts = ts_codes.len(), start, end, "fetched futures daily bars");
        Ok(table::concat(pages)?)
    }
}
