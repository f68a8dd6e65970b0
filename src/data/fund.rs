//! Fund basics and NAV history
//!
//! The fund universe is the set of equity funds with the enhanced-index
//! investment style, filtered out of the full `fund_basic` listing before
//! caching. NAV history is then fetched one fund at a time over that cached
//! universe and concatenated.

use std::time::Duration;

use polars::prelude::{col, lit, DataFrame, IntoLazy};
use serde_json::json;
use tokio::time::sleep;
use tracing::info;

use super::{fetch_progress, DataError};
use crate::cache::FileCache;
use crate::pro::{FieldDef, ProClient};
use crate::table;

/// Columns of the fund basics table (`fund_basic`)
pub const BASIC_FIELDS: &[FieldDef] = &[
    FieldDef::str("ts_code"),
    FieldDef::str("name"),
    FieldDef::str("management"),
    FieldDef::str("custodian"),
    FieldDef::str("fund_type"),
    FieldDef::str("found_date"),
    FieldDef::float("issue_amount"),
    FieldDef::float("m_fee"),
    FieldDef::float("c_fee"),
    FieldDef::str("benchmark"),
    FieldDef::str("status"),
    FieldDef::str("invest_type"),
];

/// Columns of the fund NAV table (`fund_nav`)
pub const NAV_FIELDS: &[FieldDef] = &[
    FieldDef::str("ts_code"),
    FieldDef::str("nav_date"),
    FieldDef::float("unit_nav"),
    FieldDef::float("accum_nav"),
    FieldDef::float("accum_div"),
    FieldDef::float("net_asset"),
    FieldDef::float("total_netasset"),
    FieldDef::float("adj_nav"),
];

/// Fixed cache key for the enhanced-index fund basics table
pub const BASICS_KEY: &str = "fund_basic";

/// `fund_type` value selecting equity funds
const EQUITY_FUND_TYPE: &str = "股票型";

/// `invest_type` value selecting the enhanced-index style
const ENHANCED_INDEX_INVEST_TYPE: &str = "增强指数型";

/// Cache key for a NAV history batch
pub fn nav_key(start: &str, end: &str) -> String {
    format!("fund_nav_{}_{}", start, end)
}

/// Access layer for fund data
#[derive(Debug, Clone)]
pub struct FundClient {
    pro: ProClient,
    cache: FileCache,
    request_delay: Duration,
}

impl FundClient {
    /// Creates a fund access layer over the given provider client and cache
    pub fn new(pro: ProClient, cache: FileCache, request_delay: Duration) -> Self {
        Self {
            pro,
            cache,
            request_delay,
        }
    }

    /// Basics of enhanced-index equity funds, cached under a fixed key.
    ///
    /// The full listing is filtered before caching, so the cache entry holds
    /// only the funds of interest.
    pub async fn enhanced_index_basics(&self) -> Result<DataFrame, DataError> {
        self.cache
            .get_or_compute(BASICS_KEY, || async move {
                let df = self.pro.query("fund_basic", json!({}), BASIC_FIELDS).await?;
                filter_enhanced_index(df)
            })
            .await
    }

    /// NAV history over the cached fund universe, cached under
    /// `fund_nav_<start>_<end>`.
    ///
    /// On a miss the fund universe comes from [`Self::enhanced_index_basics`]
    /// (itself cached), then one `fund_nav` query runs per fund with the
    /// fixed pause, and the pages are concatenated in universe order.
    pub async fn enhanced_index_nav(&self, start: &str, end: &str) -> Result<DataFrame, DataError> {
        self.cache
            .get_or_compute(&nav_key(start, end), || self.fetch_nav(start, end))
            .await
    }

    async fn fetch_nav(&self, start: &str, end: &str) -> Result<DataFrame, DataError> {
        let basics = self.enhanced_index_basics().await?;
        let ts_codes = table::column_values(&basics, "ts_code")?;

        let progress = fetch_progress(ts_codes.len(), "fund NAV history");
        let mut pages = Vec::with_capacity(ts_codes.len());

        for ts_code in &ts_codes {
            sleep(self.request_delay).await;
            let page = self
                .pro
                .query(
                    "fund_nav",
                    json!({ "ts_code": ts_code, "start_date": start, "end_date": end }),
                    NAV_FIELDS,
                )
                .await?;
            progress.inc(1);
            pages.push(page);
        }
        progress.finish_and_clear();

        info!(funds = ts_codes.len(), start, end, "fetched fund NAV history");
        Ok(table::concat(pages)?)
    }
}

/// Keeps only equity funds with the enhanced-index investment style
fn filter_enhanced_index(df: DataFrame) -> Result<DataFrame, DataError> {
    let filtered = df
        .lazy()
        .filter(
            col("fund_type")
                .eq(lit(EQUITY_FUND_TYPE))
                .and(col("invest_type").eq(lit(ENHANCED_INDEX_INVEST_TYPE))),
        )
        .collect()?;
    Ok(filtered)
}
