//! Index daily bars
//!
//! One `index_daily` query per code and date range. The provider serves bars
//! newest-first; the returned series is sorted ascending by trade date, which
//! for compact `YYYYMMDD` strings is plain lexicographic order.

use polars::prelude::{DataFrame, SortMultipleOptions};
use serde_json::{json, Value};

use super::DataError;
use crate::cache::FileCache;
use crate::pro::{FieldDef, ProClient};

/// Columns of the index daily bar table (`index_daily`)
pub const DAILY_FIELDS: &[FieldDef] = &[
    FieldDef::str("ts_code"),
    FieldDef::str("trade_date"),
    FieldDef::float("close"),
    FieldDef::float("open"),
    FieldDef::float("high"),
    FieldDef::float("low"),
    FieldDef::float("pre_close"),
    FieldDef::float("change"),
    FieldDef::float("pct_chg"),
    FieldDef::float("vol"),
    FieldDef::float("amount"),
];

/// Cache key for an index daily series.
///
/// Absent date bounds render as `none` so an unbounded fetch still maps to a
/// deterministic key distinct from any bounded one.
pub fn daily_key(ts_code: &str, start: Option<&str>, end: Option<&str>) -> String {
    format!(
        "index_daily_{}_{}_{}",
        ts_code,
        start.unwrap_or("none"),
        end.unwrap_or("none")
    )
}

/// Access layer for index market data
#[derive(Debug, Clone)]
pub struct IndexClient {
    pro: ProClient,
    cache: FileCache,
}

impl IndexClient {
    /// Creates an index access layer over the given provider client and cache
    pub fn new(pro: ProClient, cache: FileCache) -> Self {
        Self { pro, cache }
    }

    /// Daily bars for an index code, cached under
    /// `index_daily_<code>_<start>_<end>` and sorted ascending by trade date.
    ///
    /// The cache stores the series as fetched; sorting is applied on every
    /// return so hits and misses come back in the same order.
    pub async fn daily(
        &self,
        ts_code: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<DataFrame, DataError> {
        let df = self
            .cache
            .get_or_compute(&daily_key(ts_code, start, end), || async move {
                let mut params = serde_json::Map::new();
                params.insert("ts_code".to_string(), json!(ts_code));
                if let Some(start) = start {
                    params.insert("start_date".to_string(), json!(start));
                }
                if let Some(end) = end {
                    params.insert("end_date".to_string(), json!(end));
                }

                let df = self
                    .pro
                    .query("index_daily", Value::Object(params), DAILY_FIELDS)
                    .await?;
                Ok::<_, DataError>(df)
            })
            .await?;

        sorted_by_trade_date(df)
    }
}

/// Sorts a daily series ascending by trade date
fn sorted_by_trade_date(df: DataFrame) -> Result<DataFrame, DataError> {
    Ok(df.sort(["trade_date"], SortMultipleOptions::default())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;

    #[test]
    fn test_daily_key_contains_code_and_bounds() {
        assert_eq!(
            daily_key("000300.SH", Some("20240101"), Some("20240601")),
            "index_daily_000300.SH_20240101_20240601"
        );
    }

    #[test]
    fn test_daily_key_renders_absent_bounds_as_none() {
        assert_eq!(
            daily_key("000300.SH", None, None),
            "index_daily_000300.SH_none_none"
        );
        assert_ne!(
            daily_key("000300.SH", None, None),
            daily_key("000300.SH", Some("20240101"), None)
        );
    }

    #[test]
    fn test_distinct_codes_map_to_distinct_keys() {
        assert_ne!(
            daily_key("000300.SH", None, None),
            daily_key("000905.SH", None, None)
        );
    }

    #[test]
    fn test_sorted_by_trade_date_orders_newest_last() {
        let trade_date = Column::new(
            "trade_date".into(),
            ["20240605", "20240603", "20240604"],
        );
        let close = Column::new("close".into(), [3520.1, 3498.6, 3510.0]);
        let df = DataFrame::new(vec![trade_date, close]).unwrap();

        let sorted = sorted_by_trade_date(df).unwrap();

        let dates: Vec<_> = sorted
            .column("trade_date")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(dates, vec!["20240603", "20240604", "20240605"]);
    }
}
