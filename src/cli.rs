//! Command-line interface parsing for tudata
//!
//! This module handles parsing of CLI arguments using clap: cache and pacing
//! options shared by every fetch, plus one subcommand per dataset. Dates are
//! validated here, in the provider's compact form, before any request is made.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The date argument is not a valid compact date
    #[error("Invalid date: '{0}'. Dates use the compact YYYYMMDD form, e.g. 20240607")]
    InvalidDate(String),
}

/// tudata - fetch and cache TuShare market data
#[derive(Parser, Debug)]
#[command(name = "tudata")]
#[command(about = "Fetch and cache TuShare market data tables")]
#[command(version)]
pub struct Cli {
    /// Directory where cached tables are stored
    #[arg(long, value_name = "DIR", default_value = config::DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Delay between successive provider requests, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 200)]
    pub delay_ms: u64,

    /// Dataset to fetch; omitted, fetches futures contract basics for CFFEX
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// One subcommand per dataset operation
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Futures contract basics for an exchange
    FutBasic {
        /// Exchange code, e.g. CFFEX, SHFE, DCE
        #[arg(long, default_value = "CFFEX")]
        exchange: String,
    },
    /// Daily bars for every futures contract listed on an exchange
    FutDaily {
        /// Exchange whose contract list defines the fetch universe
        #[arg(long, default_value = "CFFEX")]
        exchange: String,
        /// First trade date (YYYYMMDD)
        #[arg(long, value_parser = parse_compact_date)]
        start: NaiveDate,
        /// Last trade date (YYYYMMDD)
        #[arg(long, value_parser = parse_compact_date)]
        end: NaiveDate,
    },
    /// Daily bars for an index code
    IndexDaily {
        /// Index code, e.g. 000300.SH
        #[arg(long)]
        ts_code: String,
        /// First trade date (YYYYMMDD); omitted, the series is unbounded
        #[arg(long, value_parser = parse_compact_date)]
        start: Option<NaiveDate>,
        /// Last trade date (YYYYMMDD); omitted, the series is unbounded
        #[arg(long, value_parser = parse_compact_date)]
        end: Option<NaiveDate>,
    },
    /// Margin-trading detail for one or more trade dates
    MarginDetail {
        /// Comma-separated trade dates (YYYYMMDD)
        #[arg(long, value_delimiter = ',', value_parser = parse_compact_date, required = true)]
        dates: Vec<NaiveDate>,
    },
    /// Basics of enhanced-index equity funds
    FundBasic,
    /// NAV history for the enhanced-index fund universe
    FundNav {
        /// First NAV date (YYYYMMDD)
        #[arg(long, value_parser = parse_compact_date)]
        start: NaiveDate,
        /// Last NAV date (YYYYMMDD)
        #[arg(long, value_parser = parse_compact_date)]
        end: NaiveDate,
    },
}

impl Default for Command {
    /// The zero-argument invocation mirrors the original research workflow:
    /// fetch and print futures contract basics for CFFEX.
    fn default() -> Self {
        Command::FutBasic {
            exchange: "CFFEX".to_string(),
        }
    }
}

/// Parses a compact `YYYYMMDD` date argument.
///
/// # Arguments
/// * `s` - The date string from the CLI
///
/// # Returns
/// * `Ok(NaiveDate)` if the string is a valid compact date
/// * `Err(CliError::InvalidDate)` otherwise
pub fn parse_compact_date(s: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| CliError::InvalidDate(s.to_string()))
}

/// Formats a date back into the provider's compact form
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compact_date_valid() {
        let date = parse_compact_date("20240607").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 7).unwrap());
    }

    #[test]
    fn test_parse_compact_date_rejects_dashes() {
        let result = parse_compact_date("2024-06-07");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
        assert!(err.to_string().contains("2024-06-07"));
    }

    #[test]
    fn test_parse_compact_date_rejects_impossible_date() {
        assert!(parse_compact_date("20240231").is_err());
        assert!(parse_compact_date("not a date").is_err());
    }

    #[test]
    fn test_compact_date_roundtrip() {
        let date = parse_compact_date("20231021").unwrap();
        assert_eq!(compact_date(date), "20231021");
    }

    #[test]
    fn test_cli_parse_no_args_uses_defaults() {
        let cli = Cli::parse_from(["tudata"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.cache_dir, PathBuf::from("data"));
        assert_eq!(cli.delay_ms, 200);
    }

    #[test]
    fn test_cli_parse_cache_dir_override() {
        let cli = Cli::parse_from(["tudata", "--cache-dir", "/tmp/tables"]);
        assert_eq!(cli.cache_dir, PathBuf::from("/tmp/tables"));
    }

    #[test]
    fn test_cli_parse_fut_basic_exchange() {
        let cli = Cli::parse_from(["tudata", "fut-basic", "--exchange", "SHFE"]);
        match cli.command {
            Some(Command::FutBasic { exchange }) => assert_eq!(exchange, "SHFE"),
            other => panic!("expected FutBasic, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_index_daily_with_bounds() {
        let cli = Cli::parse_from([
            "tudata",
            "index-daily",
            "--ts-code",
            "000300.SH",
            "--start",
            "20240101",
            "--end",
            "20240601",
        ]);
        match cli.command {
            Some(Command::IndexDaily { ts_code, start, end }) => {
                assert_eq!(ts_code, "000300.SH");
                assert_eq!(start, Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
                assert_eq!(end, Some(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
            }
            other => panic!("expected IndexDaily, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_index_daily_bounds_optional() {
        let cli = Cli::parse_from(["tudata", "index-daily", "--ts-code", "000300.SH"]);
        match cli.command {
            Some(Command::IndexDaily { start, end, .. }) => {
                assert!(start.is_none());
                assert!(end.is_none());
            }
            other => panic!("expected IndexDaily, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_margin_detail_splits_dates() {
        let cli = Cli::parse_from([
            "tudata",
            "margin-detail",
            "--dates",
            "20240605,20240606,20240607",
        ]);
        match cli.command {
            Some(Command::MarginDetail { dates }) => assert_eq!(dates.len(), 3),
            other => panic!("expected MarginDetail, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_invalid_date_argument() {
        let result = Cli::try_parse_from([
            "tudata",
            "fund-nav",
            "--start",
            "junk",
            "--end",
            "20240601",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_command_is_cffex_basics() {
        match Command::default() {
            Command::FutBasic { exchange } => assert_eq!(exchange, "CFFEX"),
            other => panic!("expected FutBasic, got {:?}", other),
        }
    }
}
