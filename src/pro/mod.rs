//! TuShare Pro API client
//!
//! This module provides the HTTP client for the TuShare Pro data service and
//! the schema-driven decoding of its tabular responses.

mod client;

pub use client::{ColumnKind, FieldDef, ProClient, ProError};
