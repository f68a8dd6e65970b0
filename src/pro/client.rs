//! HTTP client for the TuShare Pro API
//!
//! Every TuShare Pro query goes through one endpoint: a POST carrying the API
//! name, the access token, and a parameter object. The response is a tabular
//! envelope of column names plus rows of JSON values, which is decoded here
//! into a typed table according to a caller-supplied schema.

use polars::prelude::{Column, DataFrame, PolarsError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Endpoint serving every TuShare Pro query
const PRO_API_URL: &str = "https://api.tushare.pro";

/// Value type of a response column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// UTF-8 string column (codes, names, compact dates)
    Str,
    /// 64-bit float column (prices, balances, volumes)
    Float,
    /// 64-bit integer column
    Int,
}

/// Declared name and type of one response column
///
/// Dataset modules declare their expected columns as `FieldDef` constants;
/// the declared names are sent as the query's `fields` parameter and the
/// declared types drive decoding.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// Provider-side column name
    pub name: &'static str,
    /// Value type the column decodes to
    pub kind: ColumnKind,
}

impl FieldDef {
    /// Declares a string column
    pub const fn str(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Str,
        }
    }

    /// Declares a float column
    pub const fn float(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Float,
        }
    }

    /// Declares an integer column
    #[allow(dead_code)]
    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Int,
        }
    }
}

/// Errors that can occur when querying the provider
#[derive(Debug, Error)]
pub enum ProError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to parse the response envelope
    #[error("failed to parse provider response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The provider rejected the request
    #[error("provider rejected the request (code {code}): {msg}")]
    Api { code: i64, msg: String },

    /// Successful status but no data payload
    #[error("provider response has no data payload")]
    MissingData,

    /// A declared column is absent from the response
    #[error("column missing from provider response: {0}")]
    MissingColumn(String),

    /// A cell does not match its column's declared type
    #[error("unexpected value in column {column}: {value}")]
    UnexpectedValue { column: String, value: String },

    /// A row does not line up with the response header
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The decoded columns could not be assembled into a table
    #[error("failed to assemble table: {0}")]
    Frame(#[from] PolarsError),
}

/// Request body for a TuShare Pro query
#[derive(Debug, Serialize)]
struct ProRequest<'a> {
    api_name: &'a str,
    token: &'a str,
    params: &'a Value,
    fields: String,
}

/// Response envelope from TuShare Pro
#[derive(Debug, Deserialize)]
struct ProResponse {
    code: i64,
    msg: Option<String>,
    data: Option<ResponseData>,
}

/// Tabular payload of a successful response
#[derive(Debug, Deserialize)]
struct ResponseData {
    /// Column names, in the order the rows use
    fields: Vec<String>,
    /// Rows of JSON values
    items: Vec<Vec<Value>>,
}

/// Client for the TuShare Pro API
#[derive(Debug, Clone)]
pub struct ProClient {
    /// HTTP client for making requests
    http: Client,
    /// Access token sent with every query
    token: String,
    /// Endpoint URL (allows override for testing)
    base_url: String,
}

impl ProClient {
    /// Creates a client that authenticates with the given token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            token: token.into(),
            base_url: PRO_API_URL.to_string(),
        }
    }

    /// Returns the client pointed at a custom endpoint (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Runs one provider query and decodes the result into a table.
    ///
    /// # Arguments
    /// * `api_name` - Provider query name, e.g. `fut_basic`
    /// * `params` - Query parameters as a JSON object
    /// * `schema` - Columns to request and their types
    ///
    /// # Returns
    /// * `Ok(DataFrame)` - One column per schema entry, one row per item
    /// * `Err(ProError)` - If the request, the envelope, or the decode fails
    pub async fn query(
        &self,
        api_name: &str,
        params: Value,
        schema: &[FieldDef],
    ) -> Result<DataFrame, ProError> {
        let request = ProRequest {
            api_name,
            token: &self.token,
            params: &params,
            fields: fields_param(schema),
        };

        debug!(api_name, "requesting provider table");
        let response = self.http.post(&self.base_url).json(&request).send().await?;
        let text = response.text().await?;

        let data = parse_envelope(&text)?;
        let df = decode_frame(&data, schema)?;
        debug!(api_name, rows = df.height(), "provider table decoded");
        Ok(df)
    }
}

/// Joins the schema's column names into the provider `fields` parameter
fn fields_param(schema: &[FieldDef]) -> String {
    schema
        .iter()
        .map(|field| field.name)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses the response envelope, surfacing provider-side errors
fn parse_envelope(text: &str) -> Result<ResponseData, ProError> {
    let envelope: ProResponse = serde_json::from_str(text)?;
    if envelope.code != 0 {
        return Err(ProError::Api {
            code: envelope.code,
            msg: envelope.msg.unwrap_or_default(),
        });
    }
    envelope.data.ok_or(ProError::MissingData)
}

/// Decodes the fields/items payload into a table shaped by `schema`.
///
/// Columns are located by name, so the response may order or pad columns
/// differently than requested. Cells are coerced to the declared type;
/// `null` becomes a missing value.
fn decode_frame(data: &ResponseData, schema: &[FieldDef]) -> Result<DataFrame, ProError> {
    let mut columns = Vec::with_capacity(schema.len());

    for field in schema {
        let index = data
            .fields
            .iter()
            .position(|name| name == field.name)
            .ok_or_else(|| ProError::MissingColumn(field.name.to_string()))?;

        let column = match field.kind {
            ColumnKind::Str => {
                let mut values = Vec::with_capacity(data.items.len());
                for row in &data.items {
                    values.push(string_cell(row, index, field.name)?);
                }
                Column::new(field.name.into(), values)
            }
            ColumnKind::Float => {
                let mut values = Vec::with_capacity(data.items.len());
                for row in &data.items {
                    values.push(float_cell(row, index, field.name)?);
                }
                Column::new(field.name.into(), values)
            }
            ColumnKind::Int => {
                let mut values = Vec::with_capacity(data.items.len());
                for row in &data.items {
                    values.push(int_cell(row, index, field.name)?);
                }
                Column::new(field.name.into(), values)
            }
        };
        columns.push(column);
    }

    DataFrame::new(columns).map_err(ProError::from)
}

/// Looks up one cell, rejecting rows shorter than the header
fn cell<'a>(row: &'a [Value], index: usize, column: &str) -> Result<&'a Value, ProError> {
    row.get(index).ok_or_else(|| {
        ProError::Malformed(format!(
            "row has {} values but column {} is at position {}",
            row.len(),
            column,
            index
        ))
    })
}

fn string_cell(row: &[Value], index: usize, column: &str) -> Result<Option<String>, ProError> {
    match cell(row, index, column)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        // Some date-like columns arrive as bare numbers.
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(unexpected(column, other)),
    }
}

fn float_cell(row: &[Value], index: usize, column: &str) -> Result<Option<f64>, ProError> {
    match cell(row, index, column)? {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_f64() {
            Some(v) => Ok(Some(v)),
            None => Err(unexpected_str(column, &n.to_string())),
        },
        // Some numeric columns arrive as strings; blanks mean missing.
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| unexpected_str(column, s)),
        other => Err(unexpected(column, other)),
    }
}

fn int_cell(row: &[Value], index: usize, column: &str) -> Result<Option<i64>, ProError> {
    match cell(row, index, column)? {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(v) => Ok(Some(v)),
            None => Err(unexpected_str(column, &n.to_string())),
        },
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| unexpected_str(column, s)),
        other => Err(unexpected(column, other)),
    }
}

fn unexpected(column: &str, value: &Value) -> ProError {
    ProError::UnexpectedValue {
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn unexpected_str(column: &str, value: &str) -> ProError {
    ProError::UnexpectedValue {
        column: column.to_string(),
        value: value.to_string(),
    }
}
