//! Table codecs and row-wise operations
//!
//! Cached tables live on disk in two shapes: the primary format is an Arrow
//! IPC (feather) file compressed with zstd, the legacy format is a
//! row-oriented JSON array. The legacy format is read-compatible only; it is
//! never written here and entries found in it are upgraded by the cache.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use thiserror::Error;

/// File suffix of the primary compressed columnar format
pub const FEATHER_EXT: &str = "feather";

/// File suffix of the legacy row-oriented JSON format
pub const LEGACY_EXT: &str = "json";

/// Errors raised while reading, writing, or combining tables
#[derive(Debug, Error)]
pub enum TableError {
    /// Filesystem access failed
    #[error("table file access failed: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed
    #[error("table codec failed: {0}")]
    Codec(#[from] PolarsError),
}

/// Writes a table to `path` in the primary format (Arrow IPC, zstd).
pub fn write_feather(df: &mut DataFrame, path: &Path) -> Result<(), TableError> {
    let mut file = File::create(path)?;
    IpcWriter::new(&mut file)
        .with_compression(Some(IpcCompression::ZSTD))
        .finish(df)?;
    Ok(())
}

/// Reads a table from a primary-format file.
pub fn read_feather(path: &Path) -> Result<DataFrame, TableError> {
    let file = File::open(path)?;
    let df = IpcReader::new(file).finish()?;
    Ok(df)
}

/// Reads a table from a legacy-format file (a JSON array of row objects).
pub fn read_legacy_json(path: &Path) -> Result<DataFrame, TableError> {
    let file = File::open(path)?;
    let df = JsonReader::new(file)
        .with_json_format(JsonFormat::Json)
        .finish()?;
    Ok(df)
}

/// Concatenates tables row-wise, preserving input order.
///
/// Empty tables contribute no rows but the first table's schema is kept, so
/// an all-empty batch still yields a correctly shaped empty table. An empty
/// input sequence yields a table with no columns.
pub fn concat(frames: Vec<DataFrame>) -> Result<DataFrame, TableError> {
    let mut combined: Option<DataFrame> = None;

    for df in frames {
        match combined.as_mut() {
            None => combined = Some(df),
            Some(acc) => {
                if df.height() > 0 {
                    acc.vstack_mut(&df)?;
                }
            }
        }
    }

    Ok(combined.unwrap_or_else(DataFrame::empty))
}

/// Extracts the non-null values of a string column, in row order.
pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<String>, TableError> {
    let values = df
        .column(name)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_frame() -> DataFrame {
        let ts_code = Column::new("ts_code".into(), ["IF2409.CFX", "IC2409.CFX"]);
        let close = Column::new("close".into(), [3421.6, 4988.2]);
        DataFrame::new(vec![ts_code, close]).expect("valid sample frame")
    }

    #[test]
    fn test_feather_roundtrip_preserves_table() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("sample.feather");

        let mut df = sample_frame();
        write_feather(&mut df, &path).expect("write should succeed");
        let read_back = read_feather(&path).expect("read should succeed");

        assert!(read_back.equals(&sample_frame()));
    }

    #[test]
    fn test_read_feather_missing_file_is_io_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("absent.feather");

        let result = read_feather(&path);

        assert!(matches!(result, Err(TableError::Io(_))));
    }

    #[test]
    fn test_read_feather_corrupt_file_is_codec_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("corrupt.feather");
        std::fs::write(&path, b"not an arrow file").expect("write garbage");

        let result = read_feather(&path);

        assert!(matches!(result, Err(TableError::Codec(_))));
    }

    #[test]
    fn test_read_legacy_json_array_of_rows() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"[{"ts_code":"IF2409.CFX","close":3421.6},{"ts_code":"IC2409.CFX","close":4988.2}]"#,
        )
        .expect("write legacy file");

        let df = read_legacy_json(&path).expect("read should succeed");

        assert_eq!(df.height(), 2);
        assert_eq!(
            df.column("ts_code").unwrap().str().unwrap().get(0),
            Some("IF2409.CFX")
        );
    }

    #[test]
    fn test_concat_preserves_input_order() {
        let first = DataFrame::new(vec![Column::new("ts_code".into(), ["A.CFX"])]).unwrap();
        let second = DataFrame::new(vec![Column::new("ts_code".into(), ["B.CFX"])]).unwrap();
        let third = DataFrame::new(vec![Column::new("ts_code".into(), ["C.CFX"])]).unwrap();

        let combined = concat(vec![first, second, third]).expect("concat should succeed");

        assert_eq!(combined.height(), 3);
        let codes = column_values(&combined, "ts_code").unwrap();
        assert_eq!(codes, vec!["A.CFX", "B.CFX", "C.CFX"]);
    }

    #[test]
    fn test_concat_skips_empty_pages() {
        let empty = DataFrame::new(vec![Column::new(
            "ts_code".into(),
            Vec::<String>::new(),
        )])
        .unwrap();
        let page = DataFrame::new(vec![Column::new("ts_code".into(), ["A.CFX"])]).unwrap();

        let combined = concat(vec![empty, page]).expect("concat should succeed");

        assert_eq!(combined.height(), 1);
    }

    #[test]
    fn test_concat_of_all_empty_pages_keeps_schema() {
        let pages: Vec<DataFrame> = (0..3)
            .map(|_| {
                DataFrame::new(vec![Column::new("ts_code".into(), Vec::<String>::new())])
                    .unwrap()
            })
            .collect();

        let combined = concat(pages).expect("concat should succeed");

        assert_eq!(combined.shape(), (0, 1));
        assert_eq!(combined.get_column_names()[0].as_str(), "ts_code");
    }

    #[test]
    fn test_concat_of_nothing_is_empty() {
        let combined = concat(Vec::new()).expect("concat should succeed");
        assert_eq!(combined.height(), 0);
    }

    #[test]
    fn test_column_values_skips_nulls() {
        let codes = Column::new("ts_code".into(), [Some("A.CFX"), None, Some("B.CFX")]);
        let df = DataFrame::new(vec![codes]).unwrap();

        let values = column_values(&df, "ts_code").unwrap();

        assert_eq!(values, vec!["A.CFX", "B.CFX"]);
    }

    #[test]
    fn test_column_values_unknown_column_is_error() {
        let df = sample_frame();
        assert!(column_values(&df, "missing").is_err());
    }
}
