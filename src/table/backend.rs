//! Table access seam: two backends, one trait. The
//! "columnar analytical engine" (Polars) is preferred; the "compatibility
//! engine" (SQLite via rusqlite) is accepted for callers who only have a
//! FIADB SQLite extract on disk. Auto-detection picks between them by
//! file extension.

use std::path::Path;

use polars::prelude::DataFrame;

use crate::error::{EstimationError, Result};
use crate::table::compat::CompatBackend;
use crate::table::schema::TableName;

/// A source of the tables named in `TableName`. Implementors own however
/// the bytes get turned into a `DataFrame`; everything above L2 only ever
/// calls `table`.
pub trait Backend: Send + Sync {
    /// Materialize a table as a `DataFrame`. Implementations validate the
    /// required columns (`TableName::required_columns`) before returning,
    /// surfacing a `Schema` error rather than failing later at a
    /// confusing point in the pipeline.
    fn table(&self, name: TableName) -> Result<DataFrame>;
}

/// Checks a materialized `DataFrame` against the column requirements for
/// `name`, used by every `Backend` implementation at the end of `table`.
pub fn validate_schema(name: TableName, df: &DataFrame) -> Result<()> {
    for (column, expected_dtype) in name.required_columns() {
        let series = df.column(column).map_err(|_| EstimationError::Schema {
            table: name.as_str().to_string(),
            detail: format!("missing required column '{column}'"),
        })?;
        let actual = series.dtype();
        if !dtype_compatible(actual, expected_dtype) {
            return Err(EstimationError::Schema {
                table: name.as_str().to_string(),
                detail: format!(
                    "column '{column}' has type {actual:?}, expected {expected_dtype:?}"
                ),
            });
        }
    }
    Ok(())
}

/// Integer/float width differences from how a backend happens to store a
/// column are not schema errors; only family mismatches are.
fn dtype_compatible(actual: &polars::prelude::DataType, expected: &polars::prelude::DataType) -> bool {
    use polars::prelude::DataType::*;
    matches!(
        (actual, expected),
        (Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 | UInt64, Int64 | UInt32)
            | (Float32 | Float64, Float64)
            | (Utf8 | String, Utf8)
    )
}

/// Opens the table source at `path`, choosing the columnar backend for a
/// directory of per-table files and the compatibility backend for a
/// single SQLite file.
pub fn auto_detect(path: &Path) -> Result<Box<dyn Backend>> {
    if path.is_dir() {
        Ok(Box::new(crate::table::columnar::ColumnarBackend::open(path)?))
    } else {
        match path.extension().and_then(|e| e.to_str()) {
            Some("sqlite") | Some("db") | Some("sqlite3") => {
                Ok(Box::new(CompatBackend::open(path)?))
            }
            Some("parquet") | Some("ipc") | Some("arrow") => Err(EstimationError::Configuration(
                "a single parquet/ipc file is not a table source; pass the containing directory"
                    .into(),
            )),
            other => Err(EstimationError::Configuration(format!(
                "cannot determine backend for path with extension {other:?}"
            ))),
        }
    }
}
