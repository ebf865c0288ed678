//! Columnar backend: one Parquet file per table, read lazily through
//! Polars. This is the preferred backend -- scans push
//! column projection down to the file reader, and a plan is only
//! materialized at `table`'s final `.collect()`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use polars::prelude::{DataFrame, LazyFrame, ScanArgsParquet};

use crate::error::{EstimationError, Result};
use crate::table::backend::{validate_schema, Backend};
use crate::table::schema::TableName;

pub struct ColumnarBackend {
    root: Option<PathBuf>,
    frames: HashMap<&'static str, DataFrame>,
}

impl ColumnarBackend {
    /// Opens a directory of `<TABLE_NAME>.parquet` files.
    pub fn open(root: &Path) -> Result<Self> {
        Ok(Self {
            root: Some(root.to_path_buf()),
            frames: HashMap::new(),
        })
    }

    /// Builds a backend directly from in-memory frames, one per table.
    /// Used by test fixtures and by callers who already hold Polars
    /// frames (e.g. loaded from a data lake) and want to skip the file
    /// round-trip entirely.
    pub fn from_frames(frames: HashMap<&'static str, DataFrame>) -> Self {
        Self { root: None, frames }
    }

    fn scan(&self, name: TableName) -> Result<LazyFrame> {
        if let Some(df) = self.frames.get(name.as_str()) {
            return Ok(df.clone().lazy());
        }
        let root = self.root.as_ref().ok_or_else(|| EstimationError::Schema {
            table: name.as_str().to_string(),
            detail: "backend has neither a root directory nor an in-memory frame".into(),
        })?;
        let path = root.join(format!("{}.parquet", name.as_str()));
        LazyFrame::scan_parquet(&path, ScanArgsParquet::default()).map_err(EstimationError::from)
    }
}

impl Backend for ColumnarBackend {
    fn table(&self, name: TableName) -> Result<DataFrame> {
        let df = self.scan(name)?.collect()?;
        validate_schema(name, &df)?;
        Ok(df)
    }
}
