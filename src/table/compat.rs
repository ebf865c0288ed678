//! Compatibility backend: a FIADB SQLite extract read row-by-row through
//! `rusqlite` and assembled into `DataFrame`s. Slower than the columnar
//! backend and loads a whole table into memory at once, but lets callers
//! point the engine at the SQLite snapshots FIA commonly distributes.

use std::path::Path;

use polars::prelude::{DataFrame, DataType, NamedFrom, Series};
use rusqlite::{types::ValueRef, Connection};

use crate::error::{EstimationError, Result};
use crate::table::backend::{validate_schema, Backend};
use crate::table::schema::TableName;

pub struct CompatBackend {
    conn: Connection,
}

impl CompatBackend {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Wraps an already-open connection. Used by callers (and tests) that
    /// populate the schema themselves rather than pointing at a file FIA
    /// shipped -- `CompatBackend::in_memory` plus hand-written DDL is the
    /// common case.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Backend for CompatBackend {
    fn table(&self, name: TableName) -> Result<DataFrame> {
        let columns = name.required_columns();
        let column_list = columns
            .iter()
            .map(|(c, _)| *c)
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!("SELECT {column_list} FROM {}", name.as_str());

        let mut stmt = self.conn.prepare(&query).map_err(|e| EstimationError::DataError {
            table: name.as_str().to_string(),
            key: "<query>".into(),
            detail: e.to_string(),
        })?;

        let mut int_cols: Vec<Vec<Option<i64>>> = vec![Vec::new(); columns.len()];
        let mut float_cols: Vec<Vec<Option<f64>>> = vec![Vec::new(); columns.len()];
        let mut str_cols: Vec<Vec<Option<String>>> = vec![Vec::new(); columns.len()];

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (i, (_, dtype)) in columns.iter().enumerate() {
                let value_ref = row.get_ref(i)?;
                match dtype {
                    DataType::Int64 | DataType::UInt32 => {
                        int_cols[i].push(value_as_i64(value_ref));
                    }
                    DataType::Float64 => {
                        float_cols[i].push(value_as_f64(value_ref));
                    }
                    DataType::Utf8 => {
                        str_cols[i].push(value_as_string(value_ref));
                    }
                    other => {
                        return Err(EstimationError::Schema {
                            table: name.as_str().to_string(),
                            detail: format!("unsupported compat column type {other:?}"),
                        })
                    }
                }
            }
        }

        let mut series = Vec::with_capacity(columns.len());
        for (i, (col_name, dtype)) in columns.iter().enumerate() {
            let s = match dtype {
                DataType::Int64 | DataType::UInt32 => {
                    Series::new((*col_name).into(), std::mem::take(&mut int_cols[i]))
                }
                DataType::Float64 => {
                    Series::new((*col_name).into(), std::mem::take(&mut float_cols[i]))
                }
                DataType::Utf8 => {
                    Series::new((*col_name).into(), std::mem::take(&mut str_cols[i]))
                }
                _ => unreachable!(),
            };
            series.push(s);
        }

        let df = DataFrame::new(series)?;
        validate_schema(name, &df)?;
        Ok(df)
    }
}

fn value_as_i64(v: ValueRef<'_>) -> Option<i64> {
    match v {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) => Some(f as i64),
        _ => None,
    }
}

fn value_as_f64(v: ValueRef<'_>) -> Option<f64> {
    match v {
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        _ => None,
    }
}

fn value_as_string(v: ValueRef<'_>) -> Option<String> {
    match v {
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        _ => None,
    }
}
