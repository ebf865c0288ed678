use thiserror::Error;

/// Errors surfaced by the estimation engine.
///
/// Configuration and data errors (tiers 1-2 of the error handling design)
/// are represented as variants here and fail the request outright.
/// Numeric degeneracies (tier 3 -- empty domains, zero-plot strata, zero
/// denominators) never produce an `EstimationError`; they show up as
/// `None` fields on a `ResultRow` plus an entry in `ResultFrame::warnings`
/// instead.
#[derive(Error, Debug)]
pub enum EstimationError {
    /// No evaluation matched the requested selector.
    #[error("no evaluation matched selector for state(s) {states:?}, type {eval_type}")]
    NoMatchingEvaluation { states: Vec<String>, eval_type: String },

    /// Two evaluations in a resolved set share a (state, type) key.
    #[error("inconsistent evaluation set: state {state} type {eval_type} has evalids {evalids:?}")]
    InconsistentEvaluation {
        state: String,
        eval_type: String,
        evalids: Vec<u32>,
    },

    /// A required table or column is missing at open time.
    #[error("schema error in table {table}: {detail}")]
    Schema { table: String, detail: String },

    /// A predicate string referenced a column that doesn't exist on its entity.
    #[error("unknown column '{column}' on {entity}")]
    UnknownColumn { entity: String, column: String },

    /// A predicate string failed to parse.
    #[error("could not parse predicate '{expression}': {detail}")]
    FilterParseError { expression: String, detail: String },

    /// A predicate compared values of incompatible types.
    #[error("type mismatch in predicate '{expression}': {detail}")]
    TypeMismatch { expression: String, detail: String },

    /// A request was refused before any data movement because of a
    /// request-shape problem (e.g. an unsupported backend).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A data-level referential integrity problem discovered while
    /// warming a cache (e.g. a GRM component with no matching begin/midpt).
    #[error("data error in table {table} (key {key}): {detail}")]
    DataError {
        table: String,
        key: String,
        detail: String,
    },

    /// Not enough plots/strata to support the requested computation.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A numeric operation failed outright (not a degeneracy with a
    /// well-defined null result, but a genuine computation failure).
    #[error("numeric error: {0}")]
    NumericError(String),

    /// Error surfaced by the columnar (Polars) backend.
    #[error("columnar backend error: {0}")]
    Columnar(#[from] polars::prelude::PolarsError),

    /// Error surfaced by the compatibility (SQLite) backend.
    #[error("compatibility backend error: {0}")]
    Compat(#[from] rusqlite::Error),

    /// Error surfaced while parsing an `EngineConfig` from TOML.
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EstimationError>;
