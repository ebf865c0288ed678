//! Design-based statistical estimation over FIA (Forest Inventory and
//! Analysis) population data: post-stratified ratio-of-means estimates
//! of area, trees-per-acre, volume, biomass, carbon, and
//! growth/removal/mortality, with variance, per Bechtold & Patterson
//! (2005).
//!
//! This crate is a library. It has no CLI, performs no downloads or
//! ingestion, and does not format output for display -- those are the
//! caller's concern (see DESIGN.md for the full list of non-goals).

pub mod adjust;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod estimate;
pub mod estimator;
pub mod eval;
pub mod filter;
pub mod grm;
pub mod join;
pub mod output;
pub mod reference;
pub mod table;
pub mod value;

pub use config::EngineConfig;
pub use db::FiaDatabase;
pub use error::{EstimationError, Result};
pub use estimator::{Estimator, RequestBase};
