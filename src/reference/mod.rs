//! L1: immutable reference catalogs (species, forest-type groups, state
//! codes, stocking classes).
//!
//! The engine never re-derives these from raw data; they are treated as
//! closed, version-stamped lookup tables owned by an external collaborator
//! in production (the real FIADB `REF_SPECIES` / `REF_FOREST_TYPE` tables).
//! This module defines the trait seam plus a small embedded default good
//! enough to drive the engine's own tests.

mod forest_type;
mod species;
mod state_codes;

pub use forest_type::{DefaultForestTypeCatalog, ForestTypeCatalog, ForestTypeGroup};
pub use species::{DefaultSpeciesCatalog, SpeciesCatalog, SpeciesRecord};
pub use state_codes::{state_abbr, state_fips};
