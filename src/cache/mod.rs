//! L11: caching fabric. Stratum tables and the plot-to-stratum metadata
//! they imply are expensive to rebuild (they require decoding and
//! joining several tables) and are read identically by every request
//! against the same evaluation set, so they are memoized here keyed on
//! `EVALID`, per spec.md §2/§3.3/§5.
//!
//! Insertion is single-writer: a cache miss computes its value without
//! holding any lock, then takes the write lock only to insert; if
//! another thread already inserted the same key in the meantime (a
//! race on a first-of-its-kind evaluation set, per spec.md §5), the
//! loser's duplicate `Arc` is simply dropped rather than overwriting the
//! winner's. Readers only ever take a read lock and never block behind
//! another reader's compute.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::join::PlotMeta;
use crate::table::schema::{PopEstnUnit, PopStratum, Ppsa};

/// The per-evaluation tables L6's join planner needs, built once and
/// shared by every request against the same `EVALID`.
#[derive(Debug)]
pub struct StratumTables {
    pub stratum: Vec<PopStratum>,
    pub estn_unit: Vec<PopEstnUnit>,
    pub ppsa: Vec<Ppsa>,
    pub plot_meta: HashMap<i64, PlotMeta>,
}

/// Read-mostly memoization of `StratumTables`, keyed by `EVALID`. An
/// opaque handle (spec.md §9's "represent as an opaque handle passed
/// from database-open") owned by `db::FiaDatabase`; there is no free-
/// floating process-wide singleton.
#[derive(Default)]
pub struct StratumCache {
    entries: RwLock<HashMap<u32, Arc<StratumTables>>>,
}

impl StratumCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached `StratumTables` for `evalid`, computing it with
    /// `build` on a miss. `build` runs without holding any lock; a
    /// concurrent miss on the same key may compute redundantly, but only
    /// one result is kept (spec.md §5's single-writer/loser-discards
    /// policy).
    pub fn get_or_build(
        &self,
        evalid: u32,
        build: impl FnOnce() -> Result<StratumTables>,
    ) -> Result<Arc<StratumTables>> {
        if let Some(hit) = self.entries.read().unwrap().get(&evalid) {
            tracing::debug!(evalid, "stratum cache hit");
            return Ok(Arc::clone(hit));
        }

        tracing::debug!(evalid, "stratum cache miss, building");
        let built = Arc::new(build()?);

        let mut entries = self.entries.write().unwrap();
        let winner = entries.entry(evalid).or_insert_with(|| Arc::clone(&built));
        Ok(Arc::clone(winner))
    }

    /// Number of evaluation sets currently memoized. Exposed for tests
    /// and for a caller wanting to report cache occupancy; not used by
    /// the engine itself.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every memoized entry. A caller reopening against a changed
    /// database should construct a fresh `FiaDatabase` rather than call
    /// this -- it exists for long-lived test harnesses that reuse one
    /// cache across database fixtures.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}
