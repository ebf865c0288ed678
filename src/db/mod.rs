//! L12 (database half): `FiaDatabase` is the opaque handle callers hold
//! across requests. It owns the table-access backend, the reference catalogs,
//! engine configuration, and the stratum cache, and decodes every base
//! table into its typed row shape exactly once at open time. Everything
//! above it (the `estimator` orchestrator functions) borrows from here
//! rather than touching a `Backend` directly.

use std::path::Path;

use crate::cache::{StratumCache, StratumTables};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::reference::{
    DefaultForestTypeCatalog, DefaultSpeciesCatalog, ForestTypeCatalog, SpeciesCatalog,
};
use crate::table::schema::{
    BeginEnd, Cond, GrmBegin, GrmComponent, GrmMidpt, Plot, PopEstnUnit, PopEval, PopEvalTyp,
    PopStratum, Ppsa, SubpCondChngMtrx, Tree,
};
use crate::table::{decode, Backend, TableName};

/// Every base table decoded once at open time. `TREE_GRM_*` and
/// `SUBP_COND_CHNG_MTRX` are loaded unconditionally even though a request
/// that never touches GRM/area-change never reads them -- the tables a
/// real FIADB extract ships are small enough that this costs less than
/// the bookkeeping of loading them lazily per estimator.
struct LoadedTables {
    plot: Vec<Plot>,
    cond: Vec<Cond>,
    tree: Vec<Tree>,
    pop_eval: Vec<PopEval>,
    pop_eval_typ: Vec<PopEvalTyp>,
    pop_estn_unit: Vec<PopEstnUnit>,
    pop_stratum: Vec<PopStratum>,
    ppsa: Vec<Ppsa>,
    grm_component: Vec<GrmComponent>,
    grm_begin: Vec<GrmBegin>,
    grm_midpt: Vec<GrmMidpt>,
    subp_cond_chng_mtrx: Vec<SubpCondChngMtrx>,
    begin_end: Vec<BeginEnd>,
}

fn load_all(backend: &dyn Backend) -> Result<LoadedTables> {
    Ok(LoadedTables {
        plot: decode::decode_plot(&backend.table(TableName::Plot)?)?,
        cond: decode::decode_cond(&backend.table(TableName::Cond)?)?,
        tree: decode::decode_tree(&backend.table(TableName::Tree)?)?,
        pop_eval: decode::decode_pop_eval(&backend.table(TableName::PopEval)?)?,
        pop_eval_typ: decode::decode_pop_eval_typ(&backend.table(TableName::PopEvalTyp)?)?,
        pop_estn_unit: decode::decode_pop_estn_unit(&backend.table(TableName::PopEstnUnit)?)?,
        pop_stratum: decode::decode_pop_stratum(&backend.table(TableName::PopStratum)?)?,
        ppsa: decode::decode_ppsa(&backend.table(TableName::PopPlotStratumAssgn)?)?,
        grm_component: decode::decode_grm_component(&backend.table(TableName::TreeGrmComponent)?)?,
        grm_begin: decode::decode_grm_begin(&backend.table(TableName::TreeGrmBegin)?)?,
        grm_midpt: decode::decode_grm_midpt(&backend.table(TableName::TreeGrmMidpt)?)?,
        subp_cond_chng_mtrx: decode::decode_subp_cond_chng_mtrx(
            &backend.table(TableName::SubpCondChngMtrx)?,
        )?,
        begin_end: decode::decode_begin_end(&backend.table(TableName::BeginEnd)?)?,
    })
}

/// An open FIA population database: a resolved set of decoded base
/// tables plus the long-lived collaborators (reference catalogs, cache,
/// config) every estimator call needs. Construct once per database and
/// reuse across requests -- that's what makes the stratum cache useful.
pub struct FiaDatabase {
    tables: LoadedTables,
    pub species: Box<dyn SpeciesCatalog>,
    pub forest_types: Box<dyn ForestTypeCatalog>,
    pub config: EngineConfig,
    cache: StratumCache,
}

impl FiaDatabase {
    /// Opens `path` with the default reference catalogs and engine
    /// configuration, auto-detecting the backend from the path.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, EngineConfig::default())
    }

    /// Opens `path` with a caller-supplied `EngineConfig`, still using
    /// the crate's embedded default reference catalogs.
    pub fn open_with(path: &Path, config: EngineConfig) -> Result<Self> {
        tracing::info!(path = %path.display(), "opening FIA database");
        let backend = crate::table::auto_detect(path)?;
        Self::from_backend(
            backend,
            Box::new(DefaultSpeciesCatalog::default()),
            Box::new(DefaultForestTypeCatalog::default()),
            config,
        )
    }

    /// Builds a database handle directly from an already-open `Backend`
    /// and caller-supplied catalogs. The entry point test fixtures and
    /// callers with external `REF_SPECIES`/`REF_FOREST_TYPE` tables use.
    pub fn from_backend(
        backend: Box<dyn Backend>,
        species: Box<dyn SpeciesCatalog>,
        forest_types: Box<dyn ForestTypeCatalog>,
        config: EngineConfig,
    ) -> Result<Self> {
        let tables = load_all(backend.as_ref())?;
        tracing::info!(
            plots = tables.plot.len(),
            conditions = tables.cond.len(),
            trees = tables.tree.len(),
            "base tables decoded"
        );
        Ok(Self { tables, species, forest_types, config, cache: StratumCache::new() })
    }

    pub fn pop_eval(&self) -> &[PopEval] {
        &self.tables.pop_eval
    }

    pub fn pop_eval_typ(&self) -> &[PopEvalTyp] {
        &self.tables.pop_eval_typ
    }

    pub fn plot(&self) -> &[Plot] {
        &self.tables.plot
    }

    pub fn cond(&self) -> &[Cond] {
        &self.tables.cond
    }

    pub fn tree(&self) -> &[Tree] {
        &self.tables.tree
    }

    pub fn grm_component(&self) -> &[GrmComponent] {
        &self.tables.grm_component
    }

    pub fn grm_begin(&self) -> &[GrmBegin] {
        &self.tables.grm_begin
    }

    pub fn grm_midpt(&self) -> &[GrmMidpt] {
        &self.tables.grm_midpt
    }

    pub fn subp_cond_chng_mtrx(&self) -> &[SubpCondChngMtrx] {
        &self.tables.subp_cond_chng_mtrx
    }

    /// The `BEGINEND` code/meaning reference table (see
    /// `table::schema::BeginEnd`'s doc comment for why this crate reads
    /// but never joins against it).
    pub fn begin_end(&self) -> &[BeginEnd] {
        &self.tables.begin_end
    }

    /// Returns (building and memoizing on a miss) the stratum tables and
    /// plot metadata for `evalid`. Honors
    /// `EngineConfig::cache_enabled` by bypassing the memo table
    /// entirely when the caller has disabled it, rather than threading
    /// that flag through `StratumCache` itself.
    pub fn stratum_tables(&self, evalid: u32) -> Result<std::sync::Arc<StratumTables>> {
        let build = || self.build_stratum_tables(evalid);
        if self.config.cache_enabled {
            self.cache.get_or_build(evalid, build)
        } else {
            Ok(std::sync::Arc::new(build()?))
        }
    }

    fn build_stratum_tables(&self, evalid: u32) -> Result<StratumTables> {
        let eval_cn = self
            .tables
            .pop_eval
            .iter()
            .find(|e| e.evalid == evalid)
            .map(|e| e.cn);

        let estn_unit: Vec<PopEstnUnit> = match eval_cn {
            Some(cn) => self
                .tables
                .pop_estn_unit
                .iter()
                .filter(|u| u.eval_cn == cn)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        let estn_unit_cns: std::collections::HashSet<i64> =
            estn_unit.iter().map(|u| u.cn).collect();
        let stratum: Vec<PopStratum> = self
            .tables
            .pop_stratum
            .iter()
            .filter(|s| estn_unit_cns.contains(&s.estn_unit_cn))
            .cloned()
            .collect();
        let ppsa: Vec<Ppsa> = self
            .tables
            .ppsa
            .iter()
            .filter(|a| a.evalid == evalid)
            .cloned()
            .collect();

        let plot_meta = crate::join::plot_meta(&ppsa, &stratum, &estn_unit, evalid)?;

        Ok(StratumTables { stratum, estn_unit, ppsa, plot_meta })
    }
}
