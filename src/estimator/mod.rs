//! L12 (orchestrator half): one entry point per estimator family named in
//! spec.md §6.3, each driving the `Configured -> EvaluationResolved ->
//! TablesLoaded -> Joined -> Valued -> PlotAggregated -> Stratified ->
//! PopulationEstimated -> Formatted` pipeline of spec.md §4.7 across
//! L3-L11. `Estimator` is a thin wrapper over a `&FiaDatabase`, in the
//! same spirit as the teacher's own `Analyzer<'a>`: one method per
//! analysis, no state of its own.

use std::collections::HashMap;

use crate::db::FiaDatabase;
use crate::error::Result;
use crate::eval::{EvalType, ResolvedEvaluation, Selector};
use crate::filter::{self, CompiledFilter, Entity, LandType, TreeType};
use crate::grm::area_change::ChangeType;
use crate::grm::{self, Measure};
use crate::join::{JoinedCondRow, JoinedTreeRow, PlotMeta};
use crate::output::{self, GroupBy, Groupable, ResultFrame, ValuedRow};
use crate::value::{self, BiomassComponent, RowValue, VolType};

/// The request shape shared by every estimator family: which plots to
/// consider (resolved per-family to the matching `EvalType`), which
/// domain to restrict to, and how to shape the result. Per-family flags
/// (measure, component, volume type, ...) are separate arguments on each
/// method rather than optional fields here, so a caller can't set, say,
/// `vol_type` on an `area()` call.
#[derive(Debug, Clone)]
pub struct RequestBase {
    pub states: Vec<u32>,
    pub selector: Selector,
    pub tree_domain: Option<String>,
    pub area_domain: Option<String>,
    pub land_type: LandType,
    pub tree_type: TreeType,
    pub group_by: Vec<GroupBy>,
    /// `true` reports a population total; `false` reports the per-acre
    /// ratio against forest area in the same land-type domain. Ignored
    /// by `site_index`, which is always a ratio (ratios are all site
    /// index is meaningful as), and by `area`, which is always a total.
    pub totals: bool,
}

impl RequestBase {
    pub fn new(states: Vec<u32>, selector: Selector) -> Self {
        Self {
            states,
            selector,
            tree_domain: None,
            area_domain: None,
            land_type: LandType::All,
            tree_type: TreeType::All,
            group_by: Vec::new(),
            totals: false,
        }
    }
}

/// The joined rows and plot metadata for one resolved evaluation family,
/// merged across every (state, evalid) pair the request's selector
/// matched. `year` is the greatest `END_INVYR` among them -- the single
/// value a flat result frame has room to report.
struct JoinedData {
    tree_rows: Vec<JoinedTreeRow>,
    cond_rows: Vec<JoinedCondRow>,
    plot_meta: HashMap<i64, PlotMeta>,
    year: u32,
}

/// Orchestrates one estimator call against an already-open database.
/// Holds no state beyond the borrow; safe to construct fresh per call.
pub struct Estimator<'a> {
    db: &'a FiaDatabase,
}

impl<'a> Estimator<'a> {
    pub fn new(db: &'a FiaDatabase) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, req), fields(states = ?req.states))]
    fn resolve_and_join(&self, req: &RequestBase, eval_type: EvalType) -> Result<JoinedData> {
        let set = crate::eval::resolve(
            self.db.pop_eval(),
            self.db.pop_eval_typ(),
            &req.states,
            eval_type,
            &req.selector,
        )?;
        tracing::debug!(evaluations = set.evaluations.len(), "evaluation set resolved");

        let mut tree_rows = Vec::new();
        let mut cond_rows = Vec::new();
        let mut plot_meta = HashMap::new();
        let mut year = 0u32;

        for e in &set.evaluations {
            let ResolvedEvaluation { evalid, end_invyr, .. } = *e;
            let tables = self.db.stratum_tables(evalid)?;
            let rows = crate::join::build_tree_rows(
                self.db.tree(),
                self.db.cond(),
                self.db.plot(),
                &tables.ppsa,
                &tables.stratum,
                &tables.estn_unit,
                evalid,
            )?;
            tree_rows.extend(rows);
            let crows = crate::join::build_cond_rows(
                self.db.cond(),
                &tables.ppsa,
                &tables.stratum,
                &tables.estn_unit,
                evalid,
            )?;
            cond_rows.extend(crows);
            plot_meta.extend(tables.plot_meta.iter().map(|(k, v)| (*k, v.clone())));
            year = year.max(end_invyr);
        }

        Ok(JoinedData { tree_rows, cond_rows, plot_meta, year })
    }

    fn compile_domain(input: Option<&str>, entity: Entity) -> Result<Option<CompiledFilter>> {
        input.map(|s| filter::compile(s, entity)).transpose()
    }

    /// Numerator-only contribution: what tree-level value calculators
    /// (`tpa_value`, `volume_value`, `biomass_value`) already produce
    /// (their own `denominator` field is a same-row placeholder, unused
    /// in a per-acre request -- see `value::tpa_value`).
    fn as_numerator(v: RowValue) -> RowValue {
        RowValue { plt_cn: v.plt_cn, numerator: v.numerator, denominator: 0.0 }
    }

    /// Denominator-only contribution: an `area_value` row's numerator
    /// (the forest acreage of the land-type domain) repurposed as this
    /// row's contribution to the ratio's `X`.
    fn as_denominator(v: RowValue) -> RowValue {
        RowValue { plt_cn: v.plt_cn, numerator: 0.0, denominator: v.numerator }
    }

    /// The per-acre forest-area denominator rows for a tree-based
    /// estimator: `land_type`/`area_domain` only, no tree-level
    /// restriction, matching FIA convention that a per-acre tree measure
    /// is always divided by the area of its land-type domain rather than
    /// by the narrower tree/area-domain intersection.
    fn area_denominator_rows(
        cond_rows: &[JoinedCondRow],
        land_mask: &crate::filter::Expr,
        area_domain: Option<&CompiledFilter>,
    ) -> Vec<RowValue> {
        cond_rows
            .iter()
            .map(|row| {
                let indicator = value::cond_domain_indicator(row, land_mask, area_domain);
                Self::as_denominator(value::area_value(row, indicator, false))
            })
            .collect()
    }

    fn tree_group_columns(group_by: &[GroupBy]) -> Vec<String> {
        group_by
            .iter()
            .map(|g| match g {
                GroupBy::Column(name) => name.clone(),
                GroupBy::BySpecies => "SPCD".to_string(),
                GroupBy::BySizeClass(_) => "SIZE_CLASS".to_string(),
                GroupBy::ByForestTypeGroup => "FOREST_TYPE_GROUP".to_string(),
            })
            .collect()
    }

    fn tree_group_key(
        &self,
        row: &JoinedTreeRow,
        group_by: &[GroupBy],
    ) -> Option<Vec<output::GroupValue>> {
        group_by
            .iter()
            .map(|g| row.group_value(g, self.db.forest_types.as_ref()))
            .collect::<Option<Vec<_>>>()
    }

    fn cond_group_key(
        &self,
        row: &JoinedCondRow,
        group_by: &[GroupBy],
    ) -> Option<Vec<output::GroupValue>> {
        group_by
            .iter()
            .map(|g| row.group_value(g, self.db.forest_types.as_ref()))
            .collect::<Option<Vec<_>>>()
    }

    /// Trees-per-acre, or basal-area-per-acre when `basal_area` is set.
    pub fn tpa(&self, req: &RequestBase, basal_area: bool) -> Result<ResultFrame> {
        let data = self.resolve_and_join(req, EvalType::Volume)?;
        let land_mask = filter::land_type_expr(req.land_type);
        let area_domain = Self::compile_domain(req.area_domain.as_deref(), Entity::Cond)?;
        let tree_domain = Self::compile_domain(req.tree_domain.as_deref(), Entity::Tree)?;

        let mut valued = Vec::new();
        for row in &data.tree_rows {
            let Some(group) = self.tree_group_key(row, &req.group_by) else { continue };
            let tree_type_mask =
                filter::tree_type_expr(req.tree_type, self.db.species.as_ref(), Some(row.spcd));
            let indicator = value::tree_domain_indicator(
                row,
                &land_mask,
                area_domain.as_ref(),
                &tree_type_mask,
                tree_domain.as_ref(),
            );
            let v = value::tpa_value(row, indicator, basal_area);
            valued.push(ValuedRow {
                group,
                plt_cn: row.plt_cn,
                condid: Some(row.condid),
                value: if req.totals { v } else { Self::as_numerator(v) },
            });
        }

        if !req.totals {
            // Denominator rows carry no group key of their own; broadcast
            // them into every group actually present so each group's ratio
            // divides by the same forest-area total (spec.md §4.6's shared
            // per-acre denominator), not by a group-specific subset.
            let groups: std::collections::HashSet<Vec<output::GroupValue>> =
                valued.iter().map(|v| v.group.clone()).collect();
            for d in Self::area_denominator_rows(&data.cond_rows, &land_mask, area_domain.as_ref())
            {
                for group in &groups {
                    valued.push(ValuedRow {
                        group: group.clone(),
                        plt_cn: d.plt_cn,
                        condid: None,
                        value: d,
                    });
                }
            }
        }

        output::group_and_estimate(
            Self::tree_group_columns(&req.group_by),
            &valued,
            &data.plot_meta,
            !req.totals,
            if basal_area { "BASAL_AREA_PER_ACRE" } else { "TPA" },
            data.year,
        )
    }

    pub fn volume(&self, req: &RequestBase, vol_type: VolType) -> Result<ResultFrame> {
        self.tree_measure(req, "VOLUME", move |row, indicator| {
            value::volume_value(row, indicator, vol_type)
        })
    }

    pub fn biomass(
        &self,
        req: &RequestBase,
        component: BiomassComponent,
        carbon: bool,
    ) -> Result<ResultFrame> {
        if !component.is_supported() {
            return Err(crate::error::EstimationError::InsufficientData(format!(
                "{component:?} is not a compartment this engine's base tables carry a column \
                 for (only AboveGround/BelowGround/Total are computable from DRYBIO_*/CARBON_*)"
            )));
        }
        self.tree_measure(req, if carbon { "CARBON" } else { "BIOMASS" }, move |row, indicator| {
            value::biomass_value(row, indicator, component, carbon)
        })
    }

    /// Shared plumbing for `volume`/`biomass`: both are a tree-level
    /// value calculator summed per-acre against forest area, differing
    /// only in which `RowValue` the calculator produces.
    fn tree_measure(
        &self,
        req: &RequestBase,
        value_column: &'static str,
        calc: impl Fn(&JoinedTreeRow, f64) -> RowValue,
    ) -> Result<ResultFrame> {
        let data = self.resolve_and_join(req, EvalType::Volume)?;
        let land_mask = filter::land_type_expr(req.land_type);
        let area_domain = Self::compile_domain(req.area_domain.as_deref(), Entity::Cond)?;
        let tree_domain = Self::compile_domain(req.tree_domain.as_deref(), Entity::Tree)?;

        let mut valued = Vec::new();
        for row in &data.tree_rows {
            let Some(group) = self.tree_group_key(row, &req.group_by) else { continue };
            let tree_type_mask =
                filter::tree_type_expr(req.tree_type, self.db.species.as_ref(), Some(row.spcd));
            let indicator = value::tree_domain_indicator(
                row,
                &land_mask,
                area_domain.as_ref(),
                &tree_type_mask,
                tree_domain.as_ref(),
            );
            let v = calc(row, indicator);
            valued.push(ValuedRow {
                group,
                plt_cn: row.plt_cn,
                condid: Some(row.condid),
                value: if req.totals { v } else { Self::as_numerator(v) },
            });
        }

        if !req.totals {
            let groups: std::collections::HashSet<Vec<output::GroupValue>> =
                valued.iter().map(|v| v.group.clone()).collect();
            for d in Self::area_denominator_rows(&data.cond_rows, &land_mask, area_domain.as_ref())
            {
                for group in &groups {
                    valued.push(ValuedRow {
                        group: group.clone(),
                        plt_cn: d.plt_cn,
                        condid: None,
                        value: d,
                    });
                }
            }
        }

        output::group_and_estimate(
            Self::tree_group_columns(&req.group_by),
            &valued,
            &data.plot_meta,
            !req.totals,
            value_column,
            data.year,
        )
    }

    /// Domain acres of `req`'s land-type/area-domain restriction. Always
    /// a total (`totals` is not consulted -- "area" has no other
    /// meaningful per-acre form).
    pub fn area(&self, req: &RequestBase) -> Result<ResultFrame> {
        let data = self.resolve_and_join(req, EvalType::Area)?;
        let land_mask = filter::land_type_expr(req.land_type);
        let area_domain = Self::compile_domain(req.area_domain.as_deref(), Entity::Cond)?;

        let valued: Vec<ValuedRow> = data
            .cond_rows
            .iter()
            .filter_map(|row| {
                let group = self.cond_group_key(row, &req.group_by)?;
                let indicator = value::cond_domain_indicator(row, &land_mask, area_domain.as_ref());
                let v = value::area_value(row, indicator, false);
                Some(ValuedRow { group, plt_cn: row.plt_cn, condid: Some(row.condid), value: v })
            })
            .collect();

        output::group_and_estimate(
            Self::tree_group_columns(&req.group_by),
            &valued,
            &data.plot_meta,
            false,
            "AREA",
            data.year,
        )
    }

    /// Mean site index, always grouped by `SIBASE` in addition to any
    /// caller-requested group-by columns, since site index values from
    /// different base ages are not comparable (spec.md §4.6).
    pub fn site_index(&self, req: &RequestBase) -> Result<ResultFrame> {
        let data = self.resolve_and_join(req, EvalType::Volume)?;
        let land_mask = filter::land_type_expr(req.land_type);
        let area_domain = Self::compile_domain(req.area_domain.as_deref(), Entity::Cond)?;

        let mut group_by = req.group_by.clone();
        group_by.push(GroupBy::Column("SIBASE".to_string()));

        let valued: Vec<ValuedRow> = data
            .cond_rows
            .iter()
            .filter_map(|row| {
                let mut group = self.cond_group_key(row, &req.group_by)?;
                let indicator = value::cond_domain_indicator(row, &land_mask, area_domain.as_ref());
                let (sibase, v) = value::site_index_value(row, indicator)?;
                group.push(output::GroupValue::Num(sibase as i64));
                Some(ValuedRow { group, plt_cn: row.plt_cn, condid: Some(row.condid), value: v })
            })
            .collect();

        output::group_and_estimate(
            Self::tree_group_columns(&group_by),
            &valued,
            &data.plot_meta,
            true,
            "SITE_INDEX",
            data.year,
        )
    }

    /// Shared plumbing for the GRM-family estimators (`mortality`,
    /// `growth`, `removals`): resolve the matching evaluation, join
    /// `TREE_GRM_COMPONENT`/`_BEGIN`/`_MIDPT` by `TRE_CN`, and sum the
    /// requested `GrmContribution` field per-acre against forest area.
    /// `remper` is a scalar remeasurement period in years, supplied by
    /// the caller rather than derived from `POP_EVAL` -- this crate's
    /// `POP_EVAL` row carries only `END_INVYR`, not a begin year (see
    /// DESIGN.md).
    fn grm_measure(
        &self,
        req: &RequestBase,
        eval_type: EvalType,
        measure: Measure,
        remper: f64,
        value_column: &'static str,
        pick: impl Fn(grm::GrmContribution) -> f64,
    ) -> Result<ResultFrame> {
        let data = self.resolve_and_join(req, eval_type)?;
        let land_mask = filter::land_type_expr(req.land_type);
        let area_domain = Self::compile_domain(req.area_domain.as_deref(), Entity::Cond)?;
        let tree_domain = Self::compile_domain(req.tree_domain.as_deref(), Entity::Tree)?;

        let begin_by_tre: HashMap<i64, &crate::table::schema::GrmBegin> =
            self.db.grm_begin().iter().map(|b| (b.tre_cn, b)).collect();
        let midpt_by_tre: HashMap<i64, &crate::table::schema::GrmMidpt> =
            self.db.grm_midpt().iter().map(|m| (m.tre_cn, m)).collect();
        let trees_by_cn: HashMap<i64, &JoinedTreeRow> =
            data.tree_rows.iter().map(|r| (r.tre_cn, r)).collect();

        let mut valued = Vec::new();
        for component in self.db.grm_component() {
            let Some(row) = trees_by_cn.get(&component.tre_cn) else { continue };
            let Some(group) = self.tree_group_key(row, &req.group_by) else { continue };
            let tree_type_mask =
                filter::tree_type_expr(req.tree_type, self.db.species.as_ref(), Some(row.spcd));
            let indicator = value::tree_domain_indicator(
                row,
                &land_mask,
                area_domain.as_ref(),
                &tree_type_mask,
                tree_domain.as_ref(),
            );
            if indicator == 0.0 {
                continue;
            }
            let contribution = grm::contribution(
                component,
                begin_by_tre.get(&component.tre_cn).copied(),
                midpt_by_tre.get(&component.tre_cn).copied(),
                &row.stratum,
                measure,
                remper,
            );
            let numerator = indicator * pick(contribution);
            let v = RowValue { plt_cn: row.plt_cn, numerator, denominator: 0.0 };
            valued.push(ValuedRow { group, plt_cn: row.plt_cn, condid: Some(row.condid), value: v });
        }

        if !req.totals {
            let groups: std::collections::HashSet<Vec<output::GroupValue>> =
                valued.iter().map(|v| v.group.clone()).collect();
            for d in Self::area_denominator_rows(&data.cond_rows, &land_mask, area_domain.as_ref())
            {
                for group in &groups {
                    valued.push(ValuedRow {
                        group: group.clone(),
                        plt_cn: d.plt_cn,
                        condid: None,
                        value: d,
                    });
                }
            }
        }

        output::group_and_estimate(
            Self::tree_group_columns(&req.group_by),
            &valued,
            &data.plot_meta,
            !req.totals,
            value_column,
            data.year,
        )
    }

    pub fn mortality(&self, req: &RequestBase, measure: Measure, remper: f64) -> Result<ResultFrame> {
        self.grm_measure(req, EvalType::Mortality, measure, remper, "MORTALITY", |c| c.mortality)
    }

    pub fn growth(&self, req: &RequestBase, measure: Measure, remper: f64) -> Result<ResultFrame> {
        self.grm_measure(req, EvalType::Growth, measure, remper, "GROWTH", |c| c.growth)
    }

    pub fn removals(&self, req: &RequestBase, measure: Measure, remper: f64) -> Result<ResultFrame> {
        self.grm_measure(req, EvalType::Removal, measure, remper, "REMOVALS", |c| c.removals)
    }

    /// Annualized area change, per spec.md §4.5. Resolves against
    /// `EvalType::Change`, then delegates the per-(plot, current
    /// condition) accounting to `grm::area_change`, which expands each
    /// row by its stratum's `ADJ_SUBP` factor the same way `area()`
    /// expands a `COND` row. The expanded rows are then routed through
    /// `output::group_and_estimate`, the same L8 barrier every other
    /// estimator uses, so the result carries population acres (not a
    /// dimensionless proportion-per-year), honors `req.group_by`, and
    /// reports a real post-stratified variance rather than `NaN`.
    /// `method` picks between the transition-matrix and area-sum
    /// summation orders (see `grm::area_change`'s doc comment for why
    /// both are exposed); `is_forest` classifies a (plt_cn, condid) pair
    /// using the same `COND_STATUS_CD == 1` rule `land_type_expr` uses,
    /// since `SUBP_COND_CHNG_MTRX` rows carry no condition attributes of
    /// their own to re-test a land-type or area domain against. The
    /// lookup only covers conditions from the *current* evaluation's
    /// `COND` rows -- a `PREV_PLT_CN`/`PREVCOND` pair from an earlier
    /// inventory cycle that this evaluation's join never loaded falls
    /// back to "not forest" (see DESIGN.md).
    pub fn area_change(
        &self,
        req: &RequestBase,
        change_type: ChangeType,
        method: AreaChangeMethod,
        remper: f64,
    ) -> Result<ResultFrame> {
        let data = self.resolve_and_join(req, EvalType::Change)?;
        let forest_status: HashMap<(i64, u32), bool> = data
            .cond_rows
            .iter()
            .map(|r| ((r.plt_cn, r.condid), r.cond_status_cd == 1))
            .collect();
        let is_forest = |plt_cn: i64, condid: u32| {
            forest_status.get(&(plt_cn, condid)).copied().unwrap_or(false)
        };
        let stratum_for = |plt_cn: i64| data.plot_meta.get(&plt_cn).map(|m| m.stratum.clone());

        let rows = self.db.subp_cond_chng_mtrx();
        let changed = match method {
            AreaChangeMethod::TransitionMatrix => {
                grm::area_change::by_transition_matrix(rows, is_forest, stratum_for, remper, change_type)
            }
            AreaChangeMethod::AreaSum => {
                grm::area_change::by_area_sum(rows, is_forest, stratum_for, remper, change_type)
            }
        };

        let cond_by_key: HashMap<(i64, u32), &JoinedCondRow> =
            data.cond_rows.iter().map(|r| ((r.plt_cn, r.condid), r)).collect();

        let valued: Vec<ValuedRow> = changed
            .into_iter()
            .filter_map(|c| {
                let cond_row = cond_by_key.get(&(c.plt_cn, c.condid))?;
                let group = self.cond_group_key(cond_row, &req.group_by)?;
                Some(ValuedRow { group, plt_cn: c.plt_cn, condid: Some(c.condid), value: c.value })
            })
            .collect();

        output::group_and_estimate(
            Self::tree_group_columns(&req.group_by),
            &valued,
            &data.plot_meta,
            false,
            "AREA_CHANGE_TOTAL",
            data.year,
        )
    }
}

/// Which summation order `area_change` uses; see `grm::area_change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaChangeMethod {
    TransitionMatrix,
    AreaSum,
}
