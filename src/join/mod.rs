//! L6: join planner. Composes `TREE`/`COND`/`PLOT` with the plot-stratum
//! assignment and stratum/estimation-unit tables for a resolved
//! evaluation set, producing the rows L7-L9 compute values over.
//!
//! Joins are built as indexed hash joins over the decoded row types
//! rather than as a Polars join expression: spec.md §5 requires a
//! deterministic reduction order keyed on the stable plot identifier
//! (`PLT_CN`), which is simplest to guarantee by sorting explicitly here
//! rather than relying on a lazy engine's internal join order. See
//! DESIGN.md.

use std::collections::HashMap;

use crate::error::{EstimationError, Result};
use crate::table::schema::{Cond, Plot, PopEstnUnit, PopStratum, Ppsa, Tree};

/// One tree row with every field a value calculator or the adjustment
/// engine needs, already joined across `TREE`, `COND`, `PLOT`, the
/// stratum assignment, the stratum, and the estimation unit.
#[derive(Debug, Clone)]
pub struct JoinedTreeRow {
    pub tre_cn: i64,
    pub plt_cn: i64,
    pub condid: u32,
    pub statuscd: u32,
    pub spcd: u32,
    pub dia: Option<f64>,
    pub tpa_unadj: f64,
    pub treeclcd: Option<u32>,
    pub agentcd: Option<u32>,
    pub volcfnet: Option<f64>,
    pub volcfgrs: Option<f64>,
    pub volbfnet: Option<f64>,
    pub volcsnet: Option<f64>,
    pub drybio_ag: Option<f64>,
    pub drybio_bg: Option<f64>,
    pub carbon_ag: Option<f64>,
    pub carbon_bg: Option<f64>,
    pub cond_status_cd: u32,
    pub siteclcd: Option<u32>,
    pub reservcd: u32,
    pub fortypcd: Option<u32>,
    pub macro_breakpoint_dia: Option<f64>,
    pub stratum_cn: i64,
    pub estn_unit_cn: i64,
    pub area_used: f64,
    pub stratum: PopStratum,
}

/// One condition row, joined across `COND`, `PLOT`, the stratum
/// assignment, the stratum, and the estimation unit.
#[derive(Debug, Clone)]
pub struct JoinedCondRow {
    pub plt_cn: i64,
    pub condid: u32,
    pub condprop_unadj: f64,
    pub prop_basis: crate::table::schema::PropBasis,
    pub cond_status_cd: u32,
    pub siteclcd: Option<u32>,
    pub reservcd: u32,
    pub fortypcd: Option<u32>,
    pub sicond: Option<f64>,
    pub sibase: Option<u32>,
    pub stratum_cn: i64,
    pub estn_unit_cn: i64,
    pub area_used: f64,
    pub stratum: PopStratum,
}

/// Per-plot metadata needed by the estimator (L8) that has nothing to do
/// with any particular value calculator: which stratum/estimation-unit a
/// plot belongs to, and that stratum's sample-design constants. Built
/// for every plot *assigned* to the evaluation, including ones that
/// contribute no tree or condition rows to a given request -- those
/// still count toward `n_h` (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct PlotMeta {
    pub stratum_cn: i64,
    pub estn_unit_cn: i64,
    pub area_used: f64,
    pub stratum: PopStratum,
}

/// All plot-to-stratum metadata for a single evaluation, keyed by
/// `PLT_CN`.
pub fn plot_meta(
    ppsa: &[Ppsa],
    stratum: &[PopStratum],
    estn_unit: &[PopEstnUnit],
    evalid: u32,
) -> Result<HashMap<i64, PlotMeta>> {
    let strata = index_strata(stratum, estn_unit);
    let mut out = HashMap::new();
    for a in ppsa.iter().filter(|a| a.evalid == evalid) {
        let Some(&stratum_row) = strata.by_cn.get(&a.stratum_cn) else {
            return Err(EstimationError::DataError {
                table: "POP_STRATUM".to_string(),
                key: a.stratum_cn.to_string(),
                detail: "plot assigned to a stratum with no POP_STRATUM row".to_string(),
            });
        };
        let Some(&estn_unit_row) = strata.estn_unit_by_stratum.get(&a.stratum_cn) else {
            return Err(EstimationError::DataError {
                table: "POP_ESTN_UNIT".to_string(),
                key: stratum_row.estn_unit_cn.to_string(),
                detail: "stratum references an estimation unit with no POP_ESTN_UNIT row"
                    .to_string(),
            });
        };
        out.insert(
            a.plt_cn,
            PlotMeta {
                stratum_cn: a.stratum_cn,
                estn_unit_cn: stratum_row.estn_unit_cn,
                area_used: estn_unit_row.area_used,
                stratum: stratum_row.clone(),
            },
        );
    }
    Ok(out)
}

struct StratumIndex<'a> {
    by_cn: HashMap<i64, &'a PopStratum>,
    estn_unit_by_stratum: HashMap<i64, &'a PopEstnUnit>,
}

fn index_strata<'a>(
    stratum: &'a [PopStratum],
    estn_unit: &'a [PopEstnUnit],
) -> StratumIndex<'a> {
    let estn_unit_by_cn: HashMap<i64, &PopEstnUnit> = estn_unit.iter().map(|u| (u.cn, u)).collect();
    StratumIndex {
        by_cn: stratum.iter().map(|s| (s.cn, s)).collect(),
        estn_unit_by_stratum: stratum
            .iter()
            .filter_map(|s| estn_unit_by_cn.get(&s.estn_unit_cn).map(|u| (s.cn, *u)))
            .collect(),
    }
}

/// Plot-stratum assignments restricted to a single EVALID, indexed by
/// `PLT_CN`. A plot has exactly one assignment per evaluation
/// (spec.md §3, invariant 1).
fn assignments_for_evalid(ppsa: &[Ppsa], evalid: u32) -> HashMap<i64, i64> {
    ppsa.iter()
        .filter(|a| a.evalid == evalid)
        .map(|a| (a.plt_cn, a.stratum_cn))
        .collect()
}

/// Builds the tree-level analysis rows for a single evaluation.
/// Resulting rows are sorted by `(PLT_CN, TRE_CN)` to fix the reduction
/// order before any aggregation.
pub fn build_tree_rows(
    trees: &[Tree],
    conds: &[Cond],
    plots: &[Plot],
    ppsa: &[Ppsa],
    stratum: &[PopStratum],
    estn_unit: &[PopEstnUnit],
    evalid: u32,
) -> Result<Vec<JoinedTreeRow>> {
    let plots_by_cn: HashMap<i64, &Plot> = plots.iter().map(|p| (p.cn, p)).collect();
    let conds_by_key: HashMap<(i64, u32), &Cond> =
        conds.iter().map(|c| ((c.plt_cn, c.condid), c)).collect();
    let assignments = assignments_for_evalid(ppsa, evalid);
    let strata = index_strata(stratum, estn_unit);

    let mut rows = Vec::with_capacity(trees.len());
    for t in trees {
        let Some(&stratum_cn) = assignments.get(&t.plt_cn) else {
            continue;
        };
        let Some(&stratum_row) = strata.by_cn.get(&stratum_cn) else {
            return Err(EstimationError::DataError {
                table: "POP_STRATUM".to_string(),
                key: stratum_cn.to_string(),
                detail: "plot assigned to a stratum with no POP_STRATUM row".to_string(),
            });
        };
        let Some(&estn_unit_row) = strata.estn_unit_by_stratum.get(&stratum_cn) else {
            return Err(EstimationError::DataError {
                table: "POP_ESTN_UNIT".to_string(),
                key: stratum_row.estn_unit_cn.to_string(),
                detail: "stratum references an estimation unit with no POP_ESTN_UNIT row"
                    .to_string(),
            });
        };
        let cond = conds_by_key.get(&(t.plt_cn, t.condid)).copied();
        let plot = plots_by_cn.get(&t.plt_cn).copied();

        let (cond_status_cd, siteclcd, reservcd, fortypcd) = match cond {
            Some(c) => (c.cond_status_cd, c.siteclcd, c.reservcd, c.fortypcd),
            None => (0, None, 0, None),
        };

        rows.push(JoinedTreeRow {
            tre_cn: t.cn,
            plt_cn: t.plt_cn,
            condid: t.condid,
            statuscd: t.statuscd,
            spcd: t.spcd,
            dia: t.dia,
            tpa_unadj: t.tpa_unadj,
            treeclcd: t.treeclcd,
            agentcd: t.agentcd,
            volcfnet: t.volcfnet,
            volcfgrs: t.volcfgrs,
            volbfnet: t.volbfnet,
            volcsnet: t.volcsnet,
            drybio_ag: t.drybio_ag,
            drybio_bg: t.drybio_bg,
            carbon_ag: t.carbon_ag,
            carbon_bg: t.carbon_bg,
            cond_status_cd,
            siteclcd,
            reservcd,
            fortypcd,
            macro_breakpoint_dia: plot.and_then(|p| p.macro_breakpoint_dia),
            stratum_cn,
            estn_unit_cn: stratum_row.estn_unit_cn,
            area_used: estn_unit_row.area_used,
            stratum: (*stratum_row).clone(),
        });
    }
    rows.sort_by_key(|r| (r.plt_cn, r.tre_cn));
    Ok(rows)
}

/// Builds the condition-level analysis rows for a single evaluation.
/// Resulting rows are sorted by `(PLT_CN, CONDID)`.
pub fn build_cond_rows(
    conds: &[Cond],
    ppsa: &[Ppsa],
    stratum: &[PopStratum],
    estn_unit: &[PopEstnUnit],
    evalid: u32,
) -> Result<Vec<JoinedCondRow>> {
    let assignments = assignments_for_evalid(ppsa, evalid);
    let strata = index_strata(stratum, estn_unit);

    let mut rows = Vec::with_capacity(conds.len());
    for c in conds {
        let Some(&stratum_cn) = assignments.get(&c.plt_cn) else {
            continue;
        };
        let Some(&stratum_row) = strata.by_cn.get(&stratum_cn) else {
            return Err(EstimationError::DataError {
                table: "POP_STRATUM".to_string(),
                key: stratum_cn.to_string(),
                detail: "plot assigned to a stratum with no POP_STRATUM row".to_string(),
            });
        };
        let Some(&estn_unit_row) = strata.estn_unit_by_stratum.get(&stratum_cn) else {
            return Err(EstimationError::DataError {
                table: "POP_ESTN_UNIT".to_string(),
                key: stratum_row.estn_unit_cn.to_string(),
                detail: "stratum references an estimation unit with no POP_ESTN_UNIT row"
                    .to_string(),
            });
        };

        rows.push(JoinedCondRow {
            plt_cn: c.plt_cn,
            condid: c.condid,
            condprop_unadj: c.condprop_unadj,
            prop_basis: c.prop_basis,
            cond_status_cd: c.cond_status_cd,
            siteclcd: c.siteclcd,
            reservcd: c.reservcd,
            fortypcd: c.fortypcd,
            sicond: c.sicond,
            sibase: c.sibase,
            stratum_cn,
            estn_unit_cn: stratum_row.estn_unit_cn,
            area_used: estn_unit_row.area_used,
            stratum: (*stratum_row).clone(),
        });
    }
    rows.sort_by_key(|r| (r.plt_cn, r.condid));
    Ok(rows)
}
