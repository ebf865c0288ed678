//! L7: value calculators. Each is a pure mapping from an already-joined
//! row to a `RowValue`; callers multiply by expansion (`adjust`) and the
//! domain indicator before handing rows to the estimator (L8).

mod biomass;
mod site_index;
mod tpa;
mod volume;

pub use biomass::{biomass_value, BiomassComponent};
pub use site_index::site_index_value;
pub use tpa::{basal_area_sqft, tpa_value};
pub use volume::{volume_value, VolType};

use crate::adjust;
use crate::filter::{eval::ColumnValue, CompiledFilter};
use crate::join::{JoinedCondRow, JoinedTreeRow};

/// A per-row contribution to a ratio-of-means estimate: numerator and
/// denominator, already multiplied by expansion and the domain
/// indicator. L8 sums these by plot before computing stratum statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowValue {
    pub plt_cn: i64,
    pub numerator: f64,
    pub denominator: f64,
}

fn tree_column(row: &JoinedTreeRow, name: &str) -> ColumnValue {
    match name {
        "DIA" => ColumnValue::Num(row.dia),
        "TPA_UNADJ" => ColumnValue::Num(Some(row.tpa_unadj)),
        "STATUSCD" => ColumnValue::Num(Some(row.statuscd as f64)),
        "SPCD" => ColumnValue::Num(Some(row.spcd as f64)),
        "TREECLCD" => ColumnValue::Num(row.treeclcd.map(|v| v as f64)),
        "AGENTCD" => ColumnValue::Num(row.agentcd.map(|v| v as f64)),
        "VOLCFNET" => ColumnValue::Num(row.volcfnet),
        "VOLCFGRS" => ColumnValue::Num(row.volcfgrs),
        "VOLBFNET" => ColumnValue::Num(row.volbfnet),
        "VOLCSNET" => ColumnValue::Num(row.volcsnet),
        "DRYBIO_AG" => ColumnValue::Num(row.drybio_ag),
        "DRYBIO_BG" => ColumnValue::Num(row.drybio_bg),
        "CARBON_AG" => ColumnValue::Num(row.carbon_ag),
        "CARBON_BG" => ColumnValue::Num(row.carbon_bg),
        "COND_STATUS_CD" => ColumnValue::Num(Some(row.cond_status_cd as f64)),
        "SITECLCD" => ColumnValue::Num(row.siteclcd.map(|v| v as f64)),
        "RESERVCD" => ColumnValue::Num(Some(row.reservcd as f64)),
        "FORTYPCD" => ColumnValue::Num(row.fortypcd.map(|v| v as f64)),
        _ => ColumnValue::Num(None),
    }
}

fn cond_column(row: &JoinedCondRow, name: &str) -> ColumnValue {
    match name {
        "CONDPROP_UNADJ" => ColumnValue::Num(Some(row.condprop_unadj)),
        "COND_STATUS_CD" => ColumnValue::Num(Some(row.cond_status_cd as f64)),
        "SITECLCD" => ColumnValue::Num(row.siteclcd.map(|v| v as f64)),
        "RESERVCD" => ColumnValue::Num(Some(row.reservcd as f64)),
        "FORTYPCD" => ColumnValue::Num(row.fortypcd.map(|v| v as f64)),
        "SICOND" => ColumnValue::Num(row.sicond),
        "SIBASE" => ColumnValue::Num(row.sibase.map(|v| v as f64)),
        _ => ColumnValue::Num(None),
    }
}

/// Evaluates the composed domain indicator for a tree row: `land_mask *
/// area_domain * tree_type_mask * tree_domain`.
pub fn tree_domain_indicator(
    row: &JoinedTreeRow,
    land_mask: &crate::filter::Expr,
    area_domain: Option<&CompiledFilter>,
    tree_type_mask: &crate::filter::Expr,
    tree_domain: Option<&CompiledFilter>,
) -> f64 {
    let lookup = |name: &str| tree_column(row, name);
    let land = crate::filter::eval::eval_bool(land_mask, &lookup);
    let area = area_domain.map(|f| crate::filter::eval::eval_bool(&f.expr, &lookup)).unwrap_or(Some(true));
    let ttype = crate::filter::eval::eval_bool(tree_type_mask, &lookup);
    let tdom = tree_domain.map(|f| crate::filter::eval::eval_bool(&f.expr, &lookup)).unwrap_or(Some(true));
    adjust::tree_domain_indicator(land, area, ttype, tdom)
}

/// Evaluates the composed domain indicator for a condition row:
/// `land_mask * area_domain`.
pub fn cond_domain_indicator(
    row: &JoinedCondRow,
    land_mask: &crate::filter::Expr,
    area_domain: Option<&CompiledFilter>,
) -> f64 {
    let lookup = |name: &str| cond_column(row, name);
    let land = crate::filter::eval::eval_bool(land_mask, &lookup);
    let area = area_domain.map(|f| crate::filter::eval::eval_bool(&f.expr, &lookup)).unwrap_or(Some(true));
    adjust::cond_domain_indicator(land, area)
}

/// Area value: numerator is `land_mask * CONDPROP_UNADJ`
/// already expanded by `e_cond`; `as_share` selects whether the
/// denominator is the condition's own proportion (share-of-land) or `1`
/// (a simple total).
pub fn area_value(row: &JoinedCondRow, domain_indicator: f64, as_share: bool) -> RowValue {
    let e_cond = adjust::e_cond(row.condprop_unadj, row.prop_basis, &row.stratum);
    let numerator = domain_indicator * e_cond;
    let denominator = if as_share { e_cond } else { 1.0 };
    RowValue { plt_cn: row.plt_cn, numerator, denominator }
}
