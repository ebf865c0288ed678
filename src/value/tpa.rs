//! Trees-per-acre and basal-area-per-acre value calculators.

use crate::adjust;
use crate::join::JoinedTreeRow;
use crate::value::RowValue;

/// Basal area in square feet for a tree of diameter `dia` (inches):
/// `pi * (DIA/24)^2`.
pub fn basal_area_sqft(dia: f64) -> f64 {
    std::f64::consts::PI * (dia / 24.0).powi(2)
}

/// TPA numerator is `TPA_UNADJ`, BAA numerator is `basal_area * TPA_UNADJ`;
/// the shared per-acre denominator is forest area (an `area_value` row
/// computed separately and joined downstream by plot in L8).
pub fn tpa_value(row: &JoinedTreeRow, domain_indicator: f64, basal_area: bool) -> RowValue {
    let e_tree = adjust::e_tree(row.tpa_unadj, row.dia, row.macro_breakpoint_dia, &row.stratum);
    let per_tree = if basal_area {
        row.dia.map(basal_area_sqft).unwrap_or(0.0)
    } else {
        1.0
    };
    RowValue {
        plt_cn: row.plt_cn,
        numerator: domain_indicator * per_tree * e_tree,
        denominator: 1.0,
    }
}
