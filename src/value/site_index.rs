//! Site index value calculator: a condition-row ratio
//! estimator grouped by `SIBASE`, since site index values are only
//! comparable within a common base age.

use crate::adjust;
use crate::join::JoinedCondRow;
use crate::value::RowValue;

/// Numerator `SICOND * CONDPROP_UNADJ`, denominator `CONDPROP_UNADJ`.
/// Returns `None` when `SICOND`/`SIBASE` are unset (the condition has no
/// site-index measurement), so callers can exclude the row from its
/// `SIBASE` group rather than silently contributing a zero.
pub fn site_index_value(row: &JoinedCondRow, domain_indicator: f64) -> Option<(u32, RowValue)> {
    let sicond = row.sicond?;
    let sibase = row.sibase?;
    let e_cond = adjust::e_cond(row.condprop_unadj, row.prop_basis, &row.stratum);
    Some((
        sibase,
        RowValue {
            plt_cn: row.plt_cn,
            numerator: domain_indicator * sicond * e_cond,
            denominator: domain_indicator * e_cond,
        },
    ))
}
