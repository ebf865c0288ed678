//! Volume value calculator: `TPA_UNADJ * VOL<type>`.

use crate::adjust;
use crate::join::JoinedTreeRow;
use crate::value::RowValue;

/// Which precomputed FIA volume column to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolType {
    Net,
    Gross,
    SawlogBoardFoot,
    Sound,
}

fn raw_volume(row: &JoinedTreeRow, vol_type: VolType) -> f64 {
    match vol_type {
        VolType::Net => row.volcfnet,
        VolType::Gross => row.volcfgrs,
        VolType::SawlogBoardFoot => row.volbfnet,
        VolType::Sound => row.volcsnet,
    }
    .unwrap_or(0.0)
}

pub fn volume_value(row: &JoinedTreeRow, domain_indicator: f64, vol_type: VolType) -> RowValue {
    let e_tree = adjust::e_tree(row.tpa_unadj, row.dia, row.macro_breakpoint_dia, &row.stratum);
    let numerator = domain_indicator * raw_volume(row, vol_type) * e_tree;
    RowValue { plt_cn: row.plt_cn, numerator, denominator: 1.0 }
}
