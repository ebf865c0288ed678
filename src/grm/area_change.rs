//! Area-change accounting, per spec.md §4.5: `SUBP_COND_CHNG_MTRX`
//! records four-subplot-resolution transitions between a plot's previous
//! and current condition. Two equally valid summation orders are used in
//! practice (see DESIGN.md's Open Question resolution); both are exposed
//! here rather than picking one silently.
//!
//! Each row is expanded the same way every other per-plot contribution
//! in this crate is (`adjust::e_cond`'s pattern): the raw
//! `SUBPTYP_PROP_CHNG / 4` proportion is multiplied by the stratum's
//! `ADJ_SUBP` factor (the four-subplot resolution this table reports at
//! is a subplot-basis quantity, the same basis condition proportions use
//! when `PROP_BASIS == SUBP`), but **not** by `EXPNS`/`A_U * w_h` --
//! that happens once, at L8, via the stratum/estimation-unit hierarchy
//! (see DESIGN.md's `e_tree`/`e_cond` note). Callers feed the resulting
//! `ChangeRow`s through `output::group_and_estimate` exactly like any
//! other estimator so the result carries a group-by and a post-
//! stratified variance instead of a single ungrouped, varianceless
//! scalar.

use crate::table::schema::{PopStratum, SubpCondChngMtrx};
use crate::value::RowValue;

/// Which change quantity a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Net,
    GrossGain,
    GrossLoss,
}

const SUBPLOTS_PER_PLOT: f64 = 4.0;

/// One `SUBP_COND_CHNG_MTRX` row's annualized, adjustment-expanded
/// contribution. `condid` is the row's *current* condition, carried
/// through so a caller can attach a group key (forest-type group, etc.)
/// the same way `area()` does for a plain `COND` row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeRow {
    pub plt_cn: i64,
    pub condid: u32,
    pub value: RowValue,
}

/// `true` when a row's previous condition was forest and its current
/// condition is not (a loss), or vice versa for a gain. Classification
/// is delegated to the caller via `prev_is_forest`/`curr_is_forest`
/// rather than re-deriving `COND_STATUS_CD` rules already owned by
/// `filter::land_type_expr`.
fn classify(prev_is_forest: bool, curr_is_forest: bool) -> Option<ChangeType> {
    match (prev_is_forest, curr_is_forest) {
        (false, true) => Some(ChangeType::GrossGain),
        (true, false) => Some(ChangeType::GrossLoss),
        _ => None,
    }
}

/// `SUBPTYP_PROP_CHNG / 4`, expanded by the current plot's `ADJ_SUBP`
/// factor, annualized over `remper`.
fn adjusted_magnitude(prop_chng: f64, stratum: &PopStratum, remper: f64) -> f64 {
    (prop_chng / SUBPLOTS_PER_PLOT) * stratum.adj_factor_subp / remper
}

/// Default area-change accounting: each `SUBP_COND_CHNG_MTRX` row is
/// attributed once, to whichever change type its (prev, curr) forest
/// status pair implies. This models the transition matrix directly
/// (`snum 137` in the published estimator), and is the default because
/// it attributes every acre of change to exactly one component with no
/// double-booking.
///
/// Every row in `rows` whose stratum resolves produces a `ChangeRow`,
/// the same indicator idiom `area()` uses for `COND` rows: a row whose
/// transition doesn't match `change_type` still appears, with
/// `numerator == 0.0`, rather than being dropped. This matters for
/// `stratum_stats`' per-plot variance (a non-transitioning plot is a
/// real zero observation, not an absent one) and keeps a stratum's
/// population fully represented even when no row in it transitions at
/// all. `stratum_for` resolves the current plot's stratum (for
/// `ADJ_SUBP`); a row whose plot isn't in the resolved evaluation's
/// plot metadata is dropped, since there is no adjustment factor to
/// expand it by.
pub fn by_transition_matrix(
    rows: &[SubpCondChngMtrx],
    is_forest: impl Fn(i64, u32) -> bool,
    stratum_for: impl Fn(i64) -> Option<PopStratum>,
    remper: f64,
    change_type: ChangeType,
) -> Vec<ChangeRow> {
    if remper <= 0.0 {
        return Vec::new();
    }
    rows.iter()
        .filter_map(|r| {
            let stratum = stratum_for(r.plt_cn)?;
            let prev_forest = is_forest(r.prev_plt_cn, r.prevcond);
            let curr_forest = is_forest(r.plt_cn, r.condid);
            let numerator = match classify(prev_forest, curr_forest) {
                Some(ChangeType::GrossGain) => match change_type {
                    ChangeType::GrossGain | ChangeType::Net => {
                        adjusted_magnitude(r.subptyp_prop_chng, &stratum, remper)
                    }
                    ChangeType::GrossLoss => 0.0,
                },
                Some(ChangeType::GrossLoss) => match change_type {
                    ChangeType::GrossLoss => adjusted_magnitude(r.subptyp_prop_chng, &stratum, remper),
                    ChangeType::Net => -adjusted_magnitude(r.subptyp_prop_chng, &stratum, remper),
                    ChangeType::GrossGain => 0.0,
                },
                Some(ChangeType::Net) | None => 0.0,
            };
            Some(ChangeRow {
                plt_cn: r.plt_cn,
                condid: r.condid,
                value: RowValue { plt_cn: r.plt_cn, numerator, denominator: 0.0 },
            })
        })
        .collect()
}

/// Alternative area-change accounting (`snum 136`): classifies gain and
/// loss rows independently rather than through a single `classify()`
/// call, differing from `by_transition_matrix` only when a plot's
/// previous/current forest status can't be resolved to a clean
/// transition -- kept as a separate, explicitly-chosen entry point
/// rather than silently swapped in. Follows the same always-emit-a-row
/// idiom as `by_transition_matrix`.
pub fn by_area_sum(
    rows: &[SubpCondChngMtrx],
    is_forest: impl Fn(i64, u32) -> bool,
    stratum_for: impl Fn(i64) -> Option<PopStratum>,
    remper: f64,
    change_type: ChangeType,
) -> Vec<ChangeRow> {
    if remper <= 0.0 {
        return Vec::new();
    }
    rows.iter()
        .filter_map(|r| {
            let stratum = stratum_for(r.plt_cn)?;
            let prev_forest = is_forest(r.prev_plt_cn, r.prevcond);
            let curr_forest = is_forest(r.plt_cn, r.condid);
            let is_gain = !prev_forest && curr_forest;
            let is_loss = prev_forest && !curr_forest;
            let include = match change_type {
                ChangeType::GrossGain => is_gain,
                ChangeType::GrossLoss => is_loss,
                ChangeType::Net => is_gain || is_loss,
            };
            let numerator = if include {
                let magnitude = adjusted_magnitude(r.subptyp_prop_chng, &stratum, remper);
                match change_type {
                    ChangeType::Net => if is_gain { magnitude } else { -magnitude },
                    _ => magnitude,
                }
            } else {
                0.0
            };
            Some(ChangeRow {
                plt_cn: r.plt_cn,
                condid: r.condid,
                value: RowValue { plt_cn: r.plt_cn, numerator, denominator: 0.0 },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(plt_cn: i64, prev_plt_cn: i64, condid: u32, prevcond: u32, prop: f64) -> SubpCondChngMtrx {
        SubpCondChngMtrx { plt_cn, prev_plt_cn, condid, prevcond, subptyp_prop_chng: prop }
    }

    fn stratum() -> PopStratum {
        PopStratum {
            cn: 1,
            estn_unit_cn: 1,
            p1pointcnt: 100.0,
            p2pointcnt: 50,
            expns: 6000.0,
            adj_factor_micr: 10.0,
            adj_factor_subp: 2.0,
            adj_factor_macr: 1.0,
        }
    }

    fn sum_numerator(rows: &[ChangeRow]) -> f64 {
        rows.iter().map(|r| r.value.numerator).sum()
    }

    #[test]
    fn net_is_gain_minus_loss_annualized() {
        let rows = vec![
            row(1, 1, 1, 1, 2.0), // forest -> forest, no change, classify() returns None
            row(2, 2, 1, 2, 4.0), // nonforest -> forest: gain
            row(3, 3, 2, 1, 4.0), // forest -> nonforest: loss
        ];
        let is_forest = |plt_cn: i64, condid: u32| match (plt_cn, condid) {
            (1, 1) => true,
            (2, 1) => true,
            (2, 2) => false,
            (3, 1) => true,
            (3, 2) => false,
            _ => false,
        };
        let net = by_transition_matrix(&rows, is_forest, |_| Some(stratum()), 5.0, ChangeType::Net);
        assert_eq!(sum_numerator(&net), 0.0);
    }

    #[test]
    fn by_area_sum_matches_transition_matrix_when_unambiguous() {
        let rows = vec![row(2, 2, 1, 2, 4.0), row(3, 3, 2, 1, 4.0)];
        let is_forest = |plt_cn: i64, condid: u32| match (plt_cn, condid) {
            (2, 1) => true,
            (2, 2) => false,
            (3, 1) => true,
            (3, 2) => false,
            _ => false,
        };
        let a = by_transition_matrix(&rows, is_forest, |_| Some(stratum()), 5.0, ChangeType::Net);
        let b = by_area_sum(&rows, is_forest, |_| Some(stratum()), 5.0, ChangeType::Net);
        assert_eq!(sum_numerator(&a), sum_numerator(&b));
    }

    #[test]
    fn gain_row_is_expanded_by_adj_subp_and_annualized() {
        let rows = vec![row(2, 2, 1, 2, 4.0)]; // prevcond=2 (nonforest) -> condid=1 (forest): gain
        let is_forest = |_: i64, condid: u32| condid == 1;
        let out = by_transition_matrix(&rows, is_forest, |_| Some(stratum()), 5.0, ChangeType::GrossGain);
        assert_eq!(out.len(), 1);
        let expected = (4.0 / SUBPLOTS_PER_PLOT) * stratum().adj_factor_subp / 5.0;
        assert_eq!(out[0].value.numerator, expected);
        assert_eq!(out[0].plt_cn, 2);
        assert_eq!(out[0].condid, 1);
    }

    #[test]
    fn row_with_no_resolvable_stratum_is_dropped() {
        let rows = vec![row(2, 2, 1, 2, 4.0)];
        let is_forest = |_: i64, condid: u32| condid == 1;
        let out = by_transition_matrix(&rows, is_forest, |_| None, 5.0, ChangeType::GrossGain);
        assert!(out.is_empty());
    }

    #[test]
    fn non_transitioning_row_still_emits_a_zero_valued_change_row() {
        let rows = vec![row(1, 1, 1, 1, 2.0)]; // forest -> forest, no transition
        let is_forest = |_: i64, _: u32| true;
        let out = by_transition_matrix(&rows, is_forest, |_| Some(stratum()), 5.0, ChangeType::Net);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value.numerator, 0.0);
    }
}
