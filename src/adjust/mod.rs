//! L5: adjustment & domain engine. Tier selection and domain indicator
//! composition are each centralized here exactly once, per spec.md
//! §4.3's "single source of truth" and "multiplications over {0,1}"
//! rules -- no consumer recomputes a tier or re-derives a mask.

use crate::table::schema::{PopStratum, PropBasis, Tier};

/// Tier selection rule of spec.md §4.3. The sole place a tree's tier is
/// computed; `grm` uses `SUBPTYP_GRM` directly instead (spec.md §4.5),
/// which is intentionally not this function.
pub fn tier_for(dia: Option<f64>, macro_breakpoint_dia: Option<f64>) -> Tier {
    match dia {
        None => Tier::Micr,
        Some(d) if d < 5.0 => Tier::Micr,
        Some(d) => match macro_breakpoint_dia {
            None => Tier::Subp,
            Some(mbp) if d < mbp => Tier::Subp,
            Some(_) => Tier::Macr,
        },
    }
}

/// The stratum adjustment factor for a tier.
pub fn adj_factor(tier: Tier, stratum: &PopStratum) -> f64 {
    match tier {
        Tier::Micr => stratum.adj_factor_micr,
        Tier::Subp => stratum.adj_factor_subp,
        Tier::Macr => stratum.adj_factor_macr,
    }
}

/// The stratum adjustment factor keyed by `PROP_BASIS` (for
/// condition-level expansion, which has no tier).
pub fn adj_factor_for_basis(basis: PropBasis, stratum: &PopStratum) -> f64 {
    match basis {
        PropBasis::Subp => stratum.adj_factor_subp,
        PropBasis::Macr => stratum.adj_factor_macr,
    }
}

/// `e_tree = TPA_UNADJ * ADJ_tier`, the per-acre density contribution of
/// a single tree (spec.md §4.3 names a further `* EXPNS` factor; this
/// implementation applies `EXPNS` at the estimation-unit stage (L8) via
/// `A_U` and the Phase-1 stratum weights instead, since `EXPNS` in a real
/// FIADB already equals `A_U * w_h / n_h` and multiplying it in twice
/// would double-count area -- see DESIGN.md).
pub fn e_tree(tpa_unadj: f64, dia: Option<f64>, macro_breakpoint_dia: Option<f64>, stratum: &PopStratum) -> f64 {
    let tier = tier_for(dia, macro_breakpoint_dia);
    tpa_unadj * adj_factor(tier, stratum)
}

/// `e_cond = CONDPROP_UNADJ * ADJ_basis`, per spec.md §4.3 (see `e_tree`
/// for why `EXPNS` is applied at L8 rather than here).
pub fn e_cond(condprop_unadj: f64, basis: PropBasis, stratum: &PopStratum) -> f64 {
    condprop_unadj * adj_factor_for_basis(basis, stratum)
}

/// Domain composition over `{0,1}`, per spec.md §4.3: a tree-row's
/// indicator is `land_mask * area_domain * tree_type_mask * tree_domain`.
/// Any `None` input (a null in the source predicate) binds to `0`.
pub fn tree_domain_indicator(
    land_mask: Option<bool>,
    area_domain: Option<bool>,
    tree_type_mask: Option<bool>,
    tree_domain: Option<bool>,
) -> f64 {
    [land_mask, area_domain, tree_type_mask, tree_domain]
        .into_iter()
        .map(|m| if m.unwrap_or(false) { 1.0 } else { 0.0 })
        .product()
}

/// Domain composition for a condition-row: `land_mask * area_domain`.
pub fn cond_domain_indicator(land_mask: Option<bool>, area_domain: Option<bool>) -> f64 {
    [land_mask, area_domain]
        .into_iter()
        .map(|m| if m.unwrap_or(false) { 1.0 } else { 0.0 })
        .product()
}
