//! L8: ratio-of-means estimator. Consumes a long frame of per-plot
//! numerator/denominator contributions and the plot-to-stratum metadata
//! from L6, and produces the post-stratified point estimate, variance,
//! and derived quantities of spec.md §4.4 (Bechtold & Patterson 2005).

use std::collections::HashMap;

use crate::error::Result;
use crate::join::PlotMeta;
use crate::value::RowValue;

/// A single group's final, reported estimate -- the columns of spec.md
/// §6.2's result frame, minus the group-key columns L10 attaches.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateResult {
    pub estimate: f64,
    pub variance: f64,
    pub se: f64,
    pub cv: Option<f64>,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub n_plots: u32,
    /// Tier-3 numeric-degeneracy notes from this group's own computation
    /// (spec.md §7), e.g. a clamped negative stratum variance. Empty in
    /// the common case.
    pub warnings: Vec<String>,
}

const Z_95: f64 = 1.96;

struct PlotTotal {
    plt_cn: i64,
    y: f64,
    x: f64,
}

/// Sums condition/tree-row contributions to plot-level totals `Y_p`,
/// `X_p`, per spec.md §4.4's "per-plot aggregation".
fn aggregate_by_plot(values: &[RowValue]) -> HashMap<i64, (f64, f64)> {
    let mut totals: HashMap<i64, (f64, f64)> = HashMap::new();
    for v in values {
        let entry = totals.entry(v.plt_cn).or_insert((0.0, 0.0));
        entry.0 += v.numerator;
        entry.1 += v.denominator;
    }
    totals
}

struct StratumStats {
    estn_unit_cn: i64,
    area_used: f64,
    p1pointcnt: f64,
    n_h: u32,
    y_bar: f64,
    x_bar: f64,
    s2_y: f64,
    s2_x: f64,
    s_yx: f64,
}

/// Stratum-level means, variances, and covariance, per spec.md §4.4.
/// `n_h` is the stratum's Phase-2 plot count (`POP_STRATUM.P2POINTCNT`),
/// not merely the count of plots present in `plot_totals` -- a plot
/// assigned to the stratum that contributed nothing still counts.
fn stratum_stats(
    plot_meta: &HashMap<i64, PlotMeta>,
    plot_totals: &HashMap<i64, (f64, f64)>,
    warnings: &mut Vec<String>,
) -> Vec<StratumStats> {
    let mut by_stratum: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut plt_cns: Vec<i64> = plot_meta.keys().copied().collect();
    plt_cns.sort_unstable();
    for plt_cn in plt_cns {
        let meta = &plot_meta[&plt_cn];
        by_stratum.entry(meta.stratum_cn).or_default().push(plt_cn);
    }
    let mut stratum_cns: Vec<i64> = by_stratum.keys().copied().collect();
    stratum_cns.sort_unstable();

    let mut out = Vec::new();
    for stratum_cn in stratum_cns {
        let plots = &by_stratum[&stratum_cn];
        let meta = &plot_meta[&plots[0]];
        let n_h = meta.stratum.p2pointcnt;
        if n_h == 0 {
            continue;
        }
        let (sum_y, sum_x): (f64, f64) = plots
            .iter()
            .map(|p| plot_totals.get(p).copied().unwrap_or((0.0, 0.0)))
            .fold((0.0, 0.0), |acc, v| (acc.0 + v.0, acc.1 + v.1));
        let y_bar = sum_y / n_h as f64;
        let x_bar = sum_x / n_h as f64;

        let (mut ss_y, mut ss_x, mut ss_yx) = (0.0, 0.0, 0.0);
        for p in plots {
            let (y, x) = plot_totals.get(p).copied().unwrap_or((0.0, 0.0));
            ss_y += (y - y_bar).powi(2);
            ss_x += (x - x_bar).powi(2);
            ss_yx += (y - y_bar) * (x - x_bar);
        }
        let (s2_y, s2_x, s_yx) = if n_h <= 1 {
            (0.0, 0.0, 0.0)
        } else {
            let denom = (n_h - 1) as f64;
            (ss_y / denom, ss_x / denom, ss_yx / denom)
        };

        // Sums of squared deviations can't be negative by construction, but
        // spec.md §4.4's edge-case rule (clamp negative stratum variance to
        // zero with a warning) is kept as a defensive check against future
        // callers that feed pre-aggregated sums rather than raw plot totals.
        if s2_y < 0.0 || s2_x < 0.0 {
            tracing::warn!(stratum_cn, "negative stratum variance clamped to zero");
            warnings.push(format!("stratum {stratum_cn}: negative variance clamped to zero"));
        }

        out.push(StratumStats {
            estn_unit_cn: meta.estn_unit_cn,
            area_used: meta.area_used,
            p1pointcnt: meta.stratum.p1pointcnt,
            n_h,
            y_bar,
            x_bar,
            s2_y: s2_y.max(0.0),
            s2_x: s2_x.max(0.0),
            s_yx,
        });
    }
    out
}

struct EstnUnitTotal {
    total_y: f64,
    total_x: f64,
    var_y: f64,
    var_x: f64,
    cov_yx: f64,
    n_plots: u32,
}

/// Estimation-unit totals and variances, per spec.md §4.4's
/// post-stratified formula.
fn estn_unit_totals(strata: &[StratumStats]) -> Vec<EstnUnitTotal> {
    let mut by_unit: HashMap<i64, Vec<&StratumStats>> = HashMap::new();
    for s in strata {
        by_unit.entry(s.estn_unit_cn).or_default().push(s);
    }

    by_unit
        .into_values()
        .map(|strata| {
            let area = strata[0].area_used;
            let p1_total: f64 = strata.iter().map(|s| s.p1pointcnt).sum();
            let n: u32 = strata.iter().map(|s| s.n_h).sum();

            let weighted = |get: &dyn Fn(&StratumStats) -> f64| -> f64 {
                strata
                    .iter()
                    .map(|s| (s.p1pointcnt / p1_total) * get(s))
                    .sum()
            };
            let total_y = area * weighted(&|s| s.y_bar);
            let total_x = area * weighted(&|s| s.x_bar);

            let post_stratified_variance = |get: &dyn Fn(&StratumStats) -> f64| -> f64 {
                if n == 0 {
                    return 0.0;
                }
                let n_f = n as f64;
                let term1: f64 = strata
                    .iter()
                    .map(|s| (s.p1pointcnt / p1_total) * get(s))
                    .sum::<f64>()
                    / n_f;
                let term2: f64 = strata
                    .iter()
                    .map(|s| (1.0 - s.p1pointcnt / p1_total) * get(s))
                    .sum::<f64>()
                    / (n_f * n_f);
                area.powi(2) * (term1 + term2)
            };

            let var_y = post_stratified_variance(&|s| s.s2_y);
            let var_x = post_stratified_variance(&|s| s.s2_x);
            let cov_yx = post_stratified_variance(&|s| s.s_yx);

            EstnUnitTotal {
                total_y,
                total_x,
                var_y: var_y.max(0.0),
                var_x: var_x.max(0.0),
                cov_yx,
                n_plots: n,
            }
        })
        .collect()
}

/// Runs the full L8 pipeline for one group: per-plot aggregation,
/// stratum statistics, estimation-unit totals, population rollup, and
/// (if `values_denominator_is_ratio`) the per-acre ratio and its
/// variance. Pass `values` pre-filtered to the group's member rows --
/// L10's grouped estimation zeroes out non-members before this point.
pub fn estimate(
    values: &[RowValue],
    plot_meta: &HashMap<i64, PlotMeta>,
    as_ratio: bool,
) -> Result<EstimateResult> {
    let mut warnings = Vec::new();
    let plot_totals = aggregate_by_plot(values);
    let strata = stratum_stats(plot_meta, &plot_totals, &mut warnings);
    let units = estn_unit_totals(&strata);

    let total_y: f64 = units.iter().map(|u| u.total_y).sum();
    let total_x: f64 = units.iter().map(|u| u.total_x).sum();
    let var_y: f64 = units.iter().map(|u| u.var_y).sum();
    let var_x: f64 = units.iter().map(|u| u.var_x).sum();
    let cov_yx: f64 = units.iter().map(|u| u.cov_yx).sum();
    let n_plots: u32 = units.iter().map(|u| u.n_plots).sum();

    let (estimate, variance) = if as_ratio {
        if total_x == 0.0 {
            (f64::NAN, f64::NAN)
        } else {
            let r = total_y / total_x;
            let v = (1.0 / total_x.powi(2)) * (var_y + r.powi(2) * var_x - 2.0 * r * cov_yx);
            (r, v.max(0.0))
        }
    } else {
        (total_y, var_y)
    };

    if estimate.is_nan() {
        return Ok(EstimateResult {
            estimate: f64::NAN,
            variance: f64::NAN,
            se: f64::NAN,
            cv: None,
            ci_lower: f64::NAN,
            ci_upper: f64::NAN,
            n_plots,
            warnings,
        });
    }

    let se = variance.sqrt();
    let cv = if estimate == 0.0 { None } else { Some(100.0 * se / estimate) };

    Ok(EstimateResult {
        estimate,
        variance,
        se,
        cv,
        ci_lower: estimate - Z_95 * se,
        ci_upper: estimate + Z_95 * se,
        n_plots,
        warnings,
    })
}
