//! L9: GRM (Growth-Removal-Mortality) accountant. Resolves a tree's
//! remeasurement component against its begin/midpoint records to produce
//! annualized per-acre change, per spec.md §4.5.

pub mod area_change;

use crate::table::schema::{GrmBegin, GrmComponent, GrmMidpt};

/// The measure a GRM calculation reports change in, per spec.md §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    VolumeNet,
    BiomassAgTons,
    BasalArea,
    Count,
}

fn measure_value(measure: Measure, volcfnet: Option<f64>, drybio_ag: Option<f64>, dia: Option<f64>) -> f64 {
    match measure {
        Measure::VolumeNet => volcfnet.unwrap_or(0.0),
        Measure::BiomassAgTons => drybio_ag.unwrap_or(0.0) / 2000.0,
        Measure::BasalArea => dia.map(crate::value::basal_area_sqft).unwrap_or(0.0),
        Measure::Count => 1.0,
    }
}

/// The component family a `COMPONENT` string belongs to, per spec.md
/// §4.5's dispatch table. `REVERSION1/2` and `CUT1/2`/`DIVERSION1/2` are
/// collapsed into their families; the numeric suffix only disambiguates
/// which of a plot's subplots the tree was measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComponentFamily {
    Survivor,
    IngrowthOrReversion,
    Mortality,
    CutOrDiversion,
    Unknown,
}

fn family_of(component: &str) -> ComponentFamily {
    if component == "SURVIVOR" {
        ComponentFamily::Survivor
    } else if component.starts_with("INGROWTH") || component.starts_with("REVERSION") {
        ComponentFamily::IngrowthOrReversion
    } else if component.starts_with("MORTALITY") {
        ComponentFamily::Mortality
    } else if component.starts_with("CUT") || component.starts_with("DIVERSION") {
        ComponentFamily::CutOrDiversion
    } else {
        ComponentFamily::Unknown
    }
}

/// Tier adjustment for a GRM row, per spec.md §4.5: uses `SUBPTYP_GRM`
/// directly rather than recomputing a tier from diameter.
fn grm_adj_factor(subptyp_grm: u32, stratum: &crate::table::schema::PopStratum) -> Option<f64> {
    match subptyp_grm {
        0 => None,
        1 => Some(stratum.adj_factor_subp),
        2 => Some(stratum.adj_factor_micr),
        3 => Some(stratum.adj_factor_macr),
        _ => None,
    }
}

/// The three annualized contributions a single GRM component row makes:
/// net growth, mortality, and removals, per spec.md §4.5's dispatch
/// table. All three are mutually exclusive in practice (each component
/// family only contributes to one), but returning all three lets callers
/// accumulate whichever measure they requested without re-dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GrmContribution {
    pub growth: f64,
    pub mortality: f64,
    pub removals: f64,
}

/// Computes one tree's annualized GRM contribution, expanded by its
/// `SUBPTYP_GRM` adjustment factor. `remper` is the remeasurement period
/// in years. Returns `None` (zero contribution) when `SUBPTYP_GRM == 0`
/// or the component is unrecognized.
pub fn contribution(
    component: &GrmComponent,
    begin: Option<&GrmBegin>,
    midpt: Option<&GrmMidpt>,
    stratum: &crate::table::schema::PopStratum,
    measure: Measure,
    remper: f64,
) -> GrmContribution {
    let Some(adj) = grm_adj_factor(component.subptyp_grm, stratum) else {
        return GrmContribution::default();
    };

    let v_begin = begin.map(|b| measure_value(measure, b.volcfnet, b.drybio_ag, b.dia)).unwrap_or(0.0);
    let v_mid = midpt.map(|m| measure_value(measure, m.volcfnet, m.drybio_ag, m.dia)).unwrap_or(0.0);

    let tpagrow = component.tpagrow_unadj.unwrap_or(0.0);
    let tpamort = component.tpamort_unadj.unwrap_or(0.0);
    let tparemv = component.tparemv_unadj.unwrap_or(0.0);

    let mut out = GrmContribution::default();
    match family_of(&component.component) {
        ComponentFamily::Survivor => {
            if remper > 0.0 {
                out.growth = adj * tpagrow * (v_mid - v_begin) / remper;
            }
        }
        ComponentFamily::IngrowthOrReversion => {
            if remper > 0.0 {
                out.growth = adj * tpagrow * v_mid / remper;
            }
        }
        ComponentFamily::Mortality => {
            out.growth = -adj * tpamort * v_mid;
            out.mortality = adj * tpamort * v_mid;
        }
        ComponentFamily::CutOrDiversion => {
            out.growth = -adj * tparemv * v_mid;
            out.removals = adj * tparemv * v_mid;
        }
        ComponentFamily::Unknown => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::table::schema::PopStratum;

    fn stratum() -> PopStratum {
        PopStratum {
            cn: 1,
            estn_unit_cn: 1,
            p1pointcnt: 100.0,
            p2pointcnt: 50,
            expns: 6000.0,
            adj_factor_micr: 10.0,
            adj_factor_subp: 4.0,
            adj_factor_macr: 1.0,
        }
    }

    #[test]
    fn subptyp_grm_zero_drops_the_row() {
        let component = GrmComponent {
            tre_cn: 1,
            subptyp_grm: 0,
            component: "SURVIVOR".into(),
            tpagrow_unadj: Some(6.0),
            tpamort_unadj: None,
            tparemv_unadj: None,
        };
        let out = contribution(&component, None, None, &stratum(), Measure::VolumeNet, 5.0);
        assert_eq!(out, GrmContribution::default());
    }

    #[test]
    fn survivor_growth_is_midpoint_minus_begin_over_remper() {
        let component = GrmComponent {
            tre_cn: 1,
            subptyp_grm: 1,
            component: "SURVIVOR".into(),
            tpagrow_unadj: Some(6.0),
            tpamort_unadj: None,
            tparemv_unadj: None,
        };
        let begin = GrmBegin { tre_cn: 1, volcfnet: Some(40.0), drybio_ag: None, dia: None };
        let midpt = GrmMidpt { tre_cn: 1, volcfnet: Some(50.0), drybio_ag: None, dia: None };
        let out = contribution(&component, Some(&begin), Some(&midpt), &stratum(), Measure::VolumeNet, 5.0);
        let expected = stratum().adj_factor_subp * 6.0 * (50.0 - 40.0) / 5.0;
        assert_approx_eq!(out.growth, expected, 1e-9);
        assert_eq!(out.mortality, 0.0);
    }

    #[test]
    fn mortality_component_is_not_annualized_again() {
        let component = GrmComponent {
            tre_cn: 1,
            subptyp_grm: 2,
            component: "MORTALITY1".into(),
            tpagrow_unadj: None,
            tpamort_unadj: Some(2.0),
            tparemv_unadj: None,
        };
        let midpt = GrmMidpt { tre_cn: 1, volcfnet: Some(30.0), drybio_ag: None, dia: None };
        let out = contribution(&component, None, Some(&midpt), &stratum(), Measure::VolumeNet, 5.0);
        let expected = stratum().adj_factor_micr * 2.0 * 30.0;
        assert_approx_eq!(out.mortality, expected, 1e-9);
        assert_approx_eq!(out.growth, -expected, 1e-9);
    }
}
