//! The seven seeded scenarios of spec.md §8, one test each. The real
//! FIADB evaluations spec.md cites (412101, 372301, 82003, ...) are
//! multi-gigabyte and out of reach for a test fixture; each test below
//! builds the smallest hand-computable fixture that exercises the same
//! estimator family and domain restriction the scenario names, and
//! checks the property the published figure is evidence of (a ratio
//! identity, a component decomposition, a gross-vs-net ordering) rather
//! than the unreproducible magnitude itself. The published figure is
//! quoted in each test's doc comment for a reader who wants to compare
//! against the real evaluation.

use std::collections::HashMap;

use fia_estimation_engine::estimator::{AreaChangeMethod, Estimator, RequestBase};
use fia_estimation_engine::eval::Selector;
use fia_estimation_engine::filter::{LandType, TreeType};
use fia_estimation_engine::grm::area_change::ChangeType;
use fia_estimation_engine::grm::Measure;
use fia_estimation_engine::output::GroupBy;
use fia_estimation_engine::table::ColumnarBackend;
use fia_estimation_engine::value::VolType;
use fia_estimation_engine::{EngineConfig, FiaDatabase};
use polars::prelude::*;

fn series_i64(name: &str, values: Vec<i64>) -> Series {
    Series::new(name.into(), values)
}
fn series_f64(name: &str, values: Vec<f64>) -> Series {
    Series::new(name.into(), values)
}
fn series_str(name: &str, values: Vec<&str>) -> Series {
    Series::new(name.into(), values)
}

/// One state, one stratum, four plots: three forested (two softwood-
/// sized live trees and one small live tree below the growing-stock
/// diameter threshold) and one non-forest. Enough structure to exercise
/// area, TPA, volume, growing-stock/timber domains, size classing, and
/// GRM dispatch, while staying small enough to hand-check every number
/// this file asserts on.
fn fixture() -> FiaDatabase {
    let plot = DataFrame::new(vec![
        series_i64("CN", vec![1, 2, 3, 4]),
        series_i64("PREV_PLT_CN", vec![-1; 4]),
        series_f64("MACRO_BREAKPOINT_DIA", vec![24.0; 4]),
        series_i64("STATECD", vec![41; 4]),
    ])
    .unwrap();

    let cond = DataFrame::new(vec![
        series_i64("PLT_CN", vec![1, 2, 3, 4]),
        series_i64("CONDID", vec![1; 4]),
        series_f64("CONDPROP_UNADJ", vec![1.0; 4]),
        series_str("PROP_BASIS", vec!["SUBP"; 4]),
        series_i64("COND_STATUS_CD", vec![1, 1, 1, 2]),
        series_i64("SITECLCD", vec![3, 3, 3, 7]),
        series_i64("RESERVCD", vec![0; 4]),
        series_i64("FORTYPCD", vec![201, 201, 703, 0]),
        series_i64("PREV_CONDID", vec![1; 4]),
        series_f64("SICOND", vec![85.0, 80.0, 70.0, 0.0]),
        series_i64("SIBASE", vec![50; 4]),
    ])
    .unwrap();

    let tree = DataFrame::new(vec![
        series_i64("CN", vec![100, 101, 102]),
        series_i64("PLT_CN", vec![1, 2, 3]),
        series_i64("CONDID", vec![1; 3]),
        series_i64("STATUSCD", vec![1; 3]),
        series_i64("SPCD", vec![202, 202, 131]),
        series_f64("DIA", vec![18.0, 12.0, 3.5]),
        series_f64("TPA_UNADJ", vec![6.018, 6.018, 74.9]),
        series_i64("TREECLCD", vec![2, 2, 2]),
        series_i64("AGENTCD", vec![0, 0, 0]),
        series_f64("VOLCFNET", vec![30.0, 15.0, 0.5]),
        series_f64("VOLCFGRS", vec![33.0, 16.5, 0.6]),
        series_f64("VOLBFNET", vec![140.0, 60.0, 0.0]),
        series_f64("VOLCSNET", vec![31.0, 15.5, 0.5]),
        series_f64("DRYBIO_AG", vec![900.0, 500.0, 20.0]),
        series_f64("DRYBIO_BG", vec![180.0, 100.0, 4.0]),
        series_f64("CARBON_AG", vec![450.0, 250.0, 10.0]),
        series_f64("CARBON_BG", vec![90.0, 50.0, 2.0]),
    ])
    .unwrap();

    let pop_eval = DataFrame::new(vec![
        series_i64("CN", vec![1]),
        series_i64("EVALID", vec![412101]),
        series_i64("STATECD", vec![41]),
        series_i64("END_INVYR", vec![2021]),
    ])
    .unwrap();

    let pop_eval_typ = DataFrame::new(vec![
        series_i64("EVAL_CN", vec![1, 1, 1, 1, 1, 1]),
        series_str(
            "EVAL_TYP",
            vec!["EXPCURR", "EXPVOL", "EXPCHNG", "EXPGROW", "EXPMORT", "EXPREMV"],
        ),
    ])
    .unwrap();

    let pop_estn_unit = DataFrame::new(vec![
        series_i64("CN", vec![10]),
        series_i64("EVAL_CN", vec![1]),
        series_f64("AREA_USED", vec![1_000_000.0]),
    ])
    .unwrap();

    let pop_stratum = DataFrame::new(vec![
        series_i64("CN", vec![100]),
        series_i64("ESTN_UNIT_CN", vec![10]),
        series_f64("P1POINTCNT", vec![4000.0]),
        series_i64("P2POINTCNT", vec![4]),
        series_f64("EXPNS", vec![250_000.0]),
        series_f64("ADJ_FACTOR_MICR", vec![1.0]),
        series_f64("ADJ_FACTOR_SUBP", vec![1.0]),
        series_f64("ADJ_FACTOR_MACR", vec![1.0]),
    ])
    .unwrap();

    let ppsa = DataFrame::new(vec![
        series_i64("PLT_CN", vec![1, 2, 3, 4]),
        series_i64("STRATUM_CN", vec![100, 100, 100, 100]),
        series_i64("EVALID", vec![412101, 412101, 412101, 412101]),
    ])
    .unwrap();

    let grm_component = DataFrame::new(vec![
        series_i64("TRE_CN", vec![100, 101, 102]),
        series_i64("SUBPTYP_GRM", vec![1, 1, 2]),
        series_str("COMPONENT", vec!["SURVIVOR", "INGROWTH", "SURVIVOR"]),
        series_f64("TPAGROW_UNADJ", vec![6.018, 6.018, 74.9]),
        series_f64("TPAMORT_UNADJ", vec![0.0, 0.0, 0.0]),
        series_f64("TPAREMV_UNADJ", vec![0.0, 0.0, 0.0]),
    ])
    .unwrap();

    let grm_begin = DataFrame::new(vec![
        series_i64("TRE_CN", vec![100, 101, 102]),
        series_f64("VOLCFNET", vec![25.0, 0.0, 0.3]),
        series_f64("DRYBIO_AG", vec![800.0, 0.0, 12.0]),
        series_f64("DIA", vec![16.5, 0.0, 2.8]),
    ])
    .unwrap();

    let grm_midpt = DataFrame::new(vec![
        series_i64("TRE_CN", vec![100, 101, 102]),
        series_f64("VOLCFNET", vec![30.0, 15.0, 0.5]),
        series_f64("DRYBIO_AG", vec![900.0, 500.0, 20.0]),
        series_f64("DIA", vec![18.0, 12.0, 3.5]),
    ])
    .unwrap();

    let subp_cond_chng_mtrx = DataFrame::new(vec![
        series_i64("PLT_CN", vec![1, 2, 3, 4]),
        series_i64("PREV_PLT_CN", vec![1, 2, 3, 4]),
        series_i64("CONDID", vec![1; 4]),
        series_i64("PREVCOND", vec![1, 1, 2, 1]),
        series_f64("SUBPTYP_PROP_CHNG", vec![1.0; 4]),
    ])
    .unwrap();

    let begin_end = DataFrame::new(vec![series_i64("ONEORTWO", vec![1, 2])]).unwrap();

    let mut frames: HashMap<&'static str, DataFrame> = HashMap::new();
    frames.insert("PLOT", plot);
    frames.insert("COND", cond);
    frames.insert("TREE", tree);
    frames.insert("POP_EVAL", pop_eval);
    frames.insert("POP_EVAL_TYP", pop_eval_typ);
    frames.insert("POP_ESTN_UNIT", pop_estn_unit);
    frames.insert("POP_STRATUM", pop_stratum);
    frames.insert("POP_PLOT_STRATUM_ASSGN", ppsa);
    frames.insert("TREE_GRM_COMPONENT", grm_component);
    frames.insert("TREE_GRM_BEGIN", grm_begin);
    frames.insert("TREE_GRM_MIDPT", grm_midpt);
    frames.insert("SUBP_COND_CHNG_MTRX", subp_cond_chng_mtrx);
    frames.insert("BEGINEND", begin_end);

    FiaDatabase::from_backend(
        Box::new(ColumnarBackend::from_frames(frames)),
        Box::new(fia_estimation_engine::reference::DefaultSpeciesCatalog::default()),
        Box::new(fia_estimation_engine::reference::DefaultForestTypeCatalog::default()),
        EngineConfig::default(),
    )
    .unwrap()
}

/// Scenario 1 (spec.md §8): Oregon total live trees, EVALID 412101,
/// `STATUSCD=1 AND COND_STATUS_CD=1`, no grouping. Published figures:
/// total ≈ 10,481,113,490 trees, forest area ≈ 29,292,380 acres, TPA ≈
/// 357.8. This fixture checks the ratio identity the real evaluation's
/// TPA/area/total triple satisfies: per-acre TPA times forest area
/// reproduces the population total.
#[test]
fn scenario_1_oregon_tpa_ratio_identity() {
    let db = fixture();
    let est = Estimator::new(&db);
    let mut req = RequestBase::new(vec![41], Selector::MostRecent);
    req.land_type = LandType::Forest;
    req.tree_domain = Some("STATUSCD == 1".to_string());

    let per_acre = est.tpa(&req, false).unwrap();
    let mut totals_req = req.clone();
    totals_req.totals = true;
    let total = est.tpa(&totals_req, false).unwrap();
    let area = est.area(&req).unwrap();

    let ratio = per_acre.rows[0].estimate;
    let expected_total = ratio * area.rows[0].estimate;
    assert!((expected_total - total.rows[0].estimate).abs() / total.rows[0].estimate < 1e-6);
}

/// Scenario 2 (spec.md §8): North Carolina live trees by species,
/// EVALID 372301. Published: total ≈ 13,541,944,859 across 129 species,
/// top group SPCD=131 ≈ 2,112,569,195. This fixture checks the
/// partition-consistency invariant the published per-species breakdown
/// must satisfy: the grouped totals sum to the ungrouped total.
#[test]
fn scenario_2_species_groups_sum_to_the_total() {
    let db = fixture();
    let est = Estimator::new(&db);
    let mut req = RequestBase::new(vec![41], Selector::MostRecent);
    req.land_type = LandType::Forest;
    req.tree_domain = Some("STATUSCD == 1".to_string());
    req.totals = true;

    let ungrouped = est.tpa(&req, false).unwrap();
    req.group_by = vec![GroupBy::BySpecies];
    let grouped = est.tpa(&req, false).unwrap();

    let grouped_total: f64 = grouped.rows.iter().map(|r| r.estimate).sum();
    assert!((grouped_total - ungrouped.rows[0].estimate).abs() / ungrouped.rows[0].estimate < 1e-6);
}

/// Scenario 3 (spec.md §8): Colorado merchantable volume mortality,
/// EVALID 82003, growing-stock trees, forest land. Published: annual
/// mortality ≈ 9.7 million cubic feet. This fixture checks that the
/// mortality estimator reports a positive annualized value driven by
/// `TREE_GRM_COMPONENT`'s `MORTALITY*` rows (none are present in this
/// fixture's growing-stock domain, so the expected value is exactly
/// zero rather than the published nonzero figure -- the property under
/// test is that the pipeline runs end to end and reports zero rather
/// than erroring when no mortality rows match the domain).
#[test]
fn scenario_3_mortality_runs_end_to_end_for_growing_stock() {
    let db = fixture();
    let est = Estimator::new(&db);
    let mut req = RequestBase::new(vec![41], Selector::MostRecent);
    req.land_type = LandType::Forest;
    req.tree_type = TreeType::GrowingStock;

    let mortality = est.mortality(&req, Measure::VolumeNet, 5.0).unwrap();
    assert_eq!(mortality.rows[0].estimate, 0.0);
    assert!(mortality.rows[0].variance.is_nan() || mortality.rows[0].variance >= 0.0);
}

/// Scenario 4 (spec.md §8): Minnesota forest area by forest-type group,
/// EVALID 272201. Published: total forest area ≈ 17,599,046 acres;
/// aspen/birch group ≈ 6,411,308 acres. Checked here: grouping by
/// `FORTYPCD` (a stand-in for the forest-type-group shortcut, since this
/// fixture's `DefaultForestTypeCatalog` only needs to resolve the two
/// codes present) reproduces the ungrouped forest-area total.
#[test]
fn scenario_4_forest_area_by_type_sums_to_the_total() {
    let db = fixture();
    let est = Estimator::new(&db);
    let mut req = RequestBase::new(vec![41], Selector::MostRecent);
    req.land_type = LandType::Forest;

    let ungrouped = est.area(&req).unwrap();
    req.group_by = vec![GroupBy::Column("FORTYPCD".to_string())];
    let grouped = est.area(&req).unwrap();

    let grouped_total: f64 = grouped.rows.iter().map(|r| r.estimate).sum();
    assert!((grouped_total - ungrouped.rows[0].estimate).abs() / ungrouped.rows[0].estimate < 1e-6);
}

/// Scenario 5 (spec.md §8): California volume by diameter class, EVALID
/// 62101, growing-stock timber species, timberland. Published: total ≈
/// 67.05 billion ft³; ≥29in share ≈ 35.6%. Checked here: grouping by
/// `SizeClassKind::Standard` reproduces the ungrouped volume total (the
/// same partition-consistency property the published per-class
/// breakdown is evidence of), and gross volume is never less than net
/// for the same trees (spec.md §8's "gross >= net" invariant).
#[test]
fn scenario_5_volume_by_size_class_and_gross_ge_net() {
    let db = fixture();
    let est = Estimator::new(&db);
    let mut req = RequestBase::new(vec![41], Selector::MostRecent);
    req.land_type = LandType::Timber;
    req.tree_type = TreeType::GrowingStock;
    req.totals = true;

    let ungrouped = est.volume(&req, VolType::Net).unwrap();
    req.group_by = vec![GroupBy::BySizeClass(
        fia_estimation_engine::output::SizeClassKind::Standard,
    )];
    let grouped = est.volume(&req, VolType::Net).unwrap();
    let grouped_total: f64 = grouped.rows.iter().map(|r| r.estimate).sum();
    assert!((grouped_total - ungrouped.rows[0].estimate).abs() / ungrouped.rows[0].estimate.max(1e-9) < 1e-6);

    req.group_by = vec![];
    let net = est.volume(&req, VolType::Net).unwrap();
    let gross = est.volume(&req, VolType::Gross).unwrap();
    assert!(gross.rows[0].estimate >= net.rows[0].estimate);
}

/// Scenario 6 (spec.md §8): Georgia carbon total, EVALID 132303, pool =
/// total. Published: ≈ 767,736,994 short tons. Checked here: the
/// above-ground + below-ground carbon pool is computed from the FIA
/// pre-computed `CARBON_AG`/`CARBON_BG` columns (pounds converted to
/// short tons by dividing by 2000) rather than a flat 0.47 fraction of
/// biomass, per spec.md §4.6's explicit prohibition -- checked by
/// comparing the carbon total against the biomass total scaled by 0.47,
/// which must NOT match for this fixture's deliberately non-0.47 ratio.
#[test]
fn scenario_6_carbon_uses_precomputed_columns_not_a_flat_fraction() {
    let db = fixture();
    let est = Estimator::new(&db);
    let mut req = RequestBase::new(vec![41], Selector::MostRecent);
    req.land_type = LandType::Forest;
    req.totals = true;

    let carbon = est
        .biomass(&req, fia_estimation_engine::value::BiomassComponent::Total, true)
        .unwrap();
    let biomass = est
        .biomass(&req, fia_estimation_engine::value::BiomassComponent::Total, false)
        .unwrap();

    assert!(carbon.rows[0].estimate > 0.0);
    let flat_fraction_guess = 0.47 * biomass.rows[0].estimate;
    assert!((carbon.rows[0].estimate - flat_fraction_guess).abs() > 1.0);
}

/// Scenario 7 (spec.md §8): Missouri forest-area change by type group,
/// EVALID 292403. Published: oak/hickory ≈ 11,834,572 acres; nonstocked
/// ≈ 63,798 acres. Checked here: the round-trip invariant spec.md §8
/// names explicitly for area change -- `gross_gain - gross_loss = net`
/// -- holds for this fixture's transition matrix (which does record a
/// land-use transition on plot 3, unlike the all-static-diagonal
/// fixture used elsewhere in this repo's test suite); that the gain is
/// reported in population acres (expanded through `AREA_USED`/`EXPNS`,
/// not the bare `SUBPTYP_PROP_CHNG/4` proportion the transition row
/// carries); and that it can be broken out `by_forest_type_group` the
/// way the published figure is, per the scenario's own "by type group".
#[test]
fn scenario_7_area_change_gross_gain_minus_gross_loss_equals_net() {
    let db = fixture();
    let est = Estimator::new(&db);
    let req = RequestBase::new(vec![41], Selector::MostRecent);

    let net = est
        .area_change(&req, ChangeType::Net, AreaChangeMethod::TransitionMatrix, 5.0)
        .unwrap();
    let gain = est
        .area_change(&req, ChangeType::GrossGain, AreaChangeMethod::TransitionMatrix, 5.0)
        .unwrap();
    let loss = est
        .area_change(&req, ChangeType::GrossLoss, AreaChangeMethod::TransitionMatrix, 5.0)
        .unwrap();

    assert!((gain.rows[0].estimate - loss.rows[0].estimate - net.rows[0].estimate).abs() < 1.0);

    // Plot 3 is the fixture's only recorded transition: a full
    // subplot's worth of change (SUBPTYP_PROP_CHNG == 1.0), annualized
    // over a 5-year remeasurement period, expanded through the
    // stratum's single estimation unit (AREA_USED == 1,000,000 acres
    // over 4 plots). A dimensionless proportion would read ~0.05; the
    // population total should read in the thousands of acres.
    let expected_gain_acres = 1_000_000.0 * (1.0 / 4.0 / 5.0) / 4.0;
    assert!((gain.rows[0].estimate - expected_gain_acres).abs() / expected_gain_acres < 1e-9);
    assert!(gain.rows[0].estimate > 1000.0);

    let mut grouped_req = req.clone();
    grouped_req.group_by = vec![GroupBy::ByForestTypeGroup];
    let grouped_gain = est
        .area_change(&grouped_req, ChangeType::GrossGain, AreaChangeMethod::TransitionMatrix, 5.0)
        .unwrap();
    assert_eq!(grouped_gain.group_columns, vec!["FOREST_TYPE_GROUP".to_string()]);
    let grouped_total: f64 = grouped_gain.rows.iter().map(|r| r.estimate).sum();
    assert!((grouped_total - gain.rows[0].estimate).abs() / gain.rows[0].estimate < 1e-6);
}

/// GRM partition consistency (spec.md §8): the species-grouped growth
/// total (one component contribution per tree, dispatched through the
/// same `TREE_GRM_COMPONENT`/begin/midpoint join as every other GRM
/// call) sums back to the ungrouped total, the same property checked
/// for plain tree totals in scenario 2.
#[test]
fn grm_growth_grouped_by_species_sums_to_the_total() {
    let db = fixture();
    let est = Estimator::new(&db);
    let mut req = RequestBase::new(vec![41], Selector::MostRecent);
    req.totals = true;

    let ungrouped = est.growth(&req, Measure::VolumeNet, 5.0).unwrap();
    req.group_by = vec![GroupBy::BySpecies];
    let grouped = est.growth(&req, Measure::VolumeNet, 5.0).unwrap();

    let grouped_total: f64 = grouped.rows.iter().map(|r| r.estimate).sum();
    assert!(
        (grouped_total - ungrouped.rows[0].estimate).abs() / ungrouped.rows[0].estimate.max(1e-9) < 1e-6
    );
}
