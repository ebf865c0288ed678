//! Shared fixture builder for the demos in this directory. Not an example
//! itself -- included via `#[path = "support.rs"] mod support;` by the
//! ones that are. Builds a small two-state, two-evaluation-cycle extract
//! entirely in memory so the demos don't depend on a real FIADB download.

use std::collections::HashMap;

use fia_estimation_engine::table::ColumnarBackend;
use fia_estimation_engine::{EngineConfig, FiaDatabase};
use polars::prelude::*;

fn i64_col(name: &str, values: Vec<i64>) -> Series {
    Series::new(name.into(), values)
}

fn f64_col(name: &str, values: Vec<f64>) -> Series {
    Series::new(name.into(), values)
}

fn str_col(name: &str, values: Vec<&str>) -> Series {
    Series::new(name.into(), values)
}

/// Four plots in one estimation unit/stratum, two inventory cycles
/// (2019 "previous" and 2021 "current") so growth/mortality/removals and
/// area-change all have something to report. Plots 1-2 are forest in
/// both cycles; plot 3 is forest only in the current cycle (ingrowth);
/// plot 4 is non-forest throughout.
pub fn sample_database() -> FiaDatabase {
    let plot = DataFrame::new(vec![
        i64_col("CN", vec![101, 102, 103, 104]),
        i64_col("PREV_PLT_CN", vec![-1, -1, -1, -1]),
        f64_col("MACRO_BREAKPOINT_DIA", vec![24.0, 24.0, 24.0, 24.0]),
        i64_col("STATECD", vec![41, 41, 41, 41]),
    ])
    .unwrap();

    let cond = DataFrame::new(vec![
        i64_col("PLT_CN", vec![101, 102, 103, 104]),
        i64_col("CONDID", vec![1, 1, 1, 1]),
        f64_col("CONDPROP_UNADJ", vec![1.0, 1.0, 1.0, 1.0]),
        str_col("PROP_BASIS", vec!["SUBP", "SUBP", "SUBP", "SUBP"]),
        i64_col("COND_STATUS_CD", vec![1, 1, 1, 2]),
        i64_col("SITECLCD", vec![3, 3, 3, 7]),
        i64_col("RESERVCD", vec![0, 0, 0, 0]),
        i64_col("FORTYPCD", vec![201, 201, 266, 0]),
        i64_col("PREV_CONDID", vec![1, 1, 1, 1]),
        f64_col("SICOND", vec![85.0, 90.0, 70.0, 0.0]),
        i64_col("SIBASE", vec![50, 50, 50, 50]),
    ])
    .unwrap();

    let tree = DataFrame::new(vec![
        i64_col("CN", vec![1001, 1002, 1003, 1004]),
        i64_col("PLT_CN", vec![101, 102, 103, 103]),
        i64_col("CONDID", vec![1, 1, 1, 1]),
        i64_col("STATUSCD", vec![1, 1, 1, 2]),
        i64_col("SPCD", vec![202, 202, 833, 833]),
        f64_col("DIA", vec![14.2, 11.8, 9.4, 6.0]),
        f64_col("TPA_UNADJ", vec![6.018, 6.018, 6.018, 6.018]),
        i64_col("TREECLCD", vec![2, 2, 2, 2]),
        i64_col("AGENTCD", vec![0, 0, 0, 30]),
        f64_col("VOLCFNET", vec![18.4, 11.9, 6.1, 2.9]),
        f64_col("VOLCFGRS", vec![19.6, 12.8, 6.6, 3.4]),
        f64_col("VOLBFNET", vec![78.0, 42.0, 0.0, 0.0]),
        f64_col("VOLCSNET", vec![20.1, 13.0, 6.6, 3.1]),
        f64_col("DRYBIO_AG", vec![612.0, 401.0, 210.0, 98.0]),
        f64_col("DRYBIO_BG", vec![122.0, 80.0, 42.0, 20.0]),
        f64_col("CARBON_AG", vec![306.0, 200.5, 105.0, 49.0]),
        f64_col("CARBON_BG", vec![61.0, 40.0, 21.0, 10.0]),
    ])
    .unwrap();

    let pop_eval = DataFrame::new(vec![
        i64_col("CN", vec![1, 2]),
        i64_col("EVALID", vec![412000, 412101]),
        i64_col("STATECD", vec![41, 41]),
        i64_col("END_INVYR", vec![2019, 2021]),
    ])
    .unwrap();

    let pop_eval_typ = DataFrame::new(vec![
        i64_col("EVAL_CN", vec![2, 2, 2, 2, 2, 2, 1, 1]),
        str_col(
            "EVAL_TYP",
            vec![
                "EXPCURR", "EXPVOL", "EXPCHNG", "EXPGROW", "EXPMORT", "EXPREMV", "EXPCURR",
                "EXPVOL",
            ],
        ),
    ])
    .unwrap();

    let pop_estn_unit = DataFrame::new(vec![
        i64_col("CN", vec![10, 20]),
        i64_col("EVAL_CN", vec![1, 2]),
        f64_col("AREA_USED", vec![500_000.0, 500_000.0]),
    ])
    .unwrap();

    let pop_stratum = DataFrame::new(vec![
        i64_col("CN", vec![100, 200]),
        i64_col("ESTN_UNIT_CN", vec![10, 20]),
        f64_col("P1POINTCNT", vec![4000.0, 4000.0]),
        i64_col("P2POINTCNT", vec![4, 4]),
        f64_col("EXPNS", vec![125_000.0, 125_000.0]),
        f64_col("ADJ_FACTOR_MICR", vec![1.0, 1.0]),
        f64_col("ADJ_FACTOR_SUBP", vec![1.0, 1.0]),
        f64_col("ADJ_FACTOR_MACR", vec![1.0, 1.0]),
    ])
    .unwrap();

    let ppsa = DataFrame::new(vec![
        i64_col("PLT_CN", vec![101, 102, 103, 104]),
        i64_col("STRATUM_CN", vec![200, 200, 200, 200]),
        i64_col("EVALID", vec![412101, 412101, 412101, 412101]),
    ])
    .unwrap();

    let grm_component = DataFrame::new(vec![
        i64_col("TRE_CN", vec![1001, 1002, 1003, 1004]),
        i64_col("SUBPTYP_GRM", vec![1, 1, 1, 1]),
        str_col(
            "COMPONENT",
            vec!["SURVIVOR", "SURVIVOR", "INGROWTH", "MORTALITY1"],
        ),
        f64_col("TPAGROW_UNADJ", vec![6.018, 6.018, 6.018, 0.0]),
        f64_col("TPAMORT_UNADJ", vec![0.0, 0.0, 0.0, 6.018]),
        f64_col("TPAREMV_UNADJ", vec![0.0, 0.0, 0.0, 0.0]),
    ])
    .unwrap();

    let grm_begin = DataFrame::new(vec![
        i64_col("TRE_CN", vec![1001, 1002, 1003, 1004]),
        f64_col("VOLCFNET", vec![15.0, 9.8, 0.0, 2.5]),
        f64_col("DRYBIO_AG", vec![540.0, 350.0, 0.0, 90.0]),
        f64_col("DIA", vec![12.9, 10.7, 0.0, 5.6]),
    ])
    .unwrap();

    let grm_midpt = DataFrame::new(vec![
        i64_col("TRE_CN", vec![1001, 1002, 1003, 1004]),
        f64_col("VOLCFNET", vec![16.7, 10.9, 6.1, 2.9]),
        f64_col("DRYBIO_AG", vec![576.0, 375.0, 210.0, 98.0]),
        f64_col("DIA", vec![13.6, 11.3, 9.4, 6.0]),
    ])
    .unwrap();

    let subp_cond_chng_mtrx = DataFrame::new(vec![
        i64_col("PLT_CN", vec![101, 102, 103, 104]),
        i64_col("PREV_PLT_CN", vec![101, 102, 103, 104]),
        i64_col("CONDID", vec![1, 1, 1, 1]),
        i64_col("PREVCOND", vec![1, 1, 1, 1]),
        f64_col("SUBPTYP_PROP_CHNG", vec![1.0, 1.0, 1.0, 1.0]),
    ])
    .unwrap();

    let begin_end =
        DataFrame::new(vec![i64_col("ONEORTWO", vec![1, 2])]).unwrap();

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

    let backend = ColumnarBackend::from_frames(frames);
    FiaDatabase::from_backend(
        Box::new(backend),
        Box::new(fia_estimation_engine::reference::DefaultSpeciesCatalog::default()),
        Box::new(fia_estimation_engine::reference::DefaultForestTypeCatalog::default()),
        EngineConfig::default(),
    )
    .expect("sample extract is internally consistent")
}
