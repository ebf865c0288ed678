//! Format conversion example: the same small extract loaded through both
//! L2 backends -- the preferred columnar (Polars) backend and the
//! compatibility (SQLite) backend -- to show they agree on the resulting
//! estimate. A caller switches between them by pointing `FiaDatabase::open`
//! at a directory of Parquet files or a single `.sqlite` file; this demo
//! builds both by hand so it has no on-disk fixture to ship.
//!
//! Run from the project root:
//!   cargo run --example format_conversion

use std::collections::HashMap;

use fia_estimation_engine::estimator::{Estimator, RequestBase};
use fia_estimation_engine::eval::Selector;
use fia_estimation_engine::table::{CompatBackend, ColumnarBackend};
use fia_estimation_engine::{EngineConfig, FiaDatabase};
use polars::prelude::*;
use rusqlite::Connection;

fn columnar_db() -> FiaDatabase {
    let plot = DataFrame::new(vec![
        Series::new("CN".into(), vec![1i64, 2]),
        Series::new("PREV_PLT_CN".into(), vec![-1i64, -1]),
        Series::new("MACRO_BREAKPOINT_DIA".into(), vec![24.0, 24.0]),
        Series::new("STATECD".into(), vec![41i64, 41]),
    ])
    .unwrap();
    let cond = DataFrame::new(vec![
        Series::new("PLT_CN".into(), vec![1i64, 2]),
        Series::new("CONDID".into(), vec![1i64, 1]),
        Series::new("CONDPROP_UNADJ".into(), vec![1.0, 1.0]),
        Series::new("PROP_BASIS".into(), vec!["SUBP", "SUBP"]),
        Series::new("COND_STATUS_CD".into(), vec![1i64, 1]),
        Series::new("SITECLCD".into(), vec![3i64, 3]),
        Series::new("RESERVCD".into(), vec![0i64, 0]),
        Series::new("FORTYPCD".into(), vec![201i64, 201]),
        Series::new("PREV_CONDID".into(), vec![1i64, 1]),
        Series::new("SICOND".into(), vec![85.0, 90.0]),
        Series::new("SIBASE".into(), vec![50i64, 50]),
    ])
    .unwrap();
    let tree = DataFrame::new(vec![
        Series::new("CN".into(), vec![10i64, 11]),
        Series::new("PLT_CN".into(), vec![1i64, 2]),
        Series::new("CONDID".into(), vec![1i64, 1]),
        Series::new("STATUSCD".into(), vec![1i64, 1]),
        Series::new("SPCD".into(), vec![202i64, 202]),
        Series::new("DIA".into(), vec![14.2, 11.8]),
        Series::new("TPA_UNADJ".into(), vec![6.018, 6.018]),
        Series::new("TREECLCD".into(), vec![2i64, 2]),
        Series::new("AGENTCD".into(), vec![0i64, 0]),
        Series::new("VOLCFNET".into(), vec![18.4, 11.9]),
        Series::new("VOLCFGRS".into(), vec![19.6, 12.8]),
        Series::new("VOLBFNET".into(), vec![78.0, 42.0]),
        Series::new("VOLCSNET".into(), vec![20.1, 13.0]),
        Series::new("DRYBIO_AG".into(), vec![612.0, 401.0]),
        Series::new("DRYBIO_BG".into(), vec![122.0, 80.0]),
        Series::new("CARBON_AG".into(), vec![306.0, 200.5]),
        Series::new("CARBON_BG".into(), vec![61.0, 40.0]),
    ])
    .unwrap();
    let pop_eval = DataFrame::new(vec![
        Series::new("CN".into(), vec![1i64]),
        Series::new("EVALID".into(), vec![412101i64]),
        Series::new("STATECD".into(), vec![41i64]),
        Series::new("END_INVYR".into(), vec![2021i64]),
    ])
    .unwrap();
    let pop_eval_typ = DataFrame::new(vec![
        Series::new("EVAL_CN".into(), vec![1i64]),
        Series::new("EVAL_TYP".into(), vec!["EXPCURR"]),
    ])
    .unwrap();
    let pop_estn_unit = DataFrame::new(vec![
        Series::new("CN".into(), vec![100i64]),
        Series::new("EVAL_CN".into(), vec![1i64]),
        Series::new("AREA_USED".into(), vec![250_000.0]),
    ])
    .unwrap();
    let pop_stratum = DataFrame::new(vec![
        Series::new("CN".into(), vec![1000i64]),
        Series::new("ESTN_UNIT_CN".into(), vec![100i64]),
        Series::new("P1POINTCNT".into(), vec![2000.0]),
        Series::new("P2POINTCNT".into(), vec![2i64]),
        Series::new("EXPNS".into(), vec![125_000.0]),
        Series::new("ADJ_FACTOR_MICR".into(), vec![1.0]),
        Series::new("ADJ_FACTOR_SUBP".into(), vec![1.0]),
        Series::new("ADJ_FACTOR_MACR".into(), vec![1.0]),
    ])
    .unwrap();
    let ppsa = DataFrame::new(vec![
        Series::new("PLT_CN".into(), vec![1i64, 2]),
        Series::new("STRATUM_CN".into(), vec![1000i64, 1000]),
        Series::new("EVALID".into(), vec![412101i64, 412101]),
    ])
    .unwrap();
    let empty_grm_component = DataFrame::new(vec![
        Series::new("TRE_CN".into(), Vec::<i64>::new()),
        Series::new("SUBPTYP_GRM".into(), Vec::<i64>::new()),
        Series::new("COMPONENT".into(), Vec::<&str>::new()),
        Series::new("TPAGROW_UNADJ".into(), Vec::<f64>::new()),
        Series::new("TPAMORT_UNADJ".into(), Vec::<f64>::new()),
        Series::new("TPAREMV_UNADJ".into(), Vec::<f64>::new()),
    ])
    .unwrap();
    let empty_grm_tree = DataFrame::new(vec![
        Series::new("TRE_CN".into(), Vec::<i64>::new()),
        Series::new("VOLCFNET".into(), Vec::<f64>::new()),
        Series::new("DRYBIO_AG".into(), Vec::<f64>::new()),
        Series::new("DIA".into(), Vec::<f64>::new()),
    ])
    .unwrap();
    let empty_chng = DataFrame::new(vec![
        Series::new("PLT_CN".into(), Vec::<i64>::new()),
        Series::new("PREV_PLT_CN".into(), Vec::<i64>::new()),
        Series::new("CONDID".into(), Vec::<i64>::new()),
        Series::new("PREVCOND".into(), Vec::<i64>::new()),
        Series::new("SUBPTYP_PROP_CHNG".into(), Vec::<f64>::new()),
    ])
    .unwrap();
    let empty_begin_end = DataFrame::new(vec![Series::new("ONEORTWO".into(), Vec::<i64>::new())]).unwrap();

    let mut frames: HashMap<&'static str, DataFrame> = HashMap::new();
    frames.insert("PLOT", plot);
    frames.insert("COND", cond);
    frames.insert("TREE", tree);
    frames.insert("POP_EVAL", pop_eval);
    frames.insert("POP_EVAL_TYP", pop_eval_typ);
    frames.insert("POP_ESTN_UNIT", pop_estn_unit);
    frames.insert("POP_STRATUM", pop_stratum);
    frames.insert("POP_PLOT_STRATUM_ASSGN", ppsa);
    frames.insert("TREE_GRM_COMPONENT", empty_grm_component);
    frames.insert("TREE_GRM_BEGIN", empty_grm_tree.clone());
    frames.insert("TREE_GRM_MIDPT", empty_grm_tree);
    frames.insert("SUBP_COND_CHNG_MTRX", empty_chng);
    frames.insert("BEGINEND", empty_begin_end);

    FiaDatabase::from_backend(
        Box::new(ColumnarBackend::from_frames(frames)),
        Box::new(fia_estimation_engine::reference::DefaultSpeciesCatalog::default()),
        Box::new(fia_estimation_engine::reference::DefaultForestTypeCatalog::default()),
        EngineConfig::default(),
    )
    .expect("columnar extract is internally consistent")
}

/// The same two-plot extract, laid out as tables in an in-memory SQLite
/// connection instead of Polars frames -- the shape a caller handed a raw
/// FIADB `.sqlite` snapshot actually has.
fn compat_db() -> FiaDatabase {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE PLOT (CN INTEGER, PREV_PLT_CN INTEGER, MACRO_BREAKPOINT_DIA REAL, STATECD INTEGER);
         INSERT INTO PLOT VALUES (1, -1, 24.0, 41), (2, -1, 24.0, 41);

         CREATE TABLE COND (PLT_CN INTEGER, CONDID INTEGER, CONDPROP_UNADJ REAL, PROP_BASIS TEXT,
             COND_STATUS_CD INTEGER, SITECLCD INTEGER, RESERVCD INTEGER, FORTYPCD INTEGER,
             PREV_CONDID INTEGER, SICOND REAL, SIBASE INTEGER);
         INSERT INTO COND VALUES (1, 1, 1.0, 'SUBP', 1, 3, 0, 201, 1, 85.0, 50),
                                  (2, 1, 1.0, 'SUBP', 1, 3, 0, 201, 1, 90.0, 50);

         CREATE TABLE TREE (CN INTEGER, PLT_CN INTEGER, CONDID INTEGER, STATUSCD INTEGER, SPCD INTEGER,
             DIA REAL, TPA_UNADJ REAL, TREECLCD INTEGER, AGENTCD INTEGER, VOLCFNET REAL, VOLCFGRS REAL,
             VOLBFNET REAL, VOLCSNET REAL, DRYBIO_AG REAL, DRYBIO_BG REAL, CARBON_AG REAL, CARBON_BG REAL);
         INSERT INTO TREE VALUES
             (10, 1, 1, 1, 202, 14.2, 6.018, 2, 0, 18.4, 19.6, 78.0, 20.1, 612.0, 122.0, 306.0, 61.0),
             (11, 2, 1, 1, 202, 11.8, 6.018, 2, 0, 11.9, 12.8, 42.0, 13.0, 401.0, 80.0, 200.5, 40.0);

         CREATE TABLE POP_EVAL (CN INTEGER, EVALID INTEGER, STATECD INTEGER, END_INVYR INTEGER);
         INSERT INTO POP_EVAL VALUES (1, 412101, 41, 2021);

         CREATE TABLE POP_EVAL_TYP (EVAL_CN INTEGER, EVAL_TYP TEXT);
         INSERT INTO POP_EVAL_TYP VALUES (1, 'EXPCURR');

         CREATE TABLE POP_ESTN_UNIT (CN INTEGER, EVAL_CN INTEGER, AREA_USED REAL);
         INSERT INTO POP_ESTN_UNIT VALUES (100, 1, 250000.0);

         CREATE TABLE POP_STRATUM (CN INTEGER, ESTN_UNIT_CN INTEGER, P1POINTCNT REAL, P2POINTCNT INTEGER,
             EXPNS REAL, ADJ_FACTOR_MICR REAL, ADJ_FACTOR_SUBP REAL, ADJ_FACTOR_MACR REAL);
         INSERT INTO POP_STRATUM VALUES (1000, 100, 2000.0, 2, 125000.0, 1.0, 1.0, 1.0);

         CREATE TABLE POP_PLOT_STRATUM_ASSGN (PLT_CN INTEGER, STRATUM_CN INTEGER, EVALID INTEGER);
         INSERT INTO POP_PLOT_STRATUM_ASSGN VALUES (1, 1000, 412101), (2, 1000, 412101);

         CREATE TABLE TREE_GRM_COMPONENT (TRE_CN INTEGER, SUBPTYP_GRM INTEGER, COMPONENT TEXT,
             TPAGROW_UNADJ REAL, TPAMORT_UNADJ REAL, TPAREMV_UNADJ REAL);
         CREATE TABLE TREE_GRM_BEGIN (TRE_CN INTEGER, VOLCFNET REAL, DRYBIO_AG REAL, DIA REAL);
         CREATE TABLE TREE_GRM_MIDPT (TRE_CN INTEGER, VOLCFNET REAL, DRYBIO_AG REAL, DIA REAL);
         CREATE TABLE SUBP_COND_CHNG_MTRX (PLT_CN INTEGER, PREV_PLT_CN INTEGER, CONDID INTEGER,
             PREVCOND INTEGER, SUBPTYP_PROP_CHNG REAL);
         CREATE TABLE BEGINEND (ONEORTWO INTEGER);",
    )
    .expect("fixture DDL/inserts are well-formed");

    FiaDatabase::from_backend(
        Box::new(CompatBackend::from_connection(conn)),
        Box::new(fia_estimation_engine::reference::DefaultSpeciesCatalog::default()),
        Box::new(fia_estimation_engine::reference::DefaultForestTypeCatalog::default()),
        EngineConfig::default(),
    )
    .expect("compat extract is internally consistent")
}

fn main() {
    let req = RequestBase::new(vec![41], Selector::MostRecent);

    let columnar = Estimator::new(&columnar_db()).area(&req).expect("columnar area estimate");
    let compat = Estimator::new(&compat_db()).area(&req).expect("compat area estimate");

    println!("columnar backend: {:.2} acres", columnar.rows[0].estimate);
    println!("compat backend:   {:.2} acres", compat.rows[0].estimate);
    assert!((columnar.rows[0].estimate - compat.rows[0].estimate).abs() < 1e-6);
    println!("backends agree");
}
