//! `DataFrame` -> typed row decoding. The join planner (L6) and value
//! calculators (L7-L9) work against the structs in `schema`, not raw
//! frames; these functions are the one place that boundary is crossed.

use std::str::FromStr;

use polars::prelude::DataFrame;

use crate::error::{EstimationError, Result};
use crate::table::schema::*;

fn missing(table: &str, column: &str) -> EstimationError {
    EstimationError::DataError {
        table: table.to_string(),
        key: column.to_string(),
        detail: "unexpected null in a required column".to_string(),
    }
}

fn col_i64(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    Ok(df.column(name)?.i64()?.into_iter().collect())
}

fn col_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    Ok(df.column(name)?.f64()?.into_iter().collect())
}

fn col_u32(df: &DataFrame, name: &str) -> Result<Vec<Option<u32>>> {
    Ok(df
        .column(name)?
        .i64()?
        .into_iter()
        .map(|v| v.map(|x| x as u32))
        .collect())
}

fn col_str(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    Ok(df
        .column(name)?
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

fn require<T>(table: &str, column: &str, values: Vec<Option<T>>) -> Result<Vec<T>> {
    values
        .into_iter()
        .map(|v| v.ok_or_else(|| missing(table, column)))
        .collect()
}

pub fn decode_plot(df: &DataFrame) -> Result<Vec<Plot>> {
    let cn = require("PLOT", "CN", col_i64(df, "CN")?)?;
    let prev_plt_cn = col_i64(df, "PREV_PLT_CN")?;
    let macro_breakpoint_dia = col_f64(df, "MACRO_BREAKPOINT_DIA")?;
    let statecd = require("PLOT", "STATECD", col_u32(df, "STATECD")?)?;

    Ok((0..cn.len())
        .map(|i| Plot {
            cn: cn[i],
            prev_plt_cn: prev_plt_cn[i],
            macro_breakpoint_dia: macro_breakpoint_dia[i],
            statecd: statecd[i],
        })
        .collect())
}

pub fn decode_cond(df: &DataFrame) -> Result<Vec<Cond>> {
    let plt_cn = require("COND", "PLT_CN", col_i64(df, "PLT_CN")?)?;
    let condid = require("COND", "CONDID", col_u32(df, "CONDID")?)?;
    let condprop_unadj = require(
        "COND",
        "CONDPROP_UNADJ",
        col_f64(df, "CONDPROP_UNADJ")?,
    )?;
    let prop_basis_raw = require("COND", "PROP_BASIS", col_str(df, "PROP_BASIS")?)?;
    let cond_status_cd = require("COND", "COND_STATUS_CD", col_u32(df, "COND_STATUS_CD")?)?;
    let siteclcd = col_u32(df, "SITECLCD")?;
    let reservcd = require("COND", "RESERVCD", col_u32(df, "RESERVCD")?)?;
    let fortypcd = col_u32(df, "FORTYPCD")?;
    let prev_condid = col_u32(df, "PREV_CONDID")?;
    let sicond = col_f64(df, "SICOND")?;
    let sibase = col_u32(df, "SIBASE")?;

    let mut out = Vec::with_capacity(plt_cn.len());
    for i in 0..plt_cn.len() {
        out.push(Cond {
            plt_cn: plt_cn[i],
            condid: condid[i],
            condprop_unadj: condprop_unadj[i],
            prop_basis: PropBasis::from_str(&prop_basis_raw[i])?,
            cond_status_cd: cond_status_cd[i],
            siteclcd: siteclcd[i],
            reservcd: reservcd[i],
            fortypcd: fortypcd[i],
            prev_condid: prev_condid[i],
            sicond: sicond[i],
            sibase: sibase[i],
        });
    }
    Ok(out)
}

pub fn decode_tree(df: &DataFrame) -> Result<Vec<Tree>> {
    let cn = require("TREE", "CN", col_i64(df, "CN")?)?;
    let plt_cn = require("TREE", "PLT_CN", col_i64(df, "PLT_CN")?)?;
    let condid = require("TREE", "CONDID", col_u32(df, "CONDID")?)?;
    let statuscd = require("TREE", "STATUSCD", col_u32(df, "STATUSCD")?)?;
    let spcd = require("TREE", "SPCD", col_u32(df, "SPCD")?)?;
    let dia = col_f64(df, "DIA")?;
    let tpa_unadj = require("TREE", "TPA_UNADJ", col_f64(df, "TPA_UNADJ")?)?;
    let treeclcd = col_u32(df, "TREECLCD")?;
    let agentcd = col_u32(df, "AGENTCD")?;
    let volcfnet = col_f64(df, "VOLCFNET")?;
    let volcfgrs = col_f64(df, "VOLCFGRS")?;
    let volbfnet = col_f64(df, "VOLBFNET")?;
    let volcsnet = col_f64(df, "VOLCSNET")?;
    let drybio_ag = col_f64(df, "DRYBIO_AG")?;
    let drybio_bg = col_f64(df, "DRYBIO_BG")?;
    let carbon_ag = col_f64(df, "CARBON_AG")?;
    let carbon_bg = col_f64(df, "CARBON_BG")?;

    let mut out = Vec::with_capacity(cn.len());
    for i in 0..cn.len() {
        out.push(Tree {
            cn: cn[i],
            plt_cn: plt_cn[i],
            condid: condid[i],
            statuscd: statuscd[i],
            spcd: spcd[i],
            dia: dia[i],
            tpa_unadj: tpa_unadj[i],
            treeclcd: treeclcd[i],
            agentcd: agentcd[i],
            volcfnet: volcfnet[i],
            volcfgrs: volcfgrs[i],
            volbfnet: volbfnet[i],
            volcsnet: volcsnet[i],
            drybio_ag: drybio_ag[i],
            drybio_bg: drybio_bg[i],
            carbon_ag: carbon_ag[i],
            carbon_bg: carbon_bg[i],
        });
    }
    Ok(out)
}

pub fn decode_pop_eval(df: &DataFrame) -> Result<Vec<PopEval>> {
    let cn = require("POP_EVAL", "CN", col_i64(df, "CN")?)?;
    let evalid = require("POP_EVAL", "EVALID", col_u32(df, "EVALID")?)?;
    let statecd = require("POP_EVAL", "STATECD", col_u32(df, "STATECD")?)?;
    let end_invyr = require("POP_EVAL", "END_INVYR", col_u32(df, "END_INVYR")?)?;

    Ok((0..cn.len())
        .map(|i| PopEval {
            cn: cn[i],
            evalid: evalid[i],
            statecd: statecd[i],
            end_invyr: end_invyr[i],
        })
        .collect())
}

pub fn decode_pop_eval_typ(df: &DataFrame) -> Result<Vec<PopEvalTyp>> {
    let eval_cn = require("POP_EVAL_TYP", "EVAL_CN", col_i64(df, "EVAL_CN")?)?;
    let eval_typ = require("POP_EVAL_TYP", "EVAL_TYP", col_str(df, "EVAL_TYP")?)?;

    Ok((0..eval_cn.len())
        .map(|i| PopEvalTyp {
            eval_cn: eval_cn[i],
            eval_typ: eval_typ[i].clone(),
        })
        .collect())
}

pub fn decode_pop_estn_unit(df: &DataFrame) -> Result<Vec<PopEstnUnit>> {
    let cn = require("POP_ESTN_UNIT", "CN", col_i64(df, "CN")?)?;
    let eval_cn = require("POP_ESTN_UNIT", "EVAL_CN", col_i64(df, "EVAL_CN")?)?;
    let area_used = require("POP_ESTN_UNIT", "AREA_USED", col_f64(df, "AREA_USED")?)?;

    Ok((0..cn.len())
        .map(|i| PopEstnUnit {
            cn: cn[i],
            eval_cn: eval_cn[i],
            area_used: area_used[i],
        })
        .collect())
}

pub fn decode_pop_stratum(df: &DataFrame) -> Result<Vec<PopStratum>> {
    let cn = require("POP_STRATUM", "CN", col_i64(df, "CN")?)?;
    let estn_unit_cn = require(
        "POP_STRATUM",
        "ESTN_UNIT_CN",
        col_i64(df, "ESTN_UNIT_CN")?,
    )?;
    let p1pointcnt = require("POP_STRATUM", "P1POINTCNT", col_f64(df, "P1POINTCNT")?)?;
    let p2pointcnt = require("POP_STRATUM", "P2POINTCNT", col_u32(df, "P2POINTCNT")?)?;
    let expns = require("POP_STRATUM", "EXPNS", col_f64(df, "EXPNS")?)?;
    let adj_factor_micr = require(
        "POP_STRATUM",
        "ADJ_FACTOR_MICR",
        col_f64(df, "ADJ_FACTOR_MICR")?,
    )?;
    let adj_factor_subp = require(
        "POP_STRATUM",
        "ADJ_FACTOR_SUBP",
        col_f64(df, "ADJ_FACTOR_SUBP")?,
    )?;
    let adj_factor_macr = require(
        "POP_STRATUM",
        "ADJ_FACTOR_MACR",
        col_f64(df, "ADJ_FACTOR_MACR")?,
    )?;

    Ok((0..cn.len())
        .map(|i| PopStratum {
            cn: cn[i],
            estn_unit_cn: estn_unit_cn[i],
            p1pointcnt: p1pointcnt[i],
            p2pointcnt: p2pointcnt[i],
            expns: expns[i],
            adj_factor_micr: adj_factor_micr[i],
            adj_factor_subp: adj_factor_subp[i],
            adj_factor_macr: adj_factor_macr[i],
        })
        .collect())
}

pub fn decode_ppsa(df: &DataFrame) -> Result<Vec<Ppsa>> {
    let plt_cn = require(
        "POP_PLOT_STRATUM_ASSGN",
        "PLT_CN",
        col_i64(df, "PLT_CN")?,
    )?;
    let stratum_cn = require(
        "POP_PLOT_STRATUM_ASSGN",
        "STRATUM_CN",
        col_i64(df, "STRATUM_CN")?,
    )?;
    let evalid = require("POP_PLOT_STRATUM_ASSGN", "EVALID", col_u32(df, "EVALID")?)?;

    Ok((0..plt_cn.len())
        .map(|i| Ppsa {
            plt_cn: plt_cn[i],
            stratum_cn: stratum_cn[i],
            evalid: evalid[i],
        })
        .collect())
}

pub fn decode_grm_component(df: &DataFrame) -> Result<Vec<GrmComponent>> {
    let tre_cn = require(
        "TREE_GRM_COMPONENT",
        "TRE_CN",
        col_i64(df, "TRE_CN")?,
    )?;
    let subptyp_grm = require(
        "TREE_GRM_COMPONENT",
        "SUBPTYP_GRM",
        col_u32(df, "SUBPTYP_GRM")?,
    )?;
    let component = require("TREE_GRM_COMPONENT", "COMPONENT", col_str(df, "COMPONENT")?)?;
    let tpagrow_unadj = col_f64(df, "TPAGROW_UNADJ")?;
    let tpamort_unadj = col_f64(df, "TPAMORT_UNADJ")?;
    let tparemv_unadj = col_f64(df, "TPAREMV_UNADJ")?;

    Ok((0..tre_cn.len())
        .map(|i| GrmComponent {
            tre_cn: tre_cn[i],
            subptyp_grm: subptyp_grm[i],
            component: component[i].clone(),
            tpagrow_unadj: tpagrow_unadj[i],
            tpamort_unadj: tpamort_unadj[i],
            tparemv_unadj: tparemv_unadj[i],
        })
        .collect())
}

pub fn decode_grm_begin(df: &DataFrame) -> Result<Vec<GrmBegin>> {
    let tre_cn = require(
        "TREE_GRM_BEGIN",
        "TRE_CN",
        col_i64(df, "TRE_CN")?,
    )?;
    let volcfnet = col_f64(df, "VOLCFNET")?;
    let drybio_ag = col_f64(df, "DRYBIO_AG")?;
    let dia = col_f64(df, "DIA")?;

    Ok((0..tre_cn.len())
        .map(|i| GrmBegin {
            tre_cn: tre_cn[i],
            volcfnet: volcfnet[i],
            drybio_ag: drybio_ag[i],
            dia: dia[i],
        })
        .collect())
}

pub fn decode_grm_midpt(df: &DataFrame) -> Result<Vec<GrmMidpt>> {
    let tre_cn = require(
        "TREE_GRM_MIDPT",
        "TRE_CN",
        col_i64(df, "TRE_CN")?,
    )?;
    let volcfnet = col_f64(df, "VOLCFNET")?;
    let drybio_ag = col_f64(df, "DRYBIO_AG")?;
    let dia = col_f64(df, "DIA")?;

    Ok((0..tre_cn.len())
        .map(|i| GrmMidpt {
            tre_cn: tre_cn[i],
            volcfnet: volcfnet[i],
            drybio_ag: drybio_ag[i],
            dia: dia[i],
        })
        .collect())
}

pub fn decode_subp_cond_chng_mtrx(df: &DataFrame) -> Result<Vec<SubpCondChngMtrx>> {
    let plt_cn = require(
        "SUBP_COND_CHNG_MTRX",
        "PLT_CN",
        col_i64(df, "PLT_CN")?,
    )?;
    let prev_plt_cn = require(
        "SUBP_COND_CHNG_MTRX",
        "PREV_PLT_CN",
        col_i64(df, "PREV_PLT_CN")?,
    )?;
    let condid = require("SUBP_COND_CHNG_MTRX", "CONDID", col_u32(df, "CONDID")?)?;
    let prevcond = require("SUBP_COND_CHNG_MTRX", "PREVCOND", col_u32(df, "PREVCOND")?)?;
    let subptyp_prop_chng = require(
        "SUBP_COND_CHNG_MTRX",
        "SUBPTYP_PROP_CHNG",
        col_f64(df, "SUBPTYP_PROP_CHNG")?,
    )?;

    Ok((0..plt_cn.len())
        .map(|i| SubpCondChngMtrx {
            plt_cn: plt_cn[i],
            prev_plt_cn: prev_plt_cn[i],
            condid: condid[i],
            prevcond: prevcond[i],
            subptyp_prop_chng: subptyp_prop_chng[i],
        })
        .collect())
}

pub fn decode_begin_end(df: &DataFrame) -> Result<Vec<BeginEnd>> {
    let oneortwo = require("BEGINEND", "ONEORTWO", col_u32(df, "ONEORTWO")?)?;
    Ok(oneortwo.into_iter().map(|oneortwo| BeginEnd { oneortwo }).collect())
}
