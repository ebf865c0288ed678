//! L3: evaluation resolver. Turns a (state set, estimate type, selector)
//! request into the concrete set of EVALIDs that are statistically valid
//! to combine, per spec.md §4.1.

use std::collections::HashMap;

use crate::error::{EstimationError, Result};
use crate::table::schema::{PopEval, PopEvalTyp};

/// The estimate family an evaluation must support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvalType {
    Area,
    Volume,
    Growth,
    Removal,
    Mortality,
    Change,
}

impl EvalType {
    /// The `EVAL_TYP` string FIA stores for this family.
    pub fn code(&self) -> &'static str {
        match self {
            EvalType::Area => "EXPCURR",
            EvalType::Volume => "EXPVOL",
            EvalType::Growth => "EXPGROW",
            EvalType::Removal => "EXPREMV",
            EvalType::Mortality => "EXPMORT",
            EvalType::Change => "EXPCHNG",
        }
    }
}

/// How to narrow a (state, type) group of evaluations down to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// The evaluation with the greatest `END_INVYR`, ties broken by the
    /// greatest `EVALID`.
    MostRecent,
    /// The evaluation ending in a specific inventory year.
    Year(u32),
    /// A caller-supplied, pre-resolved set of EVALIDs. Skips the
    /// most-recent/year narrowing entirely.
    Explicit(Vec<u32>),
}

/// One resolved (state, evalid, type) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEvaluation {
    pub statecd: u32,
    pub evalid: u32,
    pub eval_type: EvalType,
    pub end_invyr: u32,
}

/// The output of `resolve`: one evaluation per (state, type) key, unioned
/// across the requested state set.
#[derive(Debug, Clone, Default)]
pub struct EvaluationSet {
    pub evaluations: Vec<ResolvedEvaluation>,
}

impl EvaluationSet {
    pub fn evalids(&self) -> Vec<u32> {
        self.evaluations.iter().map(|e| e.evalid).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }
}

/// Resolves a state set and estimate type to the evaluation(s) that
/// satisfy it, per spec.md §4.1. `pop_eval` and `pop_eval_typ` are the
/// decoded `POP_EVAL`/`POP_EVAL_TYP` tables (the join the contract
/// describes, `POP_EVAL x POP_EVAL_TYP` filtered by `eval_type`).
pub fn resolve(
    pop_eval: &[PopEval],
    pop_eval_typ: &[PopEvalTyp],
    states: &[u32],
    eval_type: EvalType,
    selector: &Selector,
) -> Result<EvaluationSet> {
    let type_code = eval_type.code();
    let eval_cns_of_type: std::collections::HashSet<i64> = pop_eval_typ
        .iter()
        .filter(|t| t.eval_typ == type_code)
        .map(|t| t.eval_cn)
        .collect();

    let candidates: Vec<&PopEval> = pop_eval
        .iter()
        .filter(|e| states.contains(&e.statecd) && eval_cns_of_type.contains(&e.cn))
        .collect();

    let selected: Vec<&PopEval> = match selector {
        Selector::Explicit(evalids) => candidates
            .into_iter()
            .filter(|e| evalids.contains(&e.evalid))
            .collect(),
        Selector::Year(year) => candidates
            .into_iter()
            .filter(|e| e.end_invyr == *year)
            .collect(),
        Selector::MostRecent => {
            let mut by_state: HashMap<u32, &PopEval> = HashMap::new();
            for e in candidates {
                by_state
                    .entry(e.statecd)
                    .and_modify(|best| {
                        if (e.end_invyr, e.evalid) > (best.end_invyr, best.evalid) {
                            *best = e;
                        }
                    })
                    .or_insert(e);
            }
            by_state.into_values().collect()
        }
    };

    if selected.is_empty() {
        return Err(EstimationError::NoMatchingEvaluation {
            states: states.iter().map(|s| s.to_string()).collect(),
            eval_type: type_code.to_string(),
        });
    }

    let mut seen: HashMap<u32, u32> = HashMap::new();
    for e in &selected {
        if let Some(&existing) = seen.get(&e.statecd) {
            if existing != e.evalid {
                return Err(EstimationError::InconsistentEvaluation {
                    state: e.statecd.to_string(),
                    eval_type: type_code.to_string(),
                    evalids: vec![existing, e.evalid],
                });
            }
        } else {
            seen.insert(e.statecd, e.evalid);
        }
    }

    let evaluations = selected
        .into_iter()
        .map(|e| ResolvedEvaluation {
            statecd: e.statecd,
            evalid: e.evalid,
            eval_type,
            end_invyr: e.end_invyr,
        })
        .collect();

    Ok(EvaluationSet { evaluations })
}
