//! L10: output shaper. Group-by expansion, naming, and the
//! standard-error/CI/CV derivation of spec.md §6.2's result frame. This
//! is the last stage before a result leaves the orchestrator (L12); it
//! never filters rows (spec.md §4.7's "no row-level filtering after the
//! PlotAggregated -> Stratified barrier" applies transitively here too).

use std::collections::HashMap;

use crate::estimate::{self, EstimateResult};
use crate::join::{JoinedCondRow, JoinedTreeRow, PlotMeta};
use crate::reference::ForestTypeCatalog;
use crate::value::RowValue;

/// A single group-by key's resolved value for one row. Kept as a small
/// closed enum rather than a string so two groups with the numerically
/// equal but differently-typed keys never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupValue {
    Num(i64),
    Text(String),
}

impl std::fmt::Display for GroupValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupValue::Num(n) => write!(f, "{n}"),
            GroupValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Diameter-class grouping variant for `by_size_class`, per spec.md
/// §6.3. Breakpoints are this crate's own choice (the spec names the
/// three variants but not their exact class boundaries); see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClassKind {
    /// Two-inch diameter classes labeled by their lower bound: 1, 3, 5,
    /// ..., 29 (the last class is open-ended, ">=29").
    Standard,
    /// FIA's familiar seedling/sapling/poletimber/sawtimber bands.
    Descriptive,
    /// A coarse merchantability split used by volume-by-market reports.
    Market,
}

/// Resolves a diameter to its class label under `kind`.
pub fn size_class_label(dia: f64, kind: SizeClassKind) -> GroupValue {
    match kind {
        SizeClassKind::Standard => {
            let lower = if dia < 1.0 {
                1
            } else {
                (((dia - 1.0) / 2.0).floor() as i64) * 2 + 1
            };
            GroupValue::Num(lower.min(29))
        }
        SizeClassKind::Descriptive => GroupValue::Text(
            if dia < 1.0 {
                "seedling"
            } else if dia < 5.0 {
                "sapling"
            } else if dia < 9.0 {
                "poletimber"
            } else if dia < 20.0 {
                "small sawtimber"
            } else {
                "large sawtimber"
            }
            .to_string(),
        ),
        SizeClassKind::Market => GroupValue::Text(
            if dia < 5.0 {
                "non-merchantable"
            } else if dia < 9.0 {
                "pulpwood"
            } else {
                "sawtimber"
            }
            .to_string(),
        ),
    }
}

/// A `by_species`/`by_size_class`/`by_forest_type_group` shortcut, or a
/// raw column name, per spec.md §6.3's group-by specification.
#[derive(Debug, Clone)]
pub enum GroupBy {
    Column(String),
    BySpecies,
    BySizeClass(SizeClassKind),
    ByForestTypeGroup,
}

/// Resolves a `GroupBy` spec against an already-joined row. Implemented
/// for both tree- and condition-level rows since a group-by spec is
/// evaluated once per entity kind within a single request.
pub trait Groupable {
    fn group_value(&self, key: &GroupBy, forest_types: &dyn ForestTypeCatalog) -> Option<GroupValue>;
}

impl Groupable for JoinedTreeRow {
    fn group_value(&self, key: &GroupBy, forest_types: &dyn ForestTypeCatalog) -> Option<GroupValue> {
        match key {
            GroupBy::Column(name) => match name.as_str() {
                "SPCD" => Some(GroupValue::Num(self.spcd as i64)),
                "STATUSCD" => Some(GroupValue::Num(self.statuscd as i64)),
                "TREECLCD" => self.treeclcd.map(|v| GroupValue::Num(v as i64)),
                "FORTYPCD" => self.fortypcd.map(|v| GroupValue::Num(v as i64)),
                "COND_STATUS_CD" => Some(GroupValue::Num(self.cond_status_cd as i64)),
                _ => None,
            },
            GroupBy::BySpecies => Some(GroupValue::Num(self.spcd as i64)),
            GroupBy::BySizeClass(kind) => self.dia.map(|d| size_class_label(d, *kind)),
            GroupBy::ByForestTypeGroup => self
                .fortypcd
                .and_then(|f| forest_types.group_for(f))
                .map(|g| GroupValue::Text(g.name.to_string())),
        }
    }
}

impl Groupable for JoinedCondRow {
    fn group_value(&self, key: &GroupBy, forest_types: &dyn ForestTypeCatalog) -> Option<GroupValue> {
        match key {
            GroupBy::Column(name) => match name.as_str() {
                "FORTYPCD" => self.fortypcd.map(|v| GroupValue::Num(v as i64)),
                "COND_STATUS_CD" => Some(GroupValue::Num(self.cond_status_cd as i64)),
                "SIBASE" => self.sibase.map(|v| GroupValue::Num(v as i64)),
                _ => None,
            },
            GroupBy::BySpecies => None,
            GroupBy::BySizeClass(_) => None,
            GroupBy::ByForestTypeGroup => self
                .fortypcd
                .and_then(|f| forest_types.group_for(f))
                .map(|g| GroupValue::Text(g.name.to_string())),
        }
    }
}

/// One row's expanded value plus the group key it was assigned and
/// enough identity to count distinct conditions per group.
#[derive(Debug, Clone)]
pub struct ValuedRow {
    pub group: Vec<GroupValue>,
    pub plt_cn: i64,
    pub condid: Option<u32>,
    pub value: RowValue,
}

/// One reported group: the columns of spec.md §6.2 plus the group-key
/// values in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub group: Vec<GroupValue>,
    pub year: u32,
    pub value_column: &'static str,
    pub estimate: f64,
    pub se: f64,
    pub variance: f64,
    pub cv: Option<f64>,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub n_plots: u32,
    pub n_conditions: Option<u32>,
}

/// The full tabular result of one estimator call, per spec.md §6.2.
#[derive(Debug, Clone, Default)]
pub struct ResultFrame {
    pub group_columns: Vec<String>,
    pub rows: Vec<ResultRow>,
    /// Tier-3 numeric degeneracies (spec.md §7): empty domains, strata
    /// with `n_h <= 1` everywhere in a group, zero denominators. Attached
    /// rather than thrown.
    pub warnings: Vec<String>,
}

/// Groups `rows` by their assigned key, runs L8's ratio-of-means
/// estimator per group, and assembles a `ResultFrame`. Domain-indicator
/// zeroing must already have happened upstream (L5/L7) -- this function
/// performs no filtering of its own, per spec.md §4.7's barrier.
pub fn group_and_estimate(
    group_columns: Vec<String>,
    rows: &[ValuedRow],
    plot_meta: &HashMap<i64, PlotMeta>,
    as_ratio: bool,
    value_column: &'static str,
    year: u32,
) -> crate::error::Result<ResultFrame> {
    let mut by_group: HashMap<Vec<GroupValue>, Vec<&ValuedRow>> = HashMap::new();
    for row in rows {
        by_group.entry(row.group.clone()).or_default().push(row);
    }

    let mut groups: Vec<Vec<GroupValue>> = by_group.keys().cloned().collect();
    groups.sort();

    let mut out = ResultFrame { group_columns, rows: Vec::with_capacity(groups.len()), warnings: Vec::new() };

    for group in groups {
        let members = &by_group[&group];
        let values: Vec<RowValue> = members.iter().map(|r| r.value).collect();
        let has_conditions = members.iter().any(|r| r.condid.is_some());
        let n_conditions = has_conditions.then(|| {
            members
                .iter()
                .filter_map(|r| r.condid.map(|c| (r.plt_cn, c)))
                .collect::<std::collections::HashSet<_>>()
                .len() as u32
        });

        let EstimateResult { estimate, variance, se, cv, ci_lower, ci_upper, n_plots, warnings } =
            estimate::estimate(&values, plot_meta, as_ratio)?;
        out.warnings.extend(warnings);

        if n_plots == 0 {
            out.warnings.push(format!(
                "group {:?}: no plots contributed to this estimate",
                group.iter().map(|g| g.to_string()).collect::<Vec<_>>()
            ));
        }

        out.rows.push(ResultRow {
            group,
            year,
            value_column,
            estimate,
            se,
            variance,
            cv,
            ci_lower,
            ci_upper,
            n_plots,
            n_conditions,
        });
    }

    Ok(out)
}
