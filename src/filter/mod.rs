//! L4: filter compiler. Parses the domain predicate mini-language,
//! validates identifiers against the entity's known columns, and
//! translates the `land_type`/`tree_type` presets into predicates, per
//! spec.md §4.2.

pub mod eval;
pub mod expr;
pub mod parser;

use std::collections::BTreeSet;

use crate::error::{EstimationError, Result};
use crate::reference::SpeciesCatalog;
use crate::table::schema::TableName;

pub use eval::{eval_bool, ColumnValue};
pub use expr::{Expr, Literal};

/// Which entity a predicate string is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Tree,
    Cond,
    Plot,
}

impl Entity {
    fn table(&self) -> TableName {
        match self {
            Entity::Tree => TableName::Tree,
            Entity::Cond => TableName::Cond,
            Entity::Plot => TableName::Plot,
        }
    }

    fn known_columns(&self) -> BTreeSet<&'static str> {
        self.table()
            .required_columns()
            .iter()
            .map(|(name, _)| *name)
            .collect()
    }
}

/// `land_type` preset of spec.md §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LandType {
    #[default]
    All,
    Forest,
    Timber,
}

/// `tree_type` preset of spec.md §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeType {
    #[default]
    All,
    Live,
    Dead,
    GrowingStock,
    Sawlog,
}

/// Agent codes FIA treats as "not growing stock" (cull/defect causes),
/// used by the `GrowingStock`/`Sawlog` translation.
const NON_GROWING_STOCK_AGENTS: [f64; 5] = [0.0, 10.0, 20.0, 40.0, 50.0];

/// A parsed predicate plus its validated column dependencies.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    pub expr: Expr,
    pub columns: BTreeSet<String>,
}

/// Parses and validates a predicate string against `entity`'s known
/// columns. `UnknownColumn` on any identifier outside the entity's
/// schema.
pub fn compile(input: &str, entity: Entity) -> Result<CompiledFilter> {
    let expr = parser::parse(input)?;
    let columns = expr.columns();
    let known = entity.known_columns();
    for column in &columns {
        if !known.contains(column.as_str()) {
            return Err(EstimationError::UnknownColumn {
                entity: format!("{entity:?}"),
                column: column.clone(),
            });
        }
    }
    Ok(CompiledFilter { expr, columns })
}

/// The `All`/`Forest`/`Timber` restriction over `COND` columns, per
/// spec.md §4.2's land-type translation. `All` imposes no forest-status
/// restriction of its own -- it only requires the condition to have been
/// sampled (`COND_STATUS_CD != 5`), so it does not collapse onto
/// `Forest` and silently drop nonforest acres from an "all land" total
/// or per-acre denominator.
pub fn land_type_expr(land_type: LandType) -> Expr {
    let forest = Expr::Eq(
        Box::new(Expr::Column("COND_STATUS_CD".into())),
        Box::new(Expr::Literal(Literal::Number(1.0))),
    );
    let sampled = Expr::Ne(
        Box::new(Expr::Column("COND_STATUS_CD".into())),
        Box::new(Expr::Literal(Literal::Number(5.0))),
    );
    match land_type {
        LandType::All => sampled,
        LandType::Forest => forest,
        LandType::Timber => Expr::And(
            Box::new(forest),
            Box::new(Expr::And(
                Box::new(Expr::In(
                    Box::new(Expr::Column("SITECLCD".into())),
                    (1..=6).map(|v| Literal::Number(v as f64)).collect(),
                )),
                Box::new(Expr::Eq(
                    Box::new(Expr::Column("RESERVCD".into())),
                    Box::new(Expr::Literal(Literal::Number(0.0))),
                )),
            )),
        ),
    }
}

/// The `Live`/`Dead`/`GrowingStock`/`Sawlog` restriction over `TREE`
/// columns, per spec.md §4.2's tree-type translation. `GrowingStock` and
/// `Sawlog` consult `catalog` for the species-class sawlog diameter
/// threshold.
pub fn tree_type_expr(tree_type: TreeType, catalog: &dyn SpeciesCatalog, spcd: Option<u32>) -> Expr {
    let live = Expr::Eq(
        Box::new(Expr::Column("STATUSCD".into())),
        Box::new(Expr::Literal(Literal::Number(1.0))),
    );
    match tree_type {
        TreeType::All => Expr::Literal(Literal::Number(1.0)),
        TreeType::Live => live,
        TreeType::Dead => Expr::Eq(
            Box::new(Expr::Column("STATUSCD".into())),
            Box::new(Expr::Literal(Literal::Number(2.0))),
        ),
        TreeType::GrowingStock => growing_stock_expr(live),
        TreeType::Sawlog => {
            let min_dbh = spcd
                .and_then(|s| catalog.lookup(s))
                .map(|r| r.sawlog_min_dbh())
                .unwrap_or(9.0);
            Expr::And(
                Box::new(growing_stock_expr(live)),
                Box::new(Expr::Ge(
                    Box::new(Expr::Column("DIA".into())),
                    Box::new(Expr::Literal(Literal::Number(min_dbh))),
                )),
            )
        }
    }
}

fn growing_stock_expr(live: Expr) -> Expr {
    Expr::And(
        Box::new(live),
        Box::new(Expr::And(
            Box::new(Expr::Eq(
                Box::new(Expr::Column("TREECLCD".into())),
                Box::new(Expr::Literal(Literal::Number(2.0))),
            )),
            Box::new(Expr::And(
                Box::new(Expr::Not(Box::new(Expr::In(
                    Box::new(Expr::Column("AGENTCD".into())),
                    NON_GROWING_STOCK_AGENTS.iter().map(|v| Literal::Number(*v)).collect(),
                )))),
                Box::new(Expr::Ge(
                    Box::new(Expr::Column("DIA".into())),
                    Box::new(Expr::Literal(Literal::Number(5.0))),
                )),
            )),
        )),
    )
}
