//! Condition clauses and the compiler that turns them into an expression.
//!
//! A clause is plain data: a left instance reference, an output-qualified
//! operator string (`rsi_below`, `close_crossed_above`), a right-hand operand
//! and the combinator joining it to the running result. Clauses fold strictly
//! left to right — one combinator slot per clause, no precedence grouping.
//! All references are resolved here, before any price data is touched.

use crate::domain::catalog::Comparison;
use crate::domain::error::ConfigError;
use crate::domain::session::{InstanceId, Session};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

/// Right-hand operand of a clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rhs {
    /// Named output of another instance.
    Property { indicator: String, property: String },
    /// Another instance's primary output.
    Indicator { indicator: String },
    /// Literal threshold.
    Constant { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionClause {
    pub left: String,
    pub operator: String,
    pub rhs: Rhs,
    /// Joins this clause to the result of everything before it. Ignored on
    /// the first clause.
    #[serde(default)]
    pub combinator: Combinator,
}

/// A resolved reference to one output series of one instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesRef {
    pub instance: InstanceId,
    pub output: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompiledRhs {
    Series(SeriesRef),
    Scalar(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledClause {
    pub left: SeriesRef,
    pub comparison: Comparison,
    pub rhs: CompiledRhs,
    pub combinator: Combinator,
}

/// A compiled boolean expression over a session's instances. Only
/// [`compile`] builds one, so the clause list is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    clauses: Vec<CompiledClause>,
}

impl Expression {
    pub fn clauses(&self) -> &[CompiledClause] {
        &self.clauses
    }

    /// Instances the expression touches, deduplicated, in first-use order.
    /// The evaluator runs each exactly once.
    pub fn instances(&self) -> Vec<InstanceId> {
        let mut ids = Vec::new();
        let mut push = |id: InstanceId| {
            if !ids.contains(&id) {
                ids.push(id);
            }
        };
        for clause in &self.clauses {
            push(clause.left.instance);
            if let CompiledRhs::Series(series_ref) = clause.rhs {
                push(series_ref.instance);
            }
        }
        ids
    }
}

/// Split an operator string into output name and comparison. Longer suffixes
/// are tried first so `tr_crossed_above` does not parse as output
/// `tr_crossed`.
pub fn parse_operator(operator: &str) -> Option<(&str, Comparison)> {
    const SUFFIXES: [(&str, Comparison); 5] = [
        ("_crossed_above", Comparison::CrossedAbove),
        ("_crossed_below", Comparison::CrossedBelow),
        ("_above", Comparison::Above),
        ("_below", Comparison::Below),
        ("_equal", Comparison::Equal),
    ];

    for (suffix, comparison) in SUFFIXES {
        if let Some(output) = operator.strip_suffix(suffix) {
            if !output.is_empty() {
                return Some((output, comparison));
            }
        }
    }
    None
}

/// Resolve and validate every clause against the session, producing an
/// expression ready for evaluation.
pub fn compile(session: &Session, clauses: &[ConditionClause]) -> Result<Expression, ConfigError> {
    if clauses.is_empty() {
        return Err(ConfigError::EmptyExpression);
    }

    let mut compiled = Vec::with_capacity(clauses.len());

    for clause in clauses {
        let left_id = session
            .find(&clause.left)
            .ok_or_else(|| ConfigError::UnresolvedReference(clause.left.clone()))?;
        let left_spec = session.instance(left_id).spec();

        let invalid_op = || ConfigError::InvalidOperator {
            instance: clause.left.clone(),
            operator: clause.operator.clone(),
        };
        let (output, comparison) = parse_operator(&clause.operator).ok_or_else(invalid_op)?;
        let output_idx = left_spec.output_index(output).ok_or_else(invalid_op)?;

        let rhs = match &clause.rhs {
            Rhs::Constant { value } => CompiledRhs::Scalar(*value),
            Rhs::Indicator { indicator } => {
                let id = session
                    .find(indicator)
                    .ok_or_else(|| ConfigError::UnresolvedReference(indicator.clone()))?;
                CompiledRhs::Series(SeriesRef {
                    instance: id,
                    output: 0,
                })
            }
            Rhs::Property {
                indicator,
                property,
            } => {
                let id = session
                    .find(indicator)
                    .ok_or_else(|| ConfigError::UnresolvedReference(indicator.clone()))?;
                let idx = session.instance(id).spec().output_index(property).ok_or_else(
                    || ConfigError::UnknownProperty {
                        instance: indicator.clone(),
                        property: property.clone(),
                    },
                )?;
                CompiledRhs::Series(SeriesRef {
                    instance: id,
                    output: idx,
                })
            }
        };

        compiled.push(CompiledClause {
            left: SeriesRef {
                instance: left_id,
                output: output_idx,
            },
            comparison,
            rhs,
            combinator: clause.combinator,
        });
    }

    Ok(Expression { clauses: compiled })
}
