//! Expression evaluation.
//!
//! Runs every instance an expression references exactly once per input
//! series, then folds the compiled clauses left to right into one boolean
//! series.
//!
//! # Comparison semantics
//!
//! - `above` / `below`: strict, elementwise
//! - `crossed_above`: true only on the bar where left moves from `<=` to `>`;
//!   never true at index 0
//! - `crossed_below`: mirrored
//! - `equal`: absolute difference under 1e-9
//! - any NaN operand compares false

use crate::domain::catalog::Comparison;
use crate::domain::error::EvalError;
use crate::domain::expr::{Combinator, CompiledClause, CompiledRhs, Expression};
use crate::domain::indicator::{self, EvaluatedIndicator};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::session::{InstanceId, Session};
use std::collections::HashMap;

const EPSILON: f64 = 1e-9;

/// Evaluate a compiled expression over one symbol's history, producing one
/// boolean per bar.
pub fn evaluate(
    session: &Session,
    expr: &Expression,
    series: &PriceSeries,
) -> Result<Vec<bool>, EvalError> {
    if series.is_empty() {
        return Err(EvalError::EmptyHistory {
            symbol: series.symbol.clone(),
        });
    }

    let mut cache: HashMap<InstanceId, EvaluatedIndicator> = HashMap::new();
    for id in expr.instances() {
        let evaluated = indicator::run_instance(session.instance(id), series)?;
        cache.insert(id, evaluated);
    }

    let n = series.len();
    let clauses = expr.clauses();
    let mut acc = eval_clause(&clauses[0], &cache, n);

    for clause in &clauses[1..] {
        let next = eval_clause(clause, &cache, n);
        for i in 0..n {
            acc[i] = match clause.combinator {
                Combinator::And => acc[i] && next[i],
                Combinator::Or => acc[i] || next[i],
            };
        }
    }

    Ok(acc)
}

fn eval_clause(
    clause: &CompiledClause,
    cache: &HashMap<InstanceId, EvaluatedIndicator>,
    n: usize,
) -> Vec<bool> {
    let left = cache[&clause.left.instance].output(clause.left.output);

    let rhs_at = |i: usize| -> f64 {
        match clause.rhs {
            CompiledRhs::Scalar(v) => v,
            CompiledRhs::Series(series_ref) => {
                cache[&series_ref.instance].output(series_ref.output)[i]
            }
        }
    };

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let result = match clause.comparison {
            Comparison::Above => left[i] > rhs_at(i),
            Comparison::Below => left[i] < rhs_at(i),
            Comparison::Equal => (left[i] - rhs_at(i)).abs() < EPSILON,
            Comparison::CrossedAbove => {
                i > 0 && left[i] > rhs_at(i) && left[i - 1] <= rhs_at(i - 1)
            }
            Comparison::CrossedBelow => {
                i > 0 && left[i] < rhs_at(i) && left[i - 1] >= rhs_at(i - 1)
            }
        };
        out.push(result);
    }

    out
}
