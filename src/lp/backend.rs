//! Default solver on the `microlp` simplex.

use super::model::{LpModel, LpOutcome, LpSolver, LpStatus, Sense};
use log::{trace, warn};
use microlp::{ComparisonOp, OptimizationDirection, Problem};

/// Bound slack under which two sides of a range are treated as equal.
const BOUND_EPS: f64 = 1e-9;

/// [`LpSolver`] backed by `microlp`.
///
/// Each solve translates the model into a fresh [`microlp::Problem`]: one
/// variable per column, and per row either an equality (both sides meet),
/// or one inequality per finite side. Rows with no terms are checked here
/// and never reach the backend.
///
/// `microlp` has no iteration cap, so this solver never reports
/// [`LpStatus::IterationLimit`].
#[derive(Debug, Clone, Default)]
pub struct MicroLpSolver {
    solves: u64,
    failures: u64,
}

impl MicroLpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solves issued over the solver's lifetime.
    pub fn solves(&self) -> u64 {
        self.solves
    }

    /// Solves that ended without an optimum.
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl LpSolver for MicroLpSolver {
    fn solve(&mut self, model: &LpModel, sense: Sense) -> LpOutcome {
        self.solves += 1;
        let outcome = match translate(model, sense) {
            Err(status) => LpOutcome::with_status(status),
            Ok(problem) => match problem.solve() {
                Ok(solution) => LpOutcome::optimal(solution.objective()),
                Err(microlp::Error::Infeasible) => LpOutcome::with_status(LpStatus::Infeasible),
                Err(microlp::Error::Unbounded) => LpOutcome::with_status(LpStatus::Unbounded),
                Err(microlp::Error::InternalError(msg)) => {
                    warn!("microlp internal error: {msg}");
                    LpOutcome::with_status(LpStatus::Invalid)
                }
            },
        };
        if !outcome.is_feasible() {
            self.failures += 1;
        }
        trace!(
            "microlp {:?}: {:?} value={} ({} columns, {} rows)",
            sense,
            outcome.status,
            outcome.value,
            model.columns.len(),
            model.rows.len()
        );
        outcome
    }
}

/// Builds the `microlp` problem, or the status that makes solving moot.
fn translate(model: &LpModel, sense: Sense) -> Result<Problem, LpStatus> {
    let direction = match sense {
        Sense::Minimise => OptimizationDirection::Minimize,
        Sense::Maximise => OptimizationDirection::Maximize,
    };
    let mut problem = Problem::new(direction);

    let mut vars = Vec::with_capacity(model.columns.len());
    for column in &model.columns {
        if column.lower.is_nan() || column.upper.is_nan() || !column.weight.is_finite() {
            return Err(LpStatus::Invalid);
        }
        if column.upper < column.lower - BOUND_EPS {
            return Err(LpStatus::Infeasible);
        }
        let upper = column.upper.max(column.lower);
        vars.push(problem.add_var(column.weight, (column.lower, upper)));
    }

    for row in &model.rows {
        if row.lower.is_nan() || row.upper.is_nan() {
            return Err(LpStatus::Invalid);
        }
        if row.lower > row.upper + BOUND_EPS {
            return Err(LpStatus::Infeasible);
        }
        let terms: Vec<_> = row
            .terms
            .iter()
            .filter(|(_, coef)| *coef != 0.0)
            .map(|&(j, coef)| (vars[j], coef))
            .collect();
        if terms.is_empty() {
            if row.lower > BOUND_EPS || row.upper < -BOUND_EPS {
                return Err(LpStatus::Infeasible);
            }
            continue;
        }

        if row.lower.is_finite() && row.upper.is_finite() && row.upper - row.lower <= BOUND_EPS {
            problem.add_constraint(terms.as_slice(), ComparisonOp::Eq, row.lower);
            continue;
        }
        if row.lower.is_finite() {
            problem.add_constraint(terms.as_slice(), ComparisonOp::Ge, row.lower);
        }
        if row.upper.is_finite() {
            problem.add_constraint(terms.as_slice(), ComparisonOp::Le, row.upper);
        }
    }
    Ok(problem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-7
    }

    #[test]
    fn test_transportation() {
        // two items, two bins; item 1 fits only bin 1; bin 1 holds exactly one
        let mut model = LpModel::new();
        let x00 = model.add_variable(0.0, 1.0, 0.0);
        let x01 = model.add_variable(0.0, 1.0, 0.0);
        let x10 = model.add_variable(0.0, 0.0, 0.0);
        let x11 = model.add_variable(0.0, 1.0, 0.0);
        let c0 = model.add_variable(0.0, 2.0, 0.0);
        let c1 = model.add_variable(1.0, 1.0, 0.0);

        let item0 = model.add_expression("item_0", 1.0, 1.0);
        model.set_coefficient(item0, x00, 1.0);
        model.set_coefficient(item0, x10, 1.0);
        let item1 = model.add_expression("item_1", 1.0, 1.0);
        model.set_coefficient(item1, x01, 1.0);
        model.set_coefficient(item1, x11, 1.0);
        let bin0 = model.add_expression("bin_0", 0.0, 0.0);
        model.set_coefficient(bin0, x00, 1.0);
        model.set_coefficient(bin0, x01, 1.0);
        model.set_coefficient(bin0, c0, -1.0);
        let bin1 = model.add_expression("bin_1", 0.0, 0.0);
        model.set_coefficient(bin1, x10, 1.0);
        model.set_coefficient(bin1, x11, 1.0);
        model.set_coefficient(bin1, c1, -1.0);

        let mut solver = MicroLpSolver::new();

        model.set_weight(c0, 1.0);
        let min = model.minimise(&mut solver);
        let max = model.maximise(&mut solver);
        assert!(min.is_feasible() && max.is_feasible());
        assert!(close(min.value, 1.0));
        assert!(close(max.value, 1.0));
        model.set_weight(c0, 0.0);

        model.set_weight(x11, 1.0);
        assert!(close(model.minimise(&mut solver).value, 1.0));
        model.set_weight(x11, 0.0);

        model.set_weight(x01, 1.0);
        assert!(close(model.maximise(&mut solver).value, 0.0));
        assert_eq!(solver.solves(), 5);
        assert_eq!(solver.failures(), 0);
    }

    #[test]
    fn test_infeasible() {
        let mut model = LpModel::new();
        let x = model.add_variable(0.0, 1.0, 1.0);
        let y = model.add_variable(0.0, 1.0, 0.0);
        let row = model.add_expression("sum", 3.0, 3.0);
        model.set_coefficient(row, x, 1.0);
        model.set_coefficient(row, y, 1.0);

        let mut solver = MicroLpSolver::new();
        let outcome = model.minimise(&mut solver);
        assert_eq!(outcome.status, LpStatus::Infeasible);
        assert_eq!(solver.failures(), 1);
    }

    #[test]
    fn test_inverted_bounds_infeasible() {
        let mut model = LpModel::new();
        model.add_variable(2.0, 1.0, 1.0);
        assert!(model.minimise(&mut MicroLpSolver::new()).is_infeasible());

        let mut model = LpModel::new();
        let x = model.add_variable(0.0, 1.0, 1.0);
        let row = model.add_expression("inverted", 2.0, 1.0);
        model.set_coefficient(row, x, 1.0);
        assert!(model.minimise(&mut MicroLpSolver::new()).is_infeasible());
    }

    #[test]
    fn test_empty_rows() {
        let mut model = LpModel::new();
        model.add_variable(0.0, 1.0, 1.0);
        model.add_expression("free", 0.0, 0.0);
        assert!(close(model.maximise(&mut MicroLpSolver::new()).value, 1.0));

        model.add_expression("unreachable", 1.0, 2.0);
        assert!(model.maximise(&mut MicroLpSolver::new()).is_infeasible());
    }

    #[test]
    fn test_ranged_and_upper_rows() {
        let mut model = LpModel::new();
        let x = model.add_variable(0.0, 1.0, 1.0);
        let y = model.add_variable(0.0, 1.0, 2.0);
        let range = model.add_expression("range", 1.0, 1.5);
        model.set_coefficient(range, x, 1.0);
        model.set_coefficient(range, y, 1.0);

        let mut solver = MicroLpSolver::new();
        // max x + 2y with 1 <= x + y <= 1.5
        assert!(close(model.maximise(&mut solver).value, 2.5));
        // min x + 2y with x + y >= 1
        assert!(close(model.minimise(&mut solver).value, 1.0));

        let mut capped = LpModel::new();
        let x = capped.add_variable(0.0, 5.0, 1.0);
        let y = capped.add_variable(0.0, 5.0, 2.0);
        let cap = capped.add_expression("cap", f64::NEG_INFINITY, 1.0);
        capped.set_coefficient(cap, x, 1.0);
        capped.set_coefficient(cap, y, 1.0);
        assert!(close(capped.maximise(&mut solver).value, 2.0));
    }

    #[test]
    fn test_negative_lower_bounds() {
        let mut model = LpModel::new();
        let x = model.add_variable(-2.0, 3.0, 1.0);
        let y = model.add_variable(-1.0, 1.0, 0.0);
        let row = model.add_expression("tie", 0.0, 0.0);
        model.set_coefficient(row, x, 1.0);
        model.set_coefficient(row, y, -1.0);

        let mut solver = MicroLpSolver::new();
        assert!(close(model.minimise(&mut solver).value, -1.0));
        assert!(close(model.maximise(&mut solver).value, 1.0));
    }

    #[test]
    fn test_unbounded() {
        let mut model = LpModel::new();
        model.add_variable(0.0, f64::INFINITY, 1.0);
        let outcome = model.maximise(&mut MicroLpSolver::new());
        assert_eq!(outcome.status, LpStatus::Unbounded);
    }

    #[test]
    fn test_nan_bounds_invalid() {
        let mut model = LpModel::new();
        model.add_variable(f64::NAN, 0.0, 1.0);
        let outcome = model.minimise(&mut MicroLpSolver::new());
        assert_eq!(outcome.status, LpStatus::Invalid);
    }
}
