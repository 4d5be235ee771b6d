//! Transportation relaxation of a Bincounts constraint.

use super::config::Variant;
use super::driver::Scope;
use super::flags::column_intersects;
use crate::lp::{LpModel, LpOutcome, LpSolver, LpVar, Sense};
use crate::space::Space;
use log::trace;

/// A single LP column whose optimum is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cell {
    /// `x[column][item]`: item routed through column.
    Assignment { item: usize, column: usize },
    /// `c[column]`: number of items routed through column.
    Count { column: usize },
}

/// The LP behind one constraint instance.
///
/// Columns `x[j][i]` (stored at `j * n + i`) and `c[j]`; one row per item
/// (`Σ_j x[j][i] = 1`) and one per column (`Σ_i x[j][i] - c[j] = 0`). The
/// relaxed variant adds the no-bin column `j = m` with `c[m] ∈ [0, n]` and
/// a total row `Σ_j c[j] = n`. Every column appears once in an item row and
/// once in a column row, so vertex optima are integral.
#[derive(Debug, Clone)]
pub(crate) struct Relaxation {
    model: LpModel,
    items: usize,
    bins: usize,
    assignment: Vec<LpVar>,
    counts: Vec<LpVar>,
}

impl Relaxation {
    /// Builds the structure and loads the current bounds.
    pub(crate) fn build(space: &Space, scope: &Scope<'_>) -> Self {
        let n = scope.items.len();
        let bins = scope.layout.len();
        let columns = scope.flags.columns();
        let mut model = LpModel::new();

        let assignment: Vec<LpVar> = (0..columns * n)
            .map(|_| model.add_variable(0.0, 1.0, 0.0))
            .collect();
        let counts: Vec<LpVar> = (0..columns)
            .map(|_| model.add_variable(0.0, n as f64, 0.0))
            .collect();

        for i in 0..n {
            let row = model.add_expression(format!("item_{i}"), 1.0, 1.0);
            for j in 0..columns {
                model.set_coefficient(row, assignment[j * n + i], 1.0);
            }
        }
        for j in 0..columns {
            let row = model.add_expression(format!("bin_{j}"), 0.0, 0.0);
            for i in 0..n {
                model.set_coefficient(row, assignment[j * n + i], 1.0);
            }
            model.set_coefficient(row, counts[j], -1.0);
        }
        if scope.variant == Variant::Le {
            let row = model.add_expression("total", n as f64, n as f64);
            for &c in &counts {
                model.set_coefficient(row, c, 1.0);
            }
        }

        let mut relaxation = Self {
            model,
            items: n,
            bins,
            assignment,
            counts,
        };
        relaxation.refresh(space, scope);
        relaxation
    }

    /// Reloads column bounds from the current domains and flags.
    pub(crate) fn refresh(&mut self, space: &Space, scope: &Scope<'_>) {
        for (i, &item) in scope.items.iter().enumerate() {
            let domain = space.domain(item);
            for j in 0..scope.flags.columns() {
                let open =
                    scope.flags.get(space, i, j) && column_intersects(domain, scope.layout, j);
                self.set_assignment_upper(i, j, if open { 1.0 } else { 0.0 });
            }
        }
        for (j, &count) in scope.counts.iter().enumerate() {
            self.set_count_bounds(j, space.lower_bound(count), space.upper_bound(count));
        }
    }

    pub(crate) fn set_assignment_upper(&mut self, item: usize, column: usize, upper: f64) {
        let var = self.assignment[column * self.items + item];
        self.model.set_bounds(var, 0.0, upper);
    }

    /// Bounds of a bin column's count. The no-bin count keeps `[0, n]`.
    pub(crate) fn set_count_bounds(&mut self, column: usize, lower: f64, upper: f64) {
        if column < self.bins {
            self.model.set_bounds(self.counts[column], lower, upper);
        }
    }

    /// Optimises `cell` alone: weight 1 on the cell, 0 elsewhere.
    pub(crate) fn solve<S: LpSolver + ?Sized>(
        &mut self,
        cell: Cell,
        sense: Sense,
        solver: &mut S,
    ) -> LpOutcome {
        let var = match cell {
            Cell::Assignment { item, column } => self.assignment[column * self.items + item],
            Cell::Count { column } => self.counts[column],
        };
        self.model.set_weight(var, 1.0);
        let outcome = solver.solve(&self.model, sense);
        self.model.set_weight(var, 0.0);
        trace!("{cell:?} {sense:?}: {:?} {}", outcome.status, outcome.value);
        outcome
    }

    #[cfg(test)]
    pub(crate) fn model(&self) -> &LpModel {
        &self.model
    }
}
