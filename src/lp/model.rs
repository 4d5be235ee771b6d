//! LP model definition.

/// Handle to a column of an [`LpModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LpVar(usize);

impl LpVar {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a row of an [`LpModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LpExpr(usize);

impl LpExpr {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimise,
    Maximise,
}

/// Status of an LP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    /// Proven optimal solution found.
    Optimal,
    /// No feasible point exists.
    Infeasible,
    /// The objective is unbounded in the optimization direction.
    Unbounded,
    /// The solver gave up after its iteration cap.
    IterationLimit,
    /// The model uses something the solver does not support.
    Invalid,
}

/// Result of an LP solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LpOutcome {
    pub status: LpStatus,
    /// Objective value. Meaningful only when `status` is `Optimal`.
    pub value: f64,
}

impl LpOutcome {
    pub fn optimal(value: f64) -> Self {
        Self {
            status: LpStatus::Optimal,
            value,
        }
    }

    pub fn with_status(status: LpStatus) -> Self {
        Self {
            status,
            value: f64::NAN,
        }
    }

    /// Whether an optimum was found.
    pub fn is_feasible(&self) -> bool {
        self.status == LpStatus::Optimal
    }

    /// Whether infeasibility was proven.
    pub fn is_infeasible(&self) -> bool {
        self.status == LpStatus::Infeasible
    }
}

/// Interface for LP solver implementations.
///
/// Implementors solve `min`/`max` of `Σ weight_j x_j` subject to the
/// model's column bounds and row ranges.
pub trait LpSolver {
    /// Solves the model in the given direction.
    fn solve(&mut self, model: &LpModel, sense: Sense) -> LpOutcome;
}

#[derive(Debug, Clone)]
pub(crate) struct Column {
    pub(crate) lower: f64,
    pub(crate) upper: f64,
    pub(crate) weight: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub(crate) name: String,
    pub(crate) lower: f64,
    pub(crate) upper: f64,
    pub(crate) terms: Vec<(usize, f64)>,
}

/// A linear program: bounded columns, ranged rows, linear objective.
///
/// Structure (columns, rows, coefficients) is meant to be built once;
/// bounds and weights are cheap to change between solves.
///
/// # Examples
///
/// ```
/// use u_bincounts::lp::{LpModel, MicroLpSolver};
///
/// // x + y = 1, x, y in [0, 1]
/// let mut model = LpModel::new();
/// let x = model.add_variable(0.0, 1.0, 1.0);
/// let y = model.add_variable(0.0, 1.0, 0.0);
/// let row = model.add_expression("sum", 1.0, 1.0);
/// model.set_coefficient(row, x, 1.0);
/// model.set_coefficient(row, y, 1.0);
///
/// let mut solver = MicroLpSolver::new();
/// assert_eq!(model.minimise(&mut solver).value, 0.0);
/// assert_eq!(model.maximise(&mut solver).value, 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LpModel {
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<Row>,
}

impl LpModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column `lower <= x <= upper` with objective weight `weight`.
    pub fn add_variable(&mut self, lower: f64, upper: f64, weight: f64) -> LpVar {
        self.columns.push(Column {
            lower,
            upper,
            weight,
        });
        LpVar(self.columns.len() - 1)
    }

    /// Adds an empty row `lower <= Σ a_j x_j <= upper`.
    pub fn add_expression(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> LpExpr {
        self.rows.push(Row {
            name: name.into(),
            lower,
            upper,
            terms: Vec::new(),
        });
        LpExpr(self.rows.len() - 1)
    }

    /// Sets the coefficient of `var` in `expr`, replacing any previous one.
    pub fn set_coefficient(&mut self, expr: LpExpr, var: LpVar, coefficient: f64) {
        let terms = &mut self.rows[expr.0].terms;
        match terms.iter_mut().find(|(j, _)| *j == var.0) {
            Some(term) => term.1 = coefficient,
            None => terms.push((var.0, coefficient)),
        }
    }

    pub fn coefficient(&self, expr: LpExpr, var: LpVar) -> f64 {
        self.rows[expr.0]
            .terms
            .iter()
            .find(|(j, _)| *j == var.0)
            .map_or(0.0, |t| t.1)
    }

    pub fn set_weight(&mut self, var: LpVar, weight: f64) {
        self.columns[var.0].weight = weight;
    }

    pub fn weight(&self, var: LpVar) -> f64 {
        self.columns[var.0].weight
    }

    pub fn set_bounds(&mut self, var: LpVar, lower: f64, upper: f64) {
        let column = &mut self.columns[var.0];
        column.lower = lower;
        column.upper = upper;
    }

    pub fn bounds(&self, var: LpVar) -> (f64, f64) {
        let column = &self.columns[var.0];
        (column.lower, column.upper)
    }

    pub fn set_expression_bounds(&mut self, expr: LpExpr, lower: f64, upper: f64) {
        let row = &mut self.rows[expr.0];
        row.lower = lower;
        row.upper = upper;
    }

    pub fn expression_name(&self, expr: LpExpr) -> &str {
        &self.rows[expr.0].name
    }

    pub fn num_variables(&self) -> usize {
        self.columns.len()
    }

    pub fn num_expressions(&self) -> usize {
        self.rows.len()
    }

    /// Evaluates the objective at `point` (one value per column).
    pub fn objective_at(&self, point: &[f64]) -> f64 {
        self.columns
            .iter()
            .zip(point)
            .map(|(c, x)| c.weight * x)
            .sum()
    }

    pub fn minimise<S: LpSolver + ?Sized>(&self, solver: &mut S) -> LpOutcome {
        solver.solve(self, Sense::Minimise)
    }

    pub fn maximise<S: LpSolver + ?Sized>(&self, solver: &mut S) -> LpOutcome {
        solver.solve(self, Sense::Maximise)
    }
}
