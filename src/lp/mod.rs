//! Linear programming layer.
//!
//! The Bincounts relaxation needs a single capability from an LP solver:
//! "solve this small LP and report the optimum and whether it is feasible".
//! [`LpModel`] describes the program, [`LpSolver`] is the seam for any
//! backend, and [`MicroLpSolver`] is the default one.
//!
//! # Key Components
//!
//! - [`LpModel`]: bounded columns, ranged rows, per-column weights
//! - [`LpSolver`]: solver interface returning an [`LpOutcome`]
//! - [`MicroLpSolver`]: adapter over the `microlp` simplex
//!
//! # References
//!
//! - Dantzig (1963), "Linear Programming and Extensions"

mod backend;
mod model;

pub use backend::MicroLpSolver;
pub use model::{LpExpr, LpModel, LpOutcome, LpSolver, LpStatus, LpVar, Sense};
