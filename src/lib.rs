//! Bin-occupancy filtering for constraint solvers.
//!
//! Provides the filtering algorithm of the Bincounts global constraint
//! together with the small amount of solver infrastructure it runs on:
//!
//! - **Bincounts**: links n item variables to m bin-count variables over a
//!   partition of the value range; filters both sides exactly through an
//!   integral linear relaxation, re-solved incrementally under
//!   backtracking.
//! - **Space**: integer and real variables, backtrackable flags, and a
//!   propagation engine that runs posted propagators to a fixpoint.
//! - **LP**: a model layer with a pluggable solver interface and a default
//!   backend on `microlp`.
//!
//! # Architecture
//!
//! `bincounts` depends on `space` for variables and on `lp` for the
//! relaxation; `lp` depends on nothing else in the crate. The crate does not
//! search: choice points are opened and closed by the host through
//! [`space::PropagationEngine::push`] and [`space::PropagationEngine::pop`].

pub mod bincounts;
pub mod domain;
pub mod error;
pub mod lp;
pub mod space;

pub use bincounts::{BinLayout, Bincounts, BincountsConfig, Variant};
pub use error::{BincountsError, Contradiction};
pub use space::{PropagationEngine, Space, VarId};
