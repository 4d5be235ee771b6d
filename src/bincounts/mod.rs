//! Bincounts: item values and per-bin occupancy counts.
//!
//! Given item variables and one count variable per bin, `Bincounts` keeps
//! `counts[j] = |{ i : items[i] ∈ bin j }|` and filters both sides to the
//! values that appear in some valid assignment. Bins are half-open
//! intervals `[lo, hi)` over the value range.
//!
//! Filtering works on the transportation relaxation of the assignment:
//! a 0/1 cell per (item, bin), one row per item forcing a single bin, one
//! row per bin summing to its count. The constraint matrix is totally
//! unimodular, so the LP optimum of every cell and count is integral and
//! the resulting filtering is exact. Cells proven empty are cached in
//! backtrackable flags and are not solved again in the same branch.
//!
//! # Key Components
//!
//! - [`BinLayout`]: contiguous or gapped bin boundaries
//! - [`Bincounts`]: the propagator, strict ([`Variant::Eq`]) or relaxed
//!   ([`Variant::Le`])
//! - [`BincountsConfig`]: variant, event policy, integrality tolerance
//! - [`BincountsStats`]: pass, solve and cache counters
//!
//! # References
//!
//! - Hoffman & Kruskal (1956), "Integral Boundary Points of Convex Polyhedra"
//! - Régin (1996), "Generalized Arc Consistency for Global Cardinality
//!   Constraint"
//! - Rossi, Prestwich & Tarim (2015), "Statistical Constraints"

mod bins;
mod config;
mod constraint;
mod driver;
mod flags;
mod relaxation;

pub use bins::{Bin, BinLayout};
pub use config::{BincountsConfig, IncrementalPolicy, Variant};
pub use constraint::{Bincounts, Phase};
pub use driver::BincountsStats;
