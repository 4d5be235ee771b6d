//! Host substrate: variables, backtrackable state and the propagation loop.
//!
//! The Bincounts constraint only needs a small slice of a constraint solver:
//! variables that can be queried and narrowed, backtrackable boolean cells,
//! and an engine that calls propagators until nothing changes. This module
//! provides exactly that slice so the constraint can be used and tested on
//! its own. It is not a search engine: choice points are opened and closed
//! by the caller through [`PropagationEngine::push`] and
//! [`PropagationEngine::pop`].
//!
//! # Key Components
//!
//! - [`Trail`]: versioned cells with checkpoint/backtrack
//! - [`Space`]: variable domains and flags stored on trails
//! - [`Propagator`]: the interface constraints implement
//! - [`PropagationEngine`]: activation lists, queue and fixpoint loop

mod engine;
mod event;
mod trail;

pub use engine::{PropagationEngine, PropagationStatistics, PropagationStatus, Propagator};
pub use event::EventMask;
pub use trail::Trail;

use crate::domain::{Domain, IntDomain, RealDomain};
use crate::error::Contradiction;
use std::fmt;

/// Handle to a variable in a [`Space`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(usize);

impl VarId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Handle to a backtrackable boolean cell in a [`Space`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagId(usize);

/// Variable store with backtrackable domains and flags.
///
/// Every narrowing either reports whether the domain changed or fails with a
/// [`Contradiction`] when the result would be empty; a failing narrowing
/// leaves the domain untouched.
///
/// # Examples
///
/// ```
/// use u_bincounts::space::Space;
///
/// let mut space = Space::new();
/// let x = space.new_int_var("x", 0, 10);
///
/// space.checkpoint();
/// assert_eq!(space.update_upper_bound(x, 4.0), Ok(true));
/// assert_eq!(space.upper_bound(x), 4.0);
/// assert!(space.update_lower_bound(x, 5.0).is_err());
///
/// space.backtrack();
/// assert_eq!(space.upper_bound(x), 10.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Space {
    domains: Trail<Domain>,
    names: Vec<String>,
    flags: Trail<bool>,
    events: Vec<(VarId, EventMask)>,
    /// Incremented on every committed domain change.
    stamp: u64,
    /// Incremented on every backtrack.
    epoch: u64,
}

impl Space {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an integer variable with domain `[lo, hi]`.
    pub fn new_int_var(&mut self, name: impl Into<String>, lo: i64, hi: i64) -> VarId {
        self.new_var(name, Domain::Int(IntDomain::range(lo, hi)))
    }

    /// Creates an integer variable with an explicit set of values.
    pub fn new_int_var_from_values<I: IntoIterator<Item = i64>>(
        &mut self,
        name: impl Into<String>,
        values: I,
    ) -> VarId {
        self.new_var(name, Domain::Int(IntDomain::from_values(values)))
    }

    /// Creates a real variable with domain `[lo, hi]`.
    pub fn new_real_var(&mut self, name: impl Into<String>, lo: f64, hi: f64) -> VarId {
        self.new_var(name, Domain::Real(RealDomain::new(lo, hi)))
    }

    /// Creates a variable with an arbitrary domain.
    pub fn new_var(&mut self, name: impl Into<String>, domain: Domain) -> VarId {
        let id = self.domains.push(domain);
        self.names.push(name.into());
        VarId(id)
    }

    pub fn num_vars(&self) -> usize {
        self.domains.len()
    }

    pub fn contains(&self, var: VarId) -> bool {
        var.0 < self.domains.len()
    }

    pub fn name(&self, var: VarId) -> &str {
        &self.names[var.0]
    }

    pub fn domain(&self, var: VarId) -> &Domain {
        self.domains.get(var.0)
    }

    /// The integer domain of `var`, or `None` for real variables.
    pub fn int_domain(&self, var: VarId) -> Option<&IntDomain> {
        match self.domain(var) {
            Domain::Int(d) => Some(d),
            Domain::Real(_) => None,
        }
    }

    pub fn lower_bound(&self, var: VarId) -> f64 {
        self.domain(var).bounds().map_or(f64::NAN, |b| b.0)
    }

    pub fn upper_bound(&self, var: VarId) -> f64 {
        self.domain(var).bounds().map_or(f64::NAN, |b| b.1)
    }

    pub fn is_instantiated(&self, var: VarId) -> bool {
        self.domain(var).is_fixed()
    }

    /// The value of an instantiated variable.
    pub fn value(&self, var: VarId) -> Option<f64> {
        let domain = self.domain(var);
        domain.is_fixed().then(|| domain.bounds().map(|b| b.0)).flatten()
    }

    pub fn update_lower_bound(&mut self, var: VarId, value: f64) -> Result<bool, Contradiction> {
        self.narrow(var, |d| d.update_lower(value))
    }

    pub fn update_upper_bound(&mut self, var: VarId, value: f64) -> Result<bool, Contradiction> {
        self.narrow(var, |d| d.update_upper(value))
    }

    /// Removes the half-open interval `[lo, hi)` from the domain.
    pub fn remove_interval(&mut self, var: VarId, lo: f64, hi: f64) -> Result<bool, Contradiction> {
        self.narrow(var, |d| d.remove_half_open(lo, hi))
    }

    /// Removes a single integer value. No-op on real variables.
    pub fn remove_value(&mut self, var: VarId, value: i64) -> Result<bool, Contradiction> {
        self.narrow(var, |d| match d {
            Domain::Int(d) => d.remove_range(value, value),
            Domain::Real(_) => false,
        })
    }

    /// Fixes the variable to `value`.
    pub fn instantiate(&mut self, var: VarId, value: f64) -> Result<bool, Contradiction> {
        self.narrow(var, |d| {
            let below = d.update_lower(value);
            let above = d.update_upper(value);
            below | above
        })
    }

    fn narrow(
        &mut self,
        var: VarId,
        f: impl FnOnce(&mut Domain) -> bool,
    ) -> Result<bool, Contradiction> {
        let before = self.domain(var).bounds();
        let mut domain = self.domain(var).clone();
        if !f(&mut domain) {
            return Ok(false);
        }
        if domain.is_empty() {
            return Err(Contradiction::Wipeout { var });
        }

        let mut mask = EventMask::REMOVE;
        if domain.bounds() != before {
            mask |= EventMask::BOUND;
        }
        if domain.is_fixed() {
            mask |= EventMask::INSTANTIATE;
        }
        self.domains.set(var.0, domain);
        self.stamp += 1;
        self.events.push((var, mask));
        Ok(true)
    }

    /// Allocates a backtrackable boolean cell.
    pub fn new_flag(&mut self, initial: bool) -> FlagId {
        FlagId(self.flags.push(initial))
    }

    pub fn flag(&self, flag: FlagId) -> bool {
        *self.flags.get(flag.0)
    }

    pub fn set_flag(&mut self, flag: FlagId, value: bool) {
        if self.flag(flag) != value {
            self.flags.set(flag.0, value);
        }
    }

    /// Current checkpoint depth.
    pub fn level(&self) -> usize {
        self.domains.level()
    }

    /// Opens a choice point.
    pub fn checkpoint(&mut self) {
        self.domains.checkpoint();
        self.flags.checkpoint();
    }

    /// Restores domains and flags to the last choice point. Returns `false`
    /// at the root.
    pub fn backtrack(&mut self) -> bool {
        let restored = self.domains.backtrack();
        self.flags.backtrack();
        if restored {
            self.epoch += 1;
            self.stamp += 1;
            self.events.clear();
        }
        restored
    }

    /// Counter of committed domain changes. Equal stamps mean no domain has
    /// changed in between.
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    /// Counter of backtracks.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn take_events(&mut self) -> Vec<(VarId, EventMask)> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn clear_events(&mut self) {
        self.events.clear();
    }
}
