//! The Bincounts propagator.

use super::bins::BinLayout;
use super::config::{BincountsConfig, IncrementalPolicy, Variant};
use super::driver::{BincountsStats, Driver, Scope};
use super::flags::{column_intersects, FitsFlags};
use crate::error::{BincountsError, Contradiction};
use crate::lp::{LpSolver, MicroLpSolver};
use crate::space::{EventMask, PropagationStatus, Propagator, Space, VarId};
use log::{debug, warn};

enum Pass {
    Full,
    Item(usize),
    Count(usize),
}

/// Lifecycle of a [`Bincounts`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Flags seeded, no pass run yet.
    FlagsSeeded,
    /// A full pass completed.
    Ready,
    /// An event-driven pass completed.
    Incremental,
    /// The last pass raised a contradiction.
    Failed,
}

/// Links item variables to the number of items per bin.
///
/// For every bin `j`, `counts[j]` equals the number of items whose value
/// lies in bin `j`. With [`Variant::Eq`] every item must land in a bin;
/// with [`Variant::Le`] items may take values outside all bins.
///
/// Filtering solves the transportation relaxation of the assignment
/// problem once per count bound and once per open (item, bin) cell. The
/// relaxation is exact, so after a full pass every remaining item value is
/// part of some valid assignment and every count bound is attained.
///
/// # Examples
///
/// ```
/// use u_bincounts::bincounts::{BinLayout, Bincounts};
/// use u_bincounts::space::{PropagationEngine, Space};
///
/// let mut space = Space::new();
/// let items = vec![
///     space.new_int_var_from_values("a", [3, 4]),
///     space.new_int_var_from_values("b", [1, 2, 4]),
///     space.new_int_var_from_values("c", [2, 3, 4]),
/// ];
/// let counts = vec![space.new_int_var("low", 1, 3), space.new_int_var("high", 0, 1)];
/// let layout = BinLayout::from_boundaries(&[1.0, 3.0, 5.0]).unwrap();
///
/// let bincounts = Bincounts::eq(&mut space, &items, &counts, layout).unwrap();
///
/// let mut engine = PropagationEngine::new(space);
/// engine.post(bincounts);
/// engine.propagate().unwrap();
///
/// let space = engine.space();
/// assert_eq!(space.value(counts[0]), Some(2.0));
/// assert_eq!(space.value(counts[1]), Some(1.0));
/// assert_eq!(space.value(items[2]), Some(2.0));
/// ```
pub struct Bincounts {
    items: Vec<VarId>,
    counts: Vec<VarId>,
    variables: Vec<VarId>,
    layout: BinLayout,
    config: BincountsConfig,
    flags: FitsFlags,
    driver: Driver,
    phase: Phase,
    epoch: u64,
    last_stamp: Option<u64>,
}

impl Bincounts {
    /// Every item lands in exactly one bin.
    pub fn eq(
        space: &mut Space,
        items: &[VarId],
        counts: &[VarId],
        layout: BinLayout,
    ) -> Result<Self, BincountsError> {
        Self::with_config(space, items, counts, layout, BincountsConfig::for_variant(Variant::Eq))
    }

    /// Items may fall outside every bin.
    pub fn le(
        space: &mut Space,
        items: &[VarId],
        counts: &[VarId],
        layout: BinLayout,
    ) -> Result<Self, BincountsError> {
        Self::with_config(space, items, counts, layout, BincountsConfig::for_variant(Variant::Le))
    }

    /// Validates the arguments and seeds the fits flags.
    pub fn with_config(
        space: &mut Space,
        items: &[VarId],
        counts: &[VarId],
        layout: BinLayout,
        config: BincountsConfig,
    ) -> Result<Self, BincountsError> {
        config.validate().map_err(BincountsError::Configuration)?;
        if counts.len() != layout.len() {
            return Err(BincountsError::Configuration(format!(
                "{} count variables for {} bins",
                counts.len(),
                layout.len()
            )));
        }
        if let Some(&var) = items.iter().chain(counts).find(|v| !space.contains(**v)) {
            return Err(BincountsError::UnknownVariable(var));
        }
        if let Some(&var) = counts.iter().find(|v| !space.domain(**v).is_int()) {
            return Err(BincountsError::Configuration(format!(
                "count variable {} is not integer",
                space.name(var)
            )));
        }
        if config.variant == Variant::Eq && !layout.is_contiguous() {
            return Err(BincountsError::Configuration(
                "bins must be contiguous when every item lands in a bin".into(),
            ));
        }

        if config.variant == Variant::Eq {
            for &item in items {
                let domain = space.domain(item);
                if !(0..layout.len()).any(|j| column_intersects(domain, &layout, j)) {
                    warn!("item {} fits no bin", space.name(item));
                }
            }
        }

        let flags = FitsFlags::seed(space, items, &layout, config.variant);
        let driver = Driver::new(Box::new(MicroLpSolver::new()), config.integrality_tolerance);
        debug!(
            "bincounts {:?}: {} items, {} bins",
            config.variant,
            items.len(),
            layout.len()
        );
        Ok(Self {
            items: items.to_vec(),
            counts: counts.to_vec(),
            variables: items.iter().chain(counts).copied().collect(),
            layout,
            config,
            flags,
            driver,
            phase: Phase::FlagsSeeded,
            epoch: space.epoch(),
            last_stamp: None,
        })
    }

    /// Replaces the default `microlp` backend.
    pub fn with_solver<S: LpSolver + 'static>(mut self, solver: S) -> Self {
        self.driver.set_solver(Box::new(solver));
        self
    }

    /// Item variables, in the order given at construction.
    pub fn items(&self) -> &[VarId] {
        &self.items
    }

    /// Count variables, one per bin.
    pub fn counts(&self) -> &[VarId] {
        &self.counts
    }

    /// The bins the counts refer to.
    pub fn layout(&self) -> &BinLayout {
        &self.layout
    }

    /// Configuration the instance was built with.
    pub fn config(&self) -> &BincountsConfig {
        &self.config
    }

    /// Where the instance is in its lifecycle.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Pass, solve and cache counters since construction.
    pub fn stats(&self) -> BincountsStats {
        self.driver.stats()
    }

    /// Fits flags per item: one per bin, plus the no-bin column of
    /// [`Variant::Le`].
    pub fn num_columns(&self) -> usize {
        self.flags.columns()
    }

    /// Whether `item` may still be routed through `column` in the current
    /// node. A false flag stays false until the host backtracks.
    pub fn fits(&self, space: &Space, item: usize, column: usize) -> bool {
        self.flags.get(space, item, column)
    }

    /// Checks a complete assignment. `None` while some variable is still
    /// open.
    pub fn is_satisfied(&self, space: &Space) -> Option<bool> {
        let mut tally = vec![0usize; self.layout.len()];
        for &item in &self.items {
            match self.layout.bin_of(space.value(item)?) {
                Some(j) => tally[j] += 1,
                None if self.config.variant == Variant::Le => {}
                None => return Some(false),
            }
        }
        for (&count, &n) in self.counts.iter().zip(&tally) {
            if space.value(count)? != n as f64 {
                return Some(false);
            }
        }
        Some(true)
    }

    /// Every item can only take values of a single column and every count
    /// equals the number of items in its bin.
    fn is_entailed(&self, space: &Space) -> bool {
        let columns = self.flags.columns();
        let mut tally = vec![0usize; columns];
        for &item in &self.items {
            let domain = space.domain(item);
            let mut open = (0..columns).filter(|&j| column_intersects(domain, &self.layout, j));
            match (open.next(), open.next()) {
                (Some(j), None) => tally[j] += 1,
                _ => return false,
            }
        }
        self.counts
            .iter()
            .zip(&tally)
            .all(|(&count, &n)| space.value(count) == Some(n as f64))
    }

    fn run(&mut self, space: &mut Space, pass: Pass) -> Result<(), Contradiction> {
        let Self {
            ref items,
            ref counts,
            ref layout,
            ref flags,
            ref config,
            ref mut driver,
            ..
        } = *self;
        let scope = Scope {
            items,
            counts,
            layout,
            flags,
            variant: config.variant,
        };
        match pass {
            Pass::Full => driver.full_pass(space, scope),
            Pass::Item(item) => driver.item_pass(space, scope, item),
            Pass::Count(column) => driver.count_pass(space, scope, column),
        }
    }

    fn full(&mut self, space: &mut Space) -> Result<PropagationStatus, Contradiction> {
        if space.epoch() != self.epoch {
            debug!("bincounts: backtrack detected, rebuilding relaxation");
            self.driver.invalidate();
            self.epoch = space.epoch();
        }
        let before = space.stamp();
        let result = self.run(space, Pass::Full);
        self.finish(space, before, result, Phase::Ready)
    }

    fn finish(
        &mut self,
        space: &Space,
        before: u64,
        result: Result<(), Contradiction>,
        phase: Phase,
    ) -> Result<PropagationStatus, Contradiction> {
        if let Err(contradiction) = result {
            debug!("bincounts failed: {contradiction}");
            self.phase = Phase::Failed;
            self.last_stamp = None;
            return Err(contradiction);
        }
        self.phase = phase;
        self.last_stamp = Some(space.stamp());
        if self.is_entailed(space) {
            Ok(PropagationStatus::Entailed)
        } else if space.stamp() != before {
            Ok(PropagationStatus::Narrowed)
        } else {
            Ok(PropagationStatus::Fixpoint)
        }
    }
}

impl Propagator for Bincounts {
    fn name(&self) -> &str {
        "bincounts"
    }

    /// Items first, then counts.
    fn variables(&self) -> &[VarId] {
        &self.variables
    }

    fn propagation_conditions(&self, index: usize) -> EventMask {
        if index < self.items.len() {
            EventMask::ALL
        } else {
            EventMask::BOUND
        }
    }

    fn propagate(&mut self, space: &mut Space) -> Result<PropagationStatus, Contradiction> {
        self.full(space)
    }

    fn propagate_on(
        &mut self,
        space: &mut Space,
        index: usize,
        _mask: EventMask,
    ) -> Result<PropagationStatus, Contradiction> {
        let stale = matches!(self.phase, Phase::FlagsSeeded | Phase::Failed);
        if stale || space.epoch() != self.epoch {
            return self.full(space);
        }

        let before = space.stamp();
        let n = self.items.len();
        let pass = match self.config.incremental {
            IncrementalPolicy::Full if self.last_stamp == Some(before) => {
                return Ok(PropagationStatus::Fixpoint);
            }
            IncrementalPolicy::Full => Pass::Full,
            IncrementalPolicy::Local if index < n => Pass::Item(index),
            IncrementalPolicy::Local => Pass::Count(index - n),
        };
        let result = self.run(space, pass);
        self.finish(space, before, result, Phase::Incremental)
    }
}
