//! Full and incremental propagation passes.

use super::bins::BinLayout;
use super::config::Variant;
use super::flags::{column_intersects, FitsFlags};
use super::relaxation::{Cell, Relaxation};
use crate::error::Contradiction;
use crate::lp::{LpSolver, LpStatus, Sense};
use crate::space::{Space, VarId};
use log::{debug, warn};

/// Borrowed view of a constraint's variables and layout.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub(crate) items: &'a [VarId],
    pub(crate) counts: &'a [VarId],
    pub(crate) layout: &'a BinLayout,
    pub(crate) flags: &'a FitsFlags,
    pub(crate) variant: Variant,
}

/// Counters of a Bincounts instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BincountsStats {
    /// Full passes run.
    pub full_passes: u64,
    /// Local passes run.
    pub incremental_passes: u64,
    /// LP solves issued.
    pub lp_solves: u64,
    /// Times the relaxation was rebuilt.
    pub rebuilds: u64,
    /// Cells skipped because their flag was already false.
    pub flag_cache_hits: u64,
    /// Cells closed by an LP optimum.
    pub prunings: u64,
}

/// Owns the relaxation and the solver, and turns LP optima into prunings.
pub(crate) struct Driver {
    relaxation: Option<Relaxation>,
    solver: Box<dyn LpSolver>,
    tolerance: f64,
    stats: BincountsStats,
}

impl Driver {
    pub(crate) fn new(solver: Box<dyn LpSolver>, tolerance: f64) -> Self {
        Self {
            relaxation: None,
            solver,
            tolerance,
            stats: BincountsStats::default(),
        }
    }

    pub(crate) fn set_solver(&mut self, solver: Box<dyn LpSolver>) {
        self.solver = solver;
    }

    pub(crate) fn stats(&self) -> BincountsStats {
        self.stats
    }

    /// Drops the relaxation; the next pass rebuilds it.
    pub(crate) fn invalidate(&mut self) {
        self.relaxation = None;
    }

    /// Bins first, settled across count-domain holes, then every item cell.
    pub(crate) fn full_pass(
        &mut self,
        space: &mut Space,
        scope: Scope<'_>,
    ) -> Result<(), Contradiction> {
        self.stats.full_passes += 1;
        debug!(
            "bincounts full pass: {} items, {} bins",
            scope.items.len(),
            scope.layout.len()
        );
        let mut pass = self.begin(space, scope);
        if scope.variant == Variant::Eq {
            for item in 0..scope.items.len() {
                pass.prune_gaps(space, item)?;
            }
        }
        pass.settle_counts(space)?;
        for item in 0..scope.items.len() {
            pass.item_cells(space, item)?;
        }
        Ok(())
    }

    /// All bin counts, then the cells of one item.
    pub(crate) fn item_pass(
        &mut self,
        space: &mut Space,
        scope: Scope<'_>,
        item: usize,
    ) -> Result<(), Contradiction> {
        self.stats.incremental_passes += 1;
        debug!("bincounts item pass: {}", space.name(scope.items[item]));
        let mut pass = self.begin(space, scope);
        if scope.variant == Variant::Eq {
            pass.prune_gaps(space, item)?;
        }
        pass.settle_counts(space)?;
        pass.item_cells(space, item)
    }

    /// The bounds of one bin count.
    pub(crate) fn count_pass(
        &mut self,
        space: &mut Space,
        scope: Scope<'_>,
        column: usize,
    ) -> Result<(), Contradiction> {
        self.stats.incremental_passes += 1;
        debug!("bincounts count pass: {}", space.name(scope.counts[column]));
        let mut pass = self.begin(space, scope);
        pass.count_bounds(space, column).map(|_| ())
    }

    fn begin<'a>(&'a mut self, space: &Space, scope: Scope<'a>) -> Pass<'a> {
        let relaxation = match self.relaxation.take() {
            Some(mut relaxation) => {
                relaxation.refresh(space, &scope);
                relaxation
            }
            None => {
                self.stats.rebuilds += 1;
                Relaxation::build(space, &scope)
            }
        };
        Pass {
            scope,
            relaxation: self.relaxation.insert(relaxation),
            solver: &mut self.solver,
            stats: &mut self.stats,
            tolerance: self.tolerance,
        }
    }
}

struct Pass<'a> {
    scope: Scope<'a>,
    relaxation: &'a mut Relaxation,
    solver: &'a mut Box<dyn LpSolver>,
    stats: &'a mut BincountsStats,
    tolerance: f64,
}

impl Pass<'_> {
    /// Integral optimum of `cell`, `None` when the solver proved nothing.
    fn optimum(
        &mut self,
        cell: Cell,
        sense: Sense,
        var: VarId,
    ) -> Result<Option<f64>, Contradiction> {
        self.stats.lp_solves += 1;
        let outcome = self.relaxation.solve(cell, sense, &mut **self.solver);
        match outcome.status {
            LpStatus::Optimal => {
                let value = outcome.value;
                if (value - value.round()).abs() > self.tolerance {
                    warn!("non-integral optimum {value} for {cell:?} ({sense:?})");
                }
                Ok(Some(match sense {
                    Sense::Minimise => (value - self.tolerance).ceil(),
                    Sense::Maximise => (value + self.tolerance).floor(),
                }))
            }
            LpStatus::Infeasible => Err(Contradiction::Infeasible { var }),
            status => {
                debug!("no deduction for {cell:?} ({sense:?}): {status:?}");
                Ok(None)
            }
        }
    }

    /// Count bounds of every bin until none lands past its LP optimum.
    ///
    /// A bound that skips a hole of a count domain tightens the relaxation
    /// for the bins already visited, so those are solved again.
    fn settle_counts(&mut self, space: &mut Space) -> Result<(), Contradiction> {
        let mut round = 0usize;
        loop {
            round += 1;
            let mut jumped = false;
            for column in 0..self.scope.layout.len() {
                jumped |= self.count_bounds(space, column)?;
            }
            if !jumped {
                return Ok(());
            }
            debug!("bincounts: count bounds skipped holes, round {round}");
        }
    }

    /// Tightens one count to its LP range. Returns whether a bound moved
    /// beyond the LP optimum.
    fn count_bounds(&mut self, space: &mut Space, column: usize) -> Result<bool, Contradiction> {
        let var = self.scope.counts[column];
        let cell = Cell::Count { column };
        let mut jumped = false;
        if let Some(lo) = self.optimum(cell, Sense::Minimise, var)? {
            space.update_lower_bound(var, lo)?;
            jumped |= space.lower_bound(var) > lo;
        }
        if let Some(hi) = self.optimum(cell, Sense::Maximise, var)? {
            space.update_upper_bound(var, hi)?;
            jumped |= space.upper_bound(var) < hi;
        }
        self.relaxation
            .set_count_bounds(column, space.lower_bound(var), space.upper_bound(var));
        Ok(jumped)
    }

    fn item_cells(&mut self, space: &mut Space, item: usize) -> Result<(), Contradiction> {
        let var = self.scope.items[item];
        let flags = self.scope.flags;
        for column in 0..flags.columns() {
            if !flags.get(space, item, column) {
                self.stats.flag_cache_hits += 1;
                continue;
            }
            if !column_intersects(space.domain(var), self.scope.layout, column) {
                self.close(space, item, column);
                continue;
            }

            let cell = Cell::Assignment { item, column };
            if let Some(min) = self.optimum(cell, Sense::Minimise, var)? {
                if min >= 1.0 {
                    debug!("bincounts: {} forced into column {column}", space.name(var));
                    for other in (0..flags.columns()).filter(|&k| k != column) {
                        self.remove_column(space, var, other)?;
                        self.close(space, item, other);
                    }
                    self.stats.prunings += 1;
                    break;
                }
            }
            if let Some(max) = self.optimum(cell, Sense::Maximise, var)? {
                if max <= 0.0 {
                    debug!("bincounts: {} leaves column {column}", space.name(var));
                    self.remove_column(space, var, column)?;
                    self.close(space, item, column);
                    self.stats.prunings += 1;
                }
            }
        }
        Ok(())
    }

    /// Removes values covered by no bin.
    fn prune_gaps(&mut self, space: &mut Space, item: usize) -> Result<bool, Contradiction> {
        let var = self.scope.items[item];
        let mut changed = false;
        for gap in self.scope.layout.gaps() {
            changed |= space.remove_interval(var, gap.lo, gap.hi)?;
        }
        Ok(changed)
    }

    /// Removes the values of `var` routed through `column`. For the no-bin
    /// column these are the values covered by no bin.
    fn remove_column(
        &mut self,
        space: &mut Space,
        var: VarId,
        column: usize,
    ) -> Result<bool, Contradiction> {
        let layout = self.scope.layout;
        if column < layout.len() {
            let bin = layout.bin(column);
            return space.remove_interval(var, bin.lo, bin.hi);
        }
        let mut changed = false;
        for gap in layout.gaps() {
            changed |= space.remove_interval(var, gap.lo, gap.hi)?;
        }
        Ok(changed)
    }

    fn close(&mut self, space: &mut Space, item: usize, column: usize) {
        self.scope.flags.clear(space, item, column);
        self.relaxation.set_assignment_upper(item, column, 0.0);
    }
}
