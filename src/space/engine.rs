//! Propagation engine.

use super::{EventMask, FlagId, Space, VarId};
use crate::error::Contradiction;
use log::{debug, trace};
use std::collections::VecDeque;

/// Outcome of a successful propagation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationStatus {
    /// Nothing was narrowed.
    Fixpoint,
    /// At least one domain was narrowed.
    Narrowed,
    /// The constraint holds for every remaining combination of values; it
    /// need not be called again in this branch.
    Entailed,
}

impl PropagationStatus {
    /// Combines two statuses of consecutive calls.
    pub fn merge(self, other: PropagationStatus) -> PropagationStatus {
        use PropagationStatus::*;
        match (self, other) {
            (Entailed, _) | (_, Entailed) => Entailed,
            (Narrowed, _) | (_, Narrowed) => Narrowed,
            _ => Fixpoint,
        }
    }
}

/// A constraint's filtering algorithm as seen by the engine.
///
/// The engine calls [`Propagator::propagate`] once right after posting, and
/// [`Propagator::propagate_on`] for every later event on a watched variable
/// whose kind matches [`Propagator::propagation_conditions`].
pub trait Propagator {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// The variables this propagator watches, indexed locally.
    fn variables(&self) -> &[VarId];

    /// Event kinds on variable `index` that should wake this propagator.
    fn propagation_conditions(&self, _index: usize) -> EventMask {
        EventMask::ALL
    }

    /// Full propagation.
    fn propagate(&mut self, space: &mut Space) -> Result<PropagationStatus, Contradiction>;

    /// Propagation after variable `index` changed with `mask`.
    fn propagate_on(
        &mut self,
        space: &mut Space,
        index: usize,
        mask: EventMask,
    ) -> Result<PropagationStatus, Contradiction>;
}

/// Counters collected by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStatistics {
    /// Number of propagator calls.
    pub calls: u64,
    /// Number of failed fixpoint computations.
    pub failures: u64,
    /// Number of successful fixpoint computations.
    pub fixpoints: u64,
}

struct Watch {
    propagator: usize,
    index: usize,
    conditions: EventMask,
}

/// Runs posted propagators to a common fixpoint.
///
/// Scheduling is FIFO with one queue slot per propagator; events arriving
/// while a propagator is queued are appended to its pending list.
///
/// # Examples
///
/// ```
/// use u_bincounts::bincounts::{BinLayout, Bincounts};
/// use u_bincounts::space::{PropagationEngine, Space};
///
/// let mut space = Space::new();
/// let items: Vec<_> = [1, 2, 3]
///     .iter()
///     .map(|&v| space.new_int_var(format!("item_{v}"), v, v))
///     .collect();
/// let counts = vec![space.new_int_var("c0", 0, 3), space.new_int_var("c1", 0, 3)];
/// let layout = BinLayout::from_boundaries(&[1.0, 3.0, 4.0]).unwrap();
/// let constraint = Bincounts::eq(&mut space, &items, &counts, layout).unwrap();
///
/// let mut engine = PropagationEngine::new(space);
/// engine.post(constraint);
/// engine.propagate().unwrap();
///
/// assert_eq!(engine.space().value(counts[0]), Some(2.0));
/// assert_eq!(engine.space().value(counts[1]), Some(1.0));
/// ```
pub struct PropagationEngine {
    space: Space,
    propagators: Vec<Box<dyn Propagator>>,
    watches: Vec<Vec<Watch>>,
    queue: VecDeque<usize>,
    enqueued: Vec<bool>,
    pending: Vec<Vec<(usize, EventMask)>>,
    needs_full: Vec<bool>,
    entailed: Vec<FlagId>,
    stats: PropagationStatistics,
}

impl PropagationEngine {
    pub fn new(space: Space) -> Self {
        Self {
            space,
            propagators: Vec::new(),
            watches: Vec::new(),
            queue: VecDeque::new(),
            enqueued: Vec::new(),
            pending: Vec::new(),
            needs_full: Vec::new(),
            entailed: Vec::new(),
            stats: PropagationStatistics::default(),
        }
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    /// Mutable access for decisions. Changes made here are picked up by the
    /// next [`PropagationEngine::propagate`].
    pub fn space_mut(&mut self) -> &mut Space {
        &mut self.space
    }

    pub fn into_space(self) -> Space {
        self.space
    }

    pub fn statistics(&self) -> PropagationStatistics {
        self.stats
    }

    pub fn num_propagators(&self) -> usize {
        self.propagators.len()
    }

    /// Registers a propagator and schedules its initial full call.
    pub fn post<P: Propagator + 'static>(&mut self, propagator: P) -> usize {
        let id = self.propagators.len();
        if self.watches.len() < self.space.num_vars() {
            self.watches.resize_with(self.space.num_vars(), Vec::new);
        }
        for (index, &var) in propagator.variables().iter().enumerate() {
            let conditions = propagator.propagation_conditions(index);
            if conditions.is_empty() {
                continue;
            }
            if var.index() >= self.watches.len() {
                self.watches.resize_with(var.index() + 1, Vec::new);
            }
            self.watches[var.index()].push(Watch {
                propagator: id,
                index,
                conditions,
            });
        }
        debug!("post propagator {} ({})", id, propagator.name());

        self.propagators.push(Box::new(propagator));
        self.enqueued.push(false);
        self.pending.push(Vec::new());
        self.needs_full.push(true);
        let flag = self.space.new_flag(false);
        self.entailed.push(flag);
        self.enqueue(id);
        id
    }

    /// Runs the queue until no propagator has pending work.
    pub fn propagate(&mut self) -> Result<(), Contradiction> {
        loop {
            self.schedule_events();
            let Some(id) = self.queue.pop_front() else {
                break;
            };
            self.enqueued[id] = false;
            if self.space.flag(self.entailed[id]) {
                self.pending[id].clear();
                continue;
            }

            match self.run(id) {
                Ok(PropagationStatus::Entailed) => {
                    trace!("propagator {id} entailed");
                    self.space.set_flag(self.entailed[id], true);
                }
                Ok(_) => {}
                Err(contradiction) => {
                    debug!("propagator {id} failed: {contradiction}");
                    self.stats.failures += 1;
                    self.reset_queue();
                    return Err(contradiction);
                }
            }
        }
        self.stats.fixpoints += 1;
        Ok(())
    }

    fn run(&mut self, id: usize) -> Result<PropagationStatus, Contradiction> {
        let propagator = &mut self.propagators[id];
        if self.needs_full[id] {
            self.needs_full[id] = false;
            self.pending[id].clear();
            self.stats.calls += 1;
            return propagator.propagate(&mut self.space);
        }

        let events = std::mem::take(&mut self.pending[id]);
        let mut status = PropagationStatus::Fixpoint;
        for (index, mask) in events {
            self.stats.calls += 1;
            status = status.merge(propagator.propagate_on(&mut self.space, index, mask)?);
            if status == PropagationStatus::Entailed {
                break;
            }
        }
        Ok(status)
    }

    /// Opens a choice point.
    pub fn push(&mut self) {
        self.space.checkpoint();
    }

    /// Returns to the last choice point, discarding any pending work.
    pub fn pop(&mut self) -> bool {
        self.reset_queue();
        self.space.backtrack()
    }

    fn schedule_events(&mut self) {
        for (var, mask) in self.space.take_events() {
            let Some(watches) = self.watches.get(var.index()) else {
                continue;
            };
            for watch in watches {
                if !watch.conditions.intersects(mask) {
                    continue;
                }
                self.pending[watch.propagator].push((watch.index, mask));
                if !self.enqueued[watch.propagator] {
                    self.enqueued[watch.propagator] = true;
                    self.queue.push_back(watch.propagator);
                }
            }
        }
    }

    fn enqueue(&mut self, id: usize) {
        if !self.enqueued[id] {
            self.enqueued[id] = true;
            self.queue.push_back(id);
        }
    }

    fn reset_queue(&mut self) {
        for id in self.queue.drain(..) {
            self.enqueued[id] = false;
        }
        for pending in &mut self.pending {
            pending.clear();
        }
        self.space.clear_events();
    }
}
