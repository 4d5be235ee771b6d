//! Property-based tests for Bincounts filtering.
//!
//! These tests verify that:
//! - A full pass keeps exactly the item values that appear in some valid
//!   assignment, and tightens interval counts to their attainable range
//! - Propagation never fails or removes a value along a valid assignment
//! - The engine's fixpoint is also a fixpoint of a fresh full pass
//! - Every LP optimum the driver reads is integral
//! - Within a node, domains only shrink and fits flags only turn false

use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use u_bincounts::bincounts::{BinLayout, Bincounts, BincountsConfig, IncrementalPolicy, Variant};
use u_bincounts::lp::{LpModel, LpOutcome, LpSolver, MicroLpSolver, Sense};
use u_bincounts::space::{EventMask, PropagationEngine, Propagator, Space, VarId};

#[derive(Debug, Clone)]
struct Instance {
    /// Integer bin edges; bin `j` is `[boundaries[j], boundaries[j + 1])`.
    boundaries: Vec<i64>,
    items: Vec<Vec<i64>>,
    /// Allowed values per count, sorted.
    counts: Vec<Vec<i64>>,
}

/// Random layouts of 1 to 3 bins of width 1 to 3; item values range one
/// past either end. With `holes`, count domains may miss an inner value.
fn arb_instance(holes: bool) -> impl Strategy<Value = Instance> {
    (prop::collection::vec(1i64..=3, 1..=3), 1usize..=4)
        .prop_flat_map(move |(widths, n)| {
            let boundaries: Vec<i64> = std::iter::once(0)
                .chain(widths.iter().scan(0, |edge, w| {
                    *edge += w;
                    Some(*edge)
                }))
                .collect();
            let top = boundaries[boundaries.len() - 1];
            let item = prop::collection::btree_set(-1i64..=top, 1..=4)
                .prop_map(|values| values.into_iter().collect::<Vec<_>>());
            let n = n as i64;
            let count = (0..=n, 0..=n, 0..=n).prop_map(move |(a, b, hole)| {
                let (lo, hi) = (a.min(b), a.max(b));
                (lo..=hi)
                    .filter(|&v| !holes || v != hole || lo == hi)
                    .collect::<Vec<_>>()
            });
            (
                Just(boundaries),
                prop::collection::vec(item, n as usize),
                prop::collection::vec(count, widths.len()),
            )
        })
        .prop_map(|(boundaries, items, counts)| Instance {
            boundaries,
            items,
            counts,
        })
}

fn arb_variant() -> impl Strategy<Value = Variant> {
    prop_oneof![Just(Variant::Eq), Just(Variant::Le)]
}

fn arb_policy() -> impl Strategy<Value = IncrementalPolicy> {
    prop_oneof![Just(IncrementalPolicy::Full), Just(IncrementalPolicy::Local)]
}

impl Instance {
    fn bins(&self) -> usize {
        self.boundaries.len() - 1
    }

    fn bin_of(&self, value: i64) -> Option<usize> {
        self.boundaries
            .windows(2)
            .position(|edge| edge[0] <= value && value < edge[1])
    }

    fn layout(&self) -> BinLayout {
        BinLayout::from_int_boundaries(&self.boundaries).unwrap()
    }

    fn build(&self, config: BincountsConfig) -> (Space, Vec<VarId>, Vec<VarId>, Bincounts) {
        let mut space = Space::new();
        let items: Vec<VarId> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, values)| space.new_int_var_from_values(format!("x{i}"), values.clone()))
            .collect();
        let counts: Vec<VarId> = self
            .counts
            .iter()
            .enumerate()
            .map(|(j, values)| space.new_int_var_from_values(format!("c{j}"), values.clone()))
            .collect();
        let bincounts =
            Bincounts::with_config(&mut space, &items, &counts, self.layout(), config).unwrap();
        (space, items, counts, bincounts)
    }
}

/// Supports collected by enumerating every combination of item values.
struct Support {
    items: Vec<BTreeSet<i64>>,
    counts: Vec<(i64, i64)>,
    witness: Option<Vec<i64>>,
}

fn enumerate(inst: &Instance, variant: Variant) -> Support {
    let mut support = Support {
        items: vec![BTreeSet::new(); inst.items.len()],
        counts: vec![(i64::MAX, i64::MIN); inst.bins()],
        witness: None,
    };
    let mut choice = Vec::with_capacity(inst.items.len());
    visit(inst, variant, &mut choice, &mut support);
    support
}

fn visit(inst: &Instance, variant: Variant, choice: &mut Vec<i64>, support: &mut Support) {
    let i = choice.len();
    if i == inst.items.len() {
        let mut tally = vec![0i64; inst.bins()];
        for &v in choice.iter() {
            match inst.bin_of(v) {
                Some(j) => tally[j] += 1,
                None if variant == Variant::Le => {}
                None => return,
            }
        }
        if tally
            .iter()
            .zip(&inst.counts)
            .any(|(t, allowed)| !allowed.contains(t))
        {
            return;
        }
        for (set, &v) in support.items.iter_mut().zip(choice.iter()) {
            set.insert(v);
        }
        for (range, &t) in support.counts.iter_mut().zip(&tally) {
            range.0 = range.0.min(t);
            range.1 = range.1.max(t);
        }
        if support.witness.is_none() {
            support.witness = Some(choice.clone());
        }
        return;
    }
    for &v in &inst.items[i] {
        choice.push(v);
        visit(inst, variant, choice, support);
        choice.pop();
    }
}

fn values(space: &Space, var: VarId) -> BTreeSet<i64> {
    space.int_domain(var).unwrap().values().collect()
}

fn domains(space: &Space, vars: &[VarId]) -> Vec<BTreeSet<i64>> {
    vars.iter().map(|&v| values(space, v)).collect()
}

fn flags(space: &Space, bincounts: &Bincounts) -> Vec<bool> {
    let columns = bincounts.num_columns();
    (0..bincounts.items().len())
        .flat_map(|i| (0..columns).map(move |j| (i, j)))
        .map(|(i, j)| bincounts.fits(space, i, j))
        .collect()
}

/// The default solver, keeping every optimum it reports.
struct Recording {
    inner: MicroLpSolver,
    optima: Rc<RefCell<Vec<f64>>>,
}

impl LpSolver for Recording {
    fn solve(&mut self, model: &LpModel, sense: Sense) -> LpOutcome {
        let outcome = self.inner.solve(model, sense);
        if outcome.is_feasible() {
            self.optima.borrow_mut().push(outcome.value);
        }
        outcome
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    /// The first full pass keeps exactly the supported values.
    #[test]
    fn full_pass_matches_enumeration(inst in arb_instance(false), variant in arb_variant()) {
        let support = enumerate(&inst, variant);
        let (space, items, counts, bincounts) = inst.build(BincountsConfig::for_variant(variant));
        let mut engine = PropagationEngine::new(space);
        engine.post(bincounts);
        let result = engine.propagate();

        if support.witness.is_none() {
            prop_assert!(result.is_err());
            return Ok(());
        }
        prop_assert!(result.is_ok());
        let space = engine.space();
        for (i, &item) in items.iter().enumerate() {
            prop_assert_eq!(values(space, item), support.items[i].clone(), "item {}", i);
        }
        for (j, &count) in counts.iter().enumerate() {
            let (lo, hi) = support.counts[j];
            prop_assert_eq!(space.lower_bound(count), lo as f64, "count {} lower", j);
            prop_assert_eq!(space.upper_bound(count), hi as f64, "count {} upper", j);
        }
    }

    /// Fixing items one at a time along a valid assignment never fails and
    /// ends with the counts of that assignment.
    #[test]
    fn dive_along_solution_succeeds(
        inst in arb_instance(true),
        variant in arb_variant(),
        policy in arb_policy(),
    ) {
        let support = enumerate(&inst, variant);
        let Some(witness) = support.witness else {
            return Ok(());
        };
        let config = BincountsConfig::for_variant(variant).with_incremental(policy);
        let (space, items, counts, bincounts) = inst.build(config);
        let mut engine = PropagationEngine::new(space);
        engine.post(bincounts);
        prop_assert!(engine.propagate().is_ok());

        for (&item, &v) in items.iter().zip(&witness) {
            engine.push();
            prop_assert!(values(engine.space(), item).contains(&v));
            prop_assert!(engine.space_mut().instantiate(item, v as f64).is_ok());
            prop_assert!(engine.propagate().is_ok());
        }
        for (j, &count) in counts.iter().enumerate() {
            let expected = witness.iter().filter(|&&v| inst.bin_of(v) == Some(j)).count();
            prop_assert_eq!(engine.space().value(count), Some(expected as f64));
        }
    }

    /// Whatever the policy, the engine stops where a fresh full pass has
    /// nothing left to narrow.
    #[test]
    fn engine_fixpoint_is_full_pass_fixpoint(
        inst in arb_instance(true),
        variant in arb_variant(),
        policy in arb_policy(),
    ) {
        let config = BincountsConfig::for_variant(variant).with_incremental(policy);
        let (space, items, counts, bincounts) = inst.build(config);
        let mut engine = PropagationEngine::new(space);
        engine.post(bincounts);
        if engine.propagate().is_err() {
            return Ok(());
        }

        let mut space = engine.into_space();
        let vars: Vec<VarId> = items.iter().chain(&counts).copied().collect();
        let snapshot = domains(&space, &vars);
        let mut fresh = Bincounts::with_config(
            &mut space,
            &items,
            &counts,
            inst.layout(),
            BincountsConfig::for_variant(variant),
        )
        .unwrap();
        let stamp = space.stamp();
        prop_assert!(fresh.propagate(&mut space).is_ok());
        prop_assert_eq!(space.stamp(), stamp);
        prop_assert_eq!(domains(&space, &vars), snapshot);
    }

    /// Raw optima are integers up to tolerance, down a whole dive.
    #[test]
    fn lp_optima_are_integral(
        inst in arb_instance(true),
        variant in arb_variant(),
        policy in arb_policy(),
    ) {
        let optima = Rc::new(RefCell::new(Vec::new()));
        let config = BincountsConfig::for_variant(variant).with_incremental(policy);
        let tolerance = config.integrality_tolerance;
        let (space, items, _, bincounts) = inst.build(config);
        let bincounts = bincounts.with_solver(Recording {
            inner: MicroLpSolver::new(),
            optima: Rc::clone(&optima),
        });
        let mut engine = PropagationEngine::new(space);
        engine.post(bincounts);

        if engine.propagate().is_ok() {
            for &item in &items {
                engine.push();
                let lo = engine.space().lower_bound(item);
                if engine.space_mut().instantiate(item, lo).is_err() || engine.propagate().is_err() {
                    break;
                }
            }
        }

        let optima = optima.borrow();
        for &value in optima.iter() {
            prop_assert!((value - value.round()).abs() <= tolerance, "optimum {}", value);
        }
    }

    /// Repeated calls in one node never widen a domain or restore a flag.
    #[test]
    fn propagation_is_monotone_within_a_node(
        inst in arb_instance(true),
        variant in arb_variant(),
        policy in arb_policy(),
        removals in prop::collection::vec((0usize..4, 0usize..8), 1..6),
    ) {
        let config = BincountsConfig::for_variant(variant).with_incremental(policy);
        let (mut space, items, counts, mut bincounts) = inst.build(config);
        let vars: Vec<VarId> = items.iter().chain(&counts).copied().collect();

        let mut before = (domains(&space, &vars), flags(&space, &bincounts));
        if bincounts.propagate(&mut space).is_err() {
            return Ok(());
        }
        for (pick, nth) in removals {
            let after = (domains(&space, &vars), flags(&space, &bincounts));
            for (now, was) in after.0.iter().zip(&before.0) {
                prop_assert!(now.is_subset(was));
            }
            for (&now, &was) in after.1.iter().zip(&before.1) {
                prop_assert!(!now || was);
            }

            let i = pick % items.len();
            let choices: Vec<i64> = values(&space, items[i]).into_iter().collect();
            if choices.len() < 2 {
                before = after;
                continue;
            }
            prop_assert!(space.remove_value(items[i], choices[nth % choices.len()]).is_ok());
            before = (domains(&space, &vars), flags(&space, &bincounts));
            if bincounts.propagate_on(&mut space, i, EventMask::REMOVE).is_err() {
                return Ok(());
            }
        }
        let after = (domains(&space, &vars), flags(&space, &bincounts));
        for (now, was) in after.0.iter().zip(&before.0) {
            prop_assert!(now.is_subset(was));
        }
        for (&now, &was) in after.1.iter().zip(&before.1) {
            prop_assert!(!now || was);
        }
    }
}
