//! Property-based tests for connectivity, allocation and scenario handling.

mod common;

use std::collections::BTreeSet;

use microgrid_sim::components::GridComponent;
use microgrid_sim::grid::{Cell, CellGrid, Distance, all_subgroups, cell_distance};
use microgrid_sim::sim::allocation::transfer;
use microgrid_sim::sim::clock::TimeOfDay;
use microgrid_sim::sim::engine::Engine;
use microgrid_sim::sim::scenario::{ScenarioEntry, ScenarioTable, apply_scenario};
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// Random square grid of side 1..=6 with random cell existence.
fn arb_grid() -> impl Strategy<Value = CellGrid> {
    (1..=6usize).prop_flat_map(|size| {
        proptest::collection::vec(any::<bool>(), size * size).prop_map(move |bits| {
            let mut grid = CellGrid::new(size);
            for (i, on) in bits.into_iter().enumerate() {
                grid.set_exists(Cell::new(i % size, i / size), on);
            }
            grid
        })
    })
}

/// Random component of any kind at `cell`.
fn arb_component(cell: Cell, n: usize) -> impl Strategy<Value = GridComponent> {
    (0..4u8, 0.0..20.0f32, 0.0..20.0f32).prop_map(move |(kind, a, b)| {
        let id = format!("c{n}");
        match kind {
            0 => GridComponent::producer(id, cell, a).with_current_kwh(b),
            1 => GridComponent::consumer(id, cell).with_desired_kwh(a),
            2 => GridComponent::storage(id, cell, a).with_current_kwh(b),
            _ => GridComponent::converter(id, cell).with_desired_kwh(a),
        }
    })
}

/// Random engine: a grid with a component on a random subset of its cells.
fn arb_engine() -> impl Strategy<Value = Engine> {
    arb_grid().prop_flat_map(|grid| {
        let size = grid.size();
        proptest::collection::vec(any::<bool>(), size * size).prop_flat_map(move |occupied| {
            let grid = grid.clone();
            let cells: Vec<Cell> = occupied
                .iter()
                .enumerate()
                .filter(|&(_, &on)| on)
                .map(|(i, _)| Cell::new(i % size, i / size))
                .collect();
            let parts: Vec<_> = cells
                .into_iter()
                .enumerate()
                .map(|(n, cell)| arb_component(cell, n))
                .collect();
            parts.prop_map(move |components| common::engine_with(grid.clone(), components))
        })
    })
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Subgroups are disjoint and cover every existing cell exactly once.
    #[test]
    fn subgroups_partition_existing_cells(grid in arb_grid()) {
        let groups = all_subgroups(&grid);
        let mut seen = BTreeSet::new();
        for group in &groups {
            prop_assert!(!group.is_empty());
            for &cell in group {
                prop_assert!(grid.exists(cell));
                prop_assert!(seen.insert(cell), "cell {} in two subgroups", cell);
            }
        }
        let existing: BTreeSet<Cell> = grid.existing_cells().collect();
        prop_assert_eq!(seen, existing);
    }

    /// Distance is symmetric, zero only on the diagonal, and reachable
    /// exactly within a subgroup.
    #[test]
    fn distance_symmetry_and_identity(grid in arb_grid()) {
        let groups = all_subgroups(&grid);
        let group_of = |c: Cell| groups.iter().position(|g| g.contains(&c));
        let cells: Vec<Cell> = grid.existing_cells().collect();
        for &a in &cells {
            prop_assert_eq!(cell_distance(&grid, a, a), Distance::SameCell);
            for &b in &cells {
                let ab = cell_distance(&grid, a, b);
                prop_assert_eq!(ab, cell_distance(&grid, b, a));
                prop_assert_eq!(ab.is_reachable(), group_of(a) == group_of(b));
                if let Distance::Hops(n) = ab {
                    let manhattan = a.x.abs_diff(b.x) + a.y.abs_diff(b.y);
                    prop_assert!(n as usize >= manhattan);
                }
            }
        }
    }

    /// A single transfer never takes more than the source held nor gives
    /// more than the sink was missing.
    #[test]
    fn transfer_conserves_energy(
        held in 0.0..50.0f32,
        max in 0.0..50.0f32,
        desired in 0.0..50.0f32,
        got in 0.0..50.0f32,
    ) {
        let mut parts = vec![
            GridComponent::producer("p", Cell::new(0, 0), max).with_current_kwh(held),
            GridComponent::consumer("u", Cell::new(1, 0)).with_desired_kwh(desired),
        ];
        parts[1].current_kwh = got;
        let (before_src, need) = (parts[0].current_kwh, parts[1].outstanding_kwh());

        let moved = transfer(&mut parts, 0, 1);

        prop_assert!(moved >= 0.0);
        prop_assert!(moved <= before_src + 1e-4);
        prop_assert!(moved <= need + 1e-4);
        prop_assert!(parts[0].current_kwh >= 0.0);
        prop_assert!((parts[0].current_kwh + moved - before_src).abs() < 1e-3);
        prop_assert!((parts[1].current_kwh - moved - got).abs() < 1e-3);
    }

    /// After any number of steps, held energy stays within capacity and
    /// sinks are never over-served.
    #[test]
    fn satisfaction_stays_in_bounds(mut engine in arb_engine(), steps in 1..4usize) {
        let total_before: f32 = engine.components().iter().map(|c| c.current_kwh).sum();
        let mut delivered = 0.0;
        for _ in 0..steps {
            delivered += engine.step().delivered_kwh;
        }
        let total_after: f32 = engine.components().iter().map(|c| c.current_kwh).sum();
        prop_assert!((total_before - total_after).abs() < 1e-2);
        prop_assert!(delivered >= 0.0);

        for c in engine.components() {
            let s = c.satisfaction();
            prop_assert!((0.0..=100.0 + 1e-3).contains(&s), "{} at {}", c.id, s);
            if let Some(max) = c.max_kwh() {
                prop_assert!(c.current_kwh <= max + 1e-4);
            }
            prop_assert!(c.current_kwh >= 0.0);
        }
        if let Some(eq) = engine.running_equilibrium() {
            prop_assert!((0.0..=100.0 + 1e-3).contains(&eq));
        }
    }

    /// Applying the same entry twice leaves consumers and converters as
    /// one application does.
    #[test]
    fn scenario_application_is_idempotent_for_sinks(
        demand in 0.0..10.0f32,
        p2x in 0.0..10.0f32,
    ) {
        let mut grid = common::grid_with(3, &[(0, 0), (1, 0), (2, 0)]);
        let mut registry = common::place_all(
            &mut grid,
            vec![
                GridComponent::consumer("u", Cell::new(0, 0)).with_desired_kwh(1.0),
                GridComponent::converter("x", Cell::new(1, 0)).with_desired_kwh(1.0),
            ],
        );
        let mut entry = ScenarioEntry::default();
        entry.consumer_targets.insert("u".into(), demand);
        entry.converter_targets.insert("x".into(), p2x);
        let mut table = ScenarioTable::new();
        table.insert(TimeOfDay::default(), entry);

        apply_scenario(&table, TimeOfDay::default(), &mut registry);
        let once: Vec<(f32, f32)> =
            registry.iter().map(|c| (c.current_kwh, c.desired_kwh)).collect();
        apply_scenario(&table, TimeOfDay::default(), &mut registry);
        let twice: Vec<(f32, f32)> =
            registry.iter().map(|c| (c.current_kwh, c.desired_kwh)).collect();
        prop_assert_eq!(once, twice);
    }
}
