//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use microgrid_sim::components::{GridComponent, Registry};
use microgrid_sim::grid::{Cell, CellGrid};
use microgrid_sim::sim::clock::TimeOfDay;
use microgrid_sim::sim::engine::Engine;
use microgrid_sim::sim::scenario::ScenarioTable;

/// Square grid with exactly the listed cells switched on.
pub fn grid_with(size: usize, cells: &[(usize, usize)]) -> CellGrid {
    let mut grid = CellGrid::new(size);
    for &(x, y) in cells {
        grid.set_exists(Cell::new(x, y), true);
    }
    grid
}

/// Places every component, panicking on the first rejection.
pub fn place_all(grid: &mut CellGrid, components: Vec<GridComponent>) -> Registry {
    let mut registry = Registry::new();
    for c in components {
        registry.place(grid, c).expect("fixture placement should succeed");
    }
    registry
}

/// Engine over `grid` with no scenario entries, starting at midnight.
pub fn engine_with(mut grid: CellGrid, components: Vec<GridComponent>) -> Engine {
    let registry = place_all(&mut grid, components);
    Engine::new(grid, registry, ScenarioTable::new(), TimeOfDay::default())
}

/// 3x1 line: producer P (max 10, full) at (0,0), consumer U (wants 4) at (2,0).
///
/// With `bridge = false` the middle cell is missing and P and U end up in
/// different subgroups.
pub fn line_engine(bridge: bool) -> Engine {
    let cells: &[(usize, usize)] = if bridge {
        &[(0, 0), (1, 0), (2, 0)]
    } else {
        &[(0, 0), (2, 0)]
    };
    engine_with(
        grid_with(3, cells),
        vec![
            GridComponent::producer("P", Cell::new(0, 0), 10.0).with_current_kwh(10.0),
            GridComponent::consumer("U", Cell::new(2, 0)).with_desired_kwh(4.0),
        ],
    )
}

/// Clusters of 6, 3 and 1 cells on an 8x8 grid.
pub fn three_clusters() -> CellGrid {
    grid_with(
        8,
        &[
            (0, 0),
            (1, 0),
            (2, 0),
            (0, 1),
            (1, 1),
            (2, 1),
            (4, 0),
            (5, 0),
            (5, 1),
            (7, 0),
        ],
    )
}

/// U-shaped corridor on a 3x3 grid: (0,0) and (2,0) are 6 hops apart
/// because (1,0) and (1,1) are missing.
pub fn u_corridor() -> CellGrid {
    grid_with(
        3,
        &[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2), (2, 1), (2, 0)],
    )
}
