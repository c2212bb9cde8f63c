//! Connected subgroups and hop distances over existing cells.
//!
//! Adjacency is 4-directional. Every query is a pure function of the
//! [`CellGrid`] it is handed; [`DistanceCache`] memoizes distances for as long
//! as the caller keeps the topology unchanged (one engine step).

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use super::cell::{Cell, CellGrid};

/// A maximal set of existing, mutually reachable cells.
pub type Subgroup = BTreeSet<Cell>;

/// Result of a shortest-path query between two cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    /// The cells are not in the same subgroup, or one of them does not exist.
    Unreachable,
    /// Source and target are the same existing cell.
    SameCell,
    /// Number of hops along the shortest path.
    Hops(u32),
}

impl Distance {
    /// Hop count, with [`Distance::SameCell`] mapped to zero.
    pub fn hops(self) -> Option<u32> {
        match self {
            Distance::Unreachable => None,
            Distance::SameCell => Some(0),
            Distance::Hops(n) => Some(n),
        }
    }

    pub fn is_reachable(self) -> bool {
        self != Distance::Unreachable
    }
}

/// In-bounds 4-neighbours of `cell`, whether they exist or not.
fn adjacent(grid: &CellGrid, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
    let (x, y) = (cell.x as i64, cell.y as i64);
    [(x, y - 1), (x + 1, y), (x, y + 1), (x - 1, y)]
        .into_iter()
        .filter_map(|(nx, ny)| grid.cell(nx, ny))
}

/// Existing 4-neighbours of `cell`.
pub fn direct_neighbours(grid: &CellGrid, cell: Cell) -> Vec<Cell> {
    adjacent(grid, cell).filter(|n| grid.exists(*n)).collect()
}

/// Connected component of existing cells reachable from `cell`.
///
/// Returns an empty set when `cell` does not exist. Depth-first with an
/// explicit stack; the visited set guarantees termination on cyclic
/// layouts.
pub fn subgroup_of(grid: &CellGrid, cell: Cell) -> Subgroup {
    let mut visited = Subgroup::new();
    if !grid.exists(cell) {
        return visited;
    }

    let mut stack = vec![cell];
    visited.insert(cell);
    while let Some(current) = stack.pop() {
        for next in adjacent(grid, current) {
            if grid.exists(next) && visited.insert(next) {
                stack.push(next);
            }
        }
    }
    visited
}

/// Partitions every existing cell into its connected subgroup.
///
/// Cells are scanned row-major; a cell already claimed by an earlier group
/// is skipped, so the returned groups are pairwise disjoint and cover each
/// existing cell exactly once.
pub fn all_subgroups(grid: &CellGrid) -> Vec<Subgroup> {
    let mut claimed = HashSet::new();
    let mut groups = Vec::new();
    for cell in grid.existing_cells() {
        if claimed.contains(&cell) {
            continue;
        }
        let group = subgroup_of(grid, cell);
        claimed.extend(group.iter().copied());
        groups.push(group);
    }
    groups
}

/// Dijkstra over existing cells with unit edge weights.
///
/// Settles cells in order of tentative distance and stops early once
/// `target` is settled. Cells outside the source's subgroup never receive
/// a label.
fn shortest_paths(grid: &CellGrid, source: Cell, target: Option<Cell>) -> HashMap<Cell, u32> {
    let mut dist = HashMap::new();
    if !grid.exists(source) {
        return dist;
    }

    let mut settled = HashSet::new();
    let mut frontier = BinaryHeap::new();
    dist.insert(source, 0);
    frontier.push(Reverse((0_u32, source)));

    while let Some(Reverse((d, cell))) = frontier.pop() {
        if !settled.insert(cell) {
            continue;
        }
        if Some(cell) == target {
            break;
        }
        for next in direct_neighbours(grid, cell) {
            let candidate = d + 1;
            if dist.get(&next).is_none_or(|&known| candidate < known) {
                dist.insert(next, candidate);
                frontier.push(Reverse((candidate, next)));
            }
        }
    }
    dist
}

fn classify(source: Cell, target: Cell, hops: Option<u32>) -> Distance {
    match hops {
        None => Distance::Unreachable,
        Some(_) if source == target => Distance::SameCell,
        Some(n) => Distance::Hops(n),
    }
}

/// Shortest path length in cell hops between two cells.
pub fn cell_distance(grid: &CellGrid, source: Cell, target: Cell) -> Distance {
    if !grid.exists(target) {
        return Distance::Unreachable;
    }
    let dist = shortest_paths(grid, source, Some(target));
    classify(source, target, dist.get(&target).copied())
}

/// Memoized single-source distances, valid while the grid is unchanged.
#[derive(Debug, Default)]
pub struct DistanceCache {
    from: HashMap<Cell, HashMap<Cell, u32>>,
}

impl DistanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same result as [`cell_distance`], computing each source at most once.
    pub fn distance(&mut self, grid: &CellGrid, source: Cell, target: Cell) -> Distance {
        if !grid.exists(target) {
            return Distance::Unreachable;
        }
        let table = self
            .from
            .entry(source)
            .or_insert_with(|| shortest_paths(grid, source, None));
        classify(source, target, table.get(&target).copied())
    }

    /// Drops every memoized table. Call after the topology changes.
    pub fn clear(&mut self) {
        self.from.clear();
    }
}
