//! Fixed-priority greedy energy allocation within one subgroup.
//!
//! Priority order inside a group:
//! 1. consumers draw from producers, then from storages;
//! 2. storages recharge from producers;
//! 3. converters draw from producers.
//!
//! Within each pass a sink visits its sources nearest first.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::ordering::sort_by_distance_to;
use crate::components::{ComponentId, GridComponent};
use crate::grid::{Cell, CellGrid, DistanceCache};

/// Sources each sink drew energy from during the most recent step.
///
/// Keys and sources keep insertion order; a source appears at most once
/// per sink. The engine replaces the whole map at the start of every step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyMap {
    edges: IndexMap<ComponentId, IndexSet<ComponentId>>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `sink` drew from `source`.
    pub fn record(&mut self, sink: &ComponentId, source: &ComponentId) {
        self.edges
            .entry(sink.clone())
            .or_default()
            .insert(source.clone());
    }

    /// Sources `sink` drew from, in first-draw order.
    pub fn sources_of(&self, sink: &ComponentId) -> Option<&IndexSet<ComponentId>> {
        self.edges.get(sink)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ComponentId, &IndexSet<ComponentId>)> {
        self.edges.iter()
    }

    /// Number of sinks with at least one edge.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Total number of sink-to-source edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(IndexSet::len).sum()
    }
}

/// One `sink <- source, source` line per sink.
impl fmt::Display for DependencyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, (sink, sources)) in self.edges.iter().enumerate() {
            if n > 0 {
                writeln!(f)?;
            }
            write!(f, "{sink} <- ")?;
            for (k, source) in sources.iter().enumerate() {
                if k > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{source}")?;
            }
        }
        Ok(())
    }
}

/// One energy movement between two registry entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transfer {
    /// Registry index of the source.
    pub source: usize,
    /// Registry index of the sink.
    pub sink: usize,
    pub kwh: f32,
}

/// Moves energy from `source` to `sink` and returns the amount moved.
///
/// The amount is `min(source held, sink outstanding)`, so the source never
/// goes negative and the sink is never filled past its target. Returns
/// zero without touching either side when the source is empty or the sink
/// already reached its target.
pub fn transfer(components: &mut [GridComponent], source: usize, sink: usize) -> f32 {
    let available = components[source].current_kwh;
    let needed = components[sink].outstanding_kwh();
    if available <= 0.0 || needed <= 0.0 {
        return 0.0;
    }

    let moved = available.min(needed);
    components[source].current_kwh = (available - moved).max(0.0);
    components[sink].current_kwh += moved;
    moved
}

/// Members of one subgroup split by role, each in registry order.
#[derive(Debug, Default)]
struct Roles {
    producers: Vec<usize>,
    consumers: Vec<usize>,
    storages: Vec<usize>,
    converters: Vec<usize>,
}

impl Roles {
    fn split(components: &[GridComponent], members: &[usize]) -> Self {
        let mut roles = Self::default();
        for &i in members {
            let c = &components[i];
            if c.is_producer() {
                roles.producers.push(i);
            } else if c.is_consumer() {
                roles.consumers.push(i);
            } else if c.is_storage() {
                roles.storages.push(i);
            } else {
                roles.converters.push(i);
            }
        }
        roles
    }
}

/// Shared state for the passes over one subgroup.
struct Pass<'a> {
    components: &'a mut [GridComponent],
    cells: Vec<Cell>,
    grid: &'a CellGrid,
    distances: &'a mut DistanceCache,
    dependencies: &'a mut DependencyMap,
    transfers: Vec<Transfer>,
}

impl Pass<'_> {
    /// Lets `sink` draw from `sources`, nearest first.
    fn draw(&mut self, sink: usize, sources: &[usize]) {
        let cells = &self.cells;
        let ordered = sort_by_distance_to(
            sources.iter().copied(),
            cells[sink],
            |&i| cells[i],
            self.grid,
            self.distances,
        );

        for source in ordered {
            let moved = transfer(self.components, source, sink);
            if moved <= 0.0 {
                continue;
            }
            let (from, to) = (&self.components[source].id, &self.components[sink].id);
            debug!(%from, %to, kwh = moved, "transfer");
            self.dependencies.record(to, from);
            self.transfers.push(Transfer {
                source,
                sink,
                kwh: moved,
            });
        }
    }
}

/// Runs the priority passes for one subgroup.
///
/// `members` are registry indices of the components located in the group.
/// Every edge recorded is added to `dependencies`; the transfers performed
/// are returned in execution order.
pub fn allocate_group(
    components: &mut [GridComponent],
    members: &[usize],
    grid: &CellGrid,
    distances: &mut DistanceCache,
    dependencies: &mut DependencyMap,
) -> Vec<Transfer> {
    let roles = Roles::split(components, members);
    let cells = components.iter().map(|c| c.cell).collect();
    let mut pass = Pass {
        components,
        cells,
        grid,
        distances,
        dependencies,
        transfers: Vec::new(),
    };

    for &consumer in &roles.consumers {
        pass.draw(consumer, &roles.producers);
        pass.draw(consumer, &roles.storages);
    }
    for &storage in &roles.storages {
        pass.draw(storage, &roles.producers);
    }
    for &converter in &roles.converters {
        pass.draw(converter, &roles.producers);
    }

    pass.transfers
}
