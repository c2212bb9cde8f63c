//! Distance-based ordering of candidate sources and sinks.

use crate::grid::{Cell, CellGrid, DistanceCache};

/// Orders `candidates` by hop distance from `source`, nearest first.
///
/// Candidates whose cell is not in the same subgroup as `source` are
/// dropped. Equal distances keep their original relative order.
///
/// The ordering only expresses a preference for short transmission paths;
/// no loss is charged for distance.
pub fn sort_by_distance_to<T>(
    candidates: impl IntoIterator<Item = T>,
    source: Cell,
    cell_of: impl Fn(&T) -> Cell,
    grid: &CellGrid,
    distances: &mut DistanceCache,
) -> Vec<T> {
    let mut ranked: Vec<(u32, T)> = candidates
        .into_iter()
        .filter_map(|c| {
            let hops = distances.distance(grid, source, cell_of(&c)).hops()?;
            Some((hops, c))
        })
        .collect();
    ranked.sort_by_key(|(hops, _)| *hops);
    ranked.into_iter().map(|(_, c)| c).collect()
}
