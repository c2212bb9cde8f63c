pub mod cell;
pub mod connectivity;

pub use cell::{Cell, CellGrid};
pub use connectivity::{
    Distance, DistanceCache, Subgroup, all_subgroups, cell_distance, direct_neighbours,
    subgroup_of,
};
