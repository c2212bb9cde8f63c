//! JSON layout and scenario loading.
//!
//! Layout files describe which cells exist and where components sit;
//! scenario files map `"HH:MM"` labels to supply and demand updates.
//! Placement problems are per item: the offending component is dropped,
//! a warning is logged and loading continues.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::components::{ComponentId, GridComponent, PlacementError, Registry};
use crate::error::LoadError;
use crate::grid::{Cell, CellGrid};
use crate::sim::scenario::{ScenarioEntry, ScenarioTable};

/// One component entry of a layout file.
///
/// `id` may be a JSON string or integer. Both forms share one namespace:
/// `1` and `"1"` name the same component, so using both in one layout is
/// rejected as a duplicate id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub id: ComponentId,
    #[serde(default)]
    pub display_name: Option<String>,
    pub coord_x: i64,
    pub coord_y: i64,
    /// Generation ceiling (producers) or capacity (storages). Required for
    /// those kinds, ignored for the others.
    #[serde(default, rename = "maxKWH")]
    pub max_kwh: Option<f32>,
    #[serde(default, rename = "desiredKWH")]
    pub desired_kwh: f32,
    /// Initial stock (producers, storages).
    #[serde(default, rename = "currentKWH")]
    pub current_kwh: f32,
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Producer,
    Consumer,
    Storage,
    Converter,
}

impl Role {
    fn name(self) -> &'static str {
        match self {
            Role::Producer => "Producer",
            Role::Consumer => "Consumer",
            Role::Storage => "Storage",
            Role::Converter => "Converter",
        }
    }

    /// Capacity of a producer or storage entry. Negative values in the file
    /// are treated as zero.
    fn capacity(self, spec: &ComponentSpec) -> Result<f32, PlacementError> {
        spec.max_kwh
            .map(|kwh| kwh.max(0.0))
            .ok_or_else(|| PlacementError::MissingCapacity {
                id: spec.id.clone(),
                kind: self.name(),
            })
    }

    fn build(self, spec: &ComponentSpec, cell: Cell) -> Result<GridComponent, PlacementError> {
        let id = spec.id.clone();
        let mut component = match self {
            Role::Producer => GridComponent::producer(id, cell, self.capacity(spec)?)
                .with_current_kwh(spec.current_kwh),
            Role::Consumer => GridComponent::consumer(id, cell).with_desired_kwh(spec.desired_kwh),
            Role::Storage => GridComponent::storage(id, cell, self.capacity(spec)?)
                .with_current_kwh(spec.current_kwh),
            Role::Converter => {
                GridComponent::converter(id, cell).with_desired_kwh(spec.desired_kwh)
            }
        };
        component.display_name = spec.display_name.clone();
        Ok(component)
    }
}

/// Parsed layout file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Rendering hint; the simulation ignores it.
    #[serde(default)]
    pub cell_size: Option<f32>,
    /// Inclusive rectangles `[[x0, y0], [x1, y1]]` of existing cells.
    #[serde(default)]
    pub grid_cells: Vec<[[f64; 2]; 2]>,
    #[serde(default, alias = "providers")]
    pub producers: Vec<ComponentSpec>,
    #[serde(default, alias = "users")]
    pub consumers: Vec<ComponentSpec>,
    #[serde(default, alias = "stores")]
    pub storages: Vec<ComponentSpec>,
    #[serde(default, alias = "p2xs")]
    pub converters: Vec<ComponentSpec>,
}

/// Grid and registry built from a [`Layout`].
#[derive(Debug, Clone)]
pub struct LoadedGrid {
    pub grid: CellGrid,
    pub registry: Registry,
    /// Components refused during placement, in layout order.
    pub rejected: Vec<PlacementError>,
    pub cell_size: Option<f32>,
}

/// Built-in two-neighbourhood layout joined by a three-cell bridge along `y = 2`.
pub const DEMO_LAYOUT: &str = include_str!("../../scenarios/demo_layout.json");

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

impl Layout {
    /// Parses a layout from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`] when the document is malformed.
    pub fn from_json_str(s: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parses a layout from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] or [`LoadError::Json`].
    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        Self::from_json_str(&read(path)?)
    }

    /// Parses [`DEMO_LAYOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`] if the embedded document is malformed.
    pub fn demo() -> Result<Self, LoadError> {
        Self::from_json_str(DEMO_LAYOUT)
    }

    /// Builds the cell grid and component registry for a `grid_size` lattice.
    ///
    /// Regions are applied first, then producers, consumers, storages and
    /// converters in file order.
    ///
    /// # Panics
    ///
    /// Panics if `grid_size` is zero.
    pub fn build(&self, grid_size: usize) -> LoadedGrid {
        let mut grid = CellGrid::new(grid_size);
        for [a, b] in &self.grid_cells {
            let a = (a[0].round() as i64, a[1].round() as i64);
            let b = (b[0].round() as i64, b[1].round() as i64);
            grid.mark_region(a, b);
        }

        let mut registry = Registry::new();
        let mut rejected = Vec::new();
        let roles = [
            (Role::Producer, &self.producers),
            (Role::Consumer, &self.consumers),
            (Role::Storage, &self.storages),
            (Role::Converter, &self.converters),
        ];
        for (role, specs) in roles {
            for spec in specs {
                let placed = match grid.cell(spec.coord_x, spec.coord_y) {
                    Some(cell) => role
                        .build(spec, cell)
                        .and_then(|c| registry.place(&mut grid, c))
                        .map(|_| ()),
                    None => Err(PlacementError::OutOfBounds {
                        id: spec.id.clone(),
                        kind: role.name(),
                        x: spec.coord_x,
                        y: spec.coord_y,
                    }),
                };
                if let Err(e) = placed {
                    warn!("{e}");
                    rejected.push(e);
                }
            }
        }

        info!(
            cells = grid.existing_cells().count(),
            components = registry.len(),
            rejected = rejected.len(),
            "layout loaded"
        );

        LoadedGrid {
            grid,
            registry,
            rejected,
            cell_size: self.cell_size,
        }
    }
}

/// Parses a scenario table from a JSON string.
///
/// # Errors
///
/// Returns [`LoadError::Json`] or [`LoadError::InvalidTimeLabel`].
pub fn scenario_from_json_str(s: &str) -> Result<ScenarioTable, LoadError> {
    let labelled: BTreeMap<String, ScenarioEntry> = serde_json::from_str(s)?;
    ScenarioTable::from_labels(labelled)
}

/// Parses a scenario table from a JSON file.
///
/// # Errors
///
/// Returns [`LoadError::Io`], [`LoadError::Json`] or [`LoadError::InvalidTimeLabel`].
pub fn scenario_from_json_file(path: &Path) -> Result<ScenarioTable, LoadError> {
    scenario_from_json_str(&read(path)?)
}
