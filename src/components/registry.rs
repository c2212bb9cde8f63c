use std::collections::HashMap;

use tracing::debug;

use super::types::{ComponentId, GridComponent};
use crate::error::GridError;
use crate::grid::{Cell, CellGrid};

/// Reasons a component is refused at load time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("could not add {kind} \"{id}\": cell ({x}, {y}) overflows the grid")]
    OutOfBounds {
        id: ComponentId,
        kind: &'static str,
        x: i64,
        y: i64,
    },
    #[error("could not add {kind} \"{id}\": cell {cell} is already occupied")]
    Occupied {
        id: ComponentId,
        kind: &'static str,
        cell: Cell,
    },
    #[error("could not add {kind} \"{id}\": id is already in use")]
    DuplicateId { id: ComponentId, kind: &'static str },
    #[error("could not add {kind} \"{id}\": maxKWH is required")]
    MissingCapacity { id: ComponentId, kind: &'static str },
}

/// All components of a grid, in placement order.
///
/// The set of components is fixed after loading; only their energy
/// state changes during simulation.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    components: Vec<GridComponent>,
    by_id: HashMap<ComponentId, usize>,
    by_cell: HashMap<Cell, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a component, marking its cell occupied in `grid`.
    ///
    /// # Errors
    ///
    /// Returns a [`PlacementError`] when the cell is outside the grid,
    /// already occupied, or the id is taken. The registry and grid are left
    /// unchanged in that case.
    pub fn place(
        &mut self,
        grid: &mut CellGrid,
        component: GridComponent,
    ) -> Result<usize, PlacementError> {
        let kind = component.kind_name();
        let cell = component.cell;
        if !grid.contains(cell) {
            return Err(PlacementError::OutOfBounds {
                id: component.id,
                kind,
                x: cell.x as i64,
                y: cell.y as i64,
            });
        }
        if grid.is_occupied(cell) || self.by_cell.contains_key(&cell) {
            return Err(PlacementError::Occupied {
                id: component.id,
                kind,
                cell,
            });
        }
        if self.by_id.contains_key(&component.id) {
            return Err(PlacementError::DuplicateId {
                id: component.id,
                kind,
            });
        }
        if !grid.exists(cell) {
            debug!(id = %component.id, %cell, "component placed on a cell that does not exist yet");
        }

        let index = self.components.len();
        grid.mark_occupied(cell);
        self.by_id.insert(component.id.clone(), index);
        self.by_cell.insert(cell, index);
        self.components.push(component);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[GridComponent] {
        &self.components
    }

    pub(crate) fn components_mut(&mut self) -> &mut [GridComponent] {
        &mut self.components
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridComponent> {
        self.components.iter()
    }

    pub fn index_of(&self, id: &ComponentId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Looks up a component by id.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ComponentNotFound`] when no component has `id`.
    pub fn get(&self, id: &ComponentId) -> Result<&GridComponent, GridError> {
        self.index_of(id)
            .map(|i| &self.components[i])
            .ok_or_else(|| GridError::ComponentNotFound(id.clone()))
    }

    pub(crate) fn get_mut(&mut self, id: &ComponentId) -> Option<&mut GridComponent> {
        let index = self.index_of(id)?;
        self.components.get_mut(index)
    }

    /// Looks up the component occupying `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NoComponentAt`] when the cell is empty.
    pub fn at(&self, cell: Cell) -> Result<&GridComponent, GridError> {
        self.by_cell
            .get(&cell)
            .map(|&i| &self.components[i])
            .ok_or(GridError::NoComponentAt {
                x: cell.x,
                y: cell.y,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (CellGrid, Registry) {
        let mut grid = CellGrid::new(3);
        grid.mark_region((0, 0), (2, 0));
        (grid, Registry::new())
    }

    #[test]
    fn place_and_lookup() {
        let (mut grid, mut reg) = setup();
        let p = GridComponent::producer("p", Cell::new(0, 0), 10.0);
        assert_eq!(reg.place(&mut grid, p), Ok(0));
        assert!(grid.is_occupied(Cell::new(0, 0)));
        assert_eq!(reg.get(&"p".into()).map(|c| c.cell), Ok(Cell::new(0, 0)));
        assert_eq!(reg.at(Cell::new(0, 0)).map(|c| c.id.as_str()), Ok("p"));
    }

    #[test]
    fn occupied_cell_is_rejected() {
        let (mut grid, mut reg) = setup();
        let _ = reg.place(&mut grid, GridComponent::consumer("a", Cell::new(1, 0)));
        let err = reg.place(&mut grid, GridComponent::consumer("b", Cell::new(1, 0)));
        assert!(matches!(err, Err(PlacementError::Occupied { .. })));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let (mut grid, mut reg) = setup();
        let err = reg.place(&mut grid, GridComponent::consumer("a", Cell::new(3, 0)));
        assert!(matches!(err, Err(PlacementError::OutOfBounds { x: 3, .. })));
        assert!(reg.is_empty());
    }

    #[test]
    fn duplicate_id_across_kinds_is_rejected() {
        let (mut grid, mut reg) = setup();
        let _ = reg.place(&mut grid, GridComponent::consumer("a", Cell::new(0, 0)));
        let err = reg.place(&mut grid, GridComponent::storage("a", Cell::new(1, 0), 5.0));
        assert!(matches!(err, Err(PlacementError::DuplicateId { .. })));
        assert!(!grid.is_occupied(Cell::new(1, 0)));
    }

    #[test]
    fn missing_lookups_are_typed_errors() {
        let (_, reg) = setup();
        assert_eq!(
            reg.get(&"ghost".into()).err(),
            Some(GridError::ComponentNotFound("ghost".into()))
        );
        assert_eq!(
            reg.at(Cell::new(2, 2)).err(),
            Some(GridError::NoComponentAt { x: 2, y: 2 })
        );
    }

    #[test]
    fn placement_on_missing_cell_is_allowed() {
        let (mut grid, mut reg) = setup();
        let placed = reg.place(&mut grid, GridComponent::converter("x", Cell::new(2, 2)));
        assert!(placed.is_ok());
    }
}
