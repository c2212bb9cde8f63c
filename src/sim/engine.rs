//! Simulation engine that owns the grid, components and scenario feed.

use std::collections::HashMap;

use tracing::debug;

use super::allocation::{DependencyMap, allocate_group};
use super::clock::{SimClock, TimeOfDay};
use super::metrics::Equilibrium;
use super::scenario::{ScenarioTable, apply_scenario};
use super::types::StepResult;
use crate::components::{ComponentId, ComponentKind, GridComponent, Registry};
use crate::error::GridError;
use crate::grid::{Cell, CellGrid, DistanceCache, Subgroup, all_subgroups};

/// Single-owner simulation engine.
///
/// Every mutation goes through `&mut self`, so a step always runs to
/// completion before anything else can observe the state. The engine holds
/// no timers; the driver decides how often [`Engine::step`] is called.
#[derive(Debug, Clone)]
pub struct Engine {
    grid: CellGrid,
    registry: Registry,
    scenario: ScenarioTable,
    clock: SimClock,
    dependencies: DependencyMap,
    equilibrium: Equilibrium,
    /// Clock step whose scenario entry has already landed.
    applied_at: Option<usize>,
}

impl Engine {
    /// Creates an engine starting at `start`.
    ///
    /// # Arguments
    ///
    /// * `grid` - Cell lattice, with occupancy already marked by `registry`
    /// * `registry` - Components placed on `grid`
    /// * `scenario` - Time-indexed supply and demand updates
    /// * `start` - Simulated time of day of the first step
    pub fn new(
        grid: CellGrid,
        registry: Registry,
        scenario: ScenarioTable,
        start: TimeOfDay,
    ) -> Self {
        Self {
            grid,
            registry,
            scenario,
            clock: SimClock::new(start),
            dependencies: DependencyMap::new(),
            equilibrium: Equilibrium::new(),
            applied_at: None,
        }
    }

    /// Applies the scenario entry for the current time of day.
    ///
    /// Each tick's entry lands at most once: calling this before
    /// [`Engine::step`] applies it early and the step then skips it, so
    /// producer deltas are never added twice. Returns `true` when an entry
    /// was applied by this call.
    pub fn apply_scenario(&mut self) -> bool {
        let step = self.clock.steps();
        if self.applied_at == Some(step) {
            return false;
        }
        self.applied_at = Some(step);
        apply_scenario(&self.scenario, self.clock.now(), &mut self.registry)
    }

    /// Executes one timestep and returns its record.
    ///
    /// 1. Start a fresh dependency map and apply the scenario for the
    ///    current time.
    /// 2. Partition existing cells into subgroups and run the priority
    ///    allocation inside each one independently.
    /// 3. Advance the clock by 15 simulated minutes and sample the
    ///    equilibrium.
    pub fn step(&mut self) -> StepResult {
        let mut dependencies = DependencyMap::new();
        self.apply_scenario();

        let groups = all_subgroups(&self.grid);
        let members = self.members_by_group(&groups);
        let mut distances = DistanceCache::new();
        let mut transfers = Vec::new();
        for (index, group_members) in members.iter().enumerate() {
            if group_members.is_empty() {
                continue;
            }
            debug!(group = index, members = group_members.len(), "allocating subgroup");
            transfers.extend(allocate_group(
                self.registry.components_mut(),
                group_members,
                &self.grid,
                &mut distances,
                &mut dependencies,
            ));
        }
        self.dependencies = dependencies;

        let timestep = self.clock.steps();
        let time = self.clock.tick();
        let step_satisfaction = self.equilibrium.update(self.registry.components(), &self.grid);

        let mut unmet_demand_kwh = 0.0;
        let mut converter_shortfall_kwh = 0.0;
        let mut stored_kwh = 0.0;
        for c in self.registry.iter() {
            match c.kind {
                ComponentKind::Consumer => unmet_demand_kwh += c.outstanding_kwh(),
                ComponentKind::Converter => converter_shortfall_kwh += c.outstanding_kwh(),
                ComponentKind::Storage { .. } => stored_kwh += c.current_kwh,
                ComponentKind::Producer { .. } => {}
            }
        }

        StepResult {
            timestep,
            time,
            subgroups: groups.len(),
            transfers: transfers.len(),
            delivered_kwh: transfers.iter().map(|t| t.kwh).sum(),
            unmet_demand_kwh,
            converter_shortfall_kwh,
            stored_kwh,
            step_satisfaction,
            running_equilibrium: self.equilibrium.running(),
        }
    }

    /// Executes `steps` timesteps and returns every step record.
    pub fn run(&mut self, steps: usize) -> Vec<StepResult> {
        (0..steps).map(|_| self.step()).collect()
    }

    /// Registry indices of the components inside each subgroup.
    fn members_by_group(&self, groups: &[Subgroup]) -> Vec<Vec<usize>> {
        let group_of: HashMap<Cell, usize> = groups
            .iter()
            .enumerate()
            .flat_map(|(g, cells)| cells.iter().map(move |&c| (c, g)))
            .collect();
        let mut members = vec![Vec::new(); groups.len()];
        for (index, component) in self.registry.iter().enumerate() {
            if let Some(&g) = group_of.get(&component.cell) {
                members[g].push(index);
            }
        }
        members
    }

    fn checked_cell(&self, x: i64, y: i64) -> Result<Cell, GridError> {
        self.grid.cell(x, y).ok_or(GridError::CellOutOfBounds {
            x,
            y,
            size: self.grid.size(),
        })
    }

    /// Flips existence of a cell and returns its new state.
    ///
    /// Components stay where they are; only connectivity changes.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellOutOfBounds`] for coordinates outside the grid.
    pub fn toggle_cell(&mut self, x: i64, y: i64) -> Result<bool, GridError> {
        let cell = self.checked_cell(x, y)?;
        let now = !self.grid.exists(cell);
        self.grid.set_exists(cell, now);
        Ok(now)
    }

    /// Switches a cell on or off.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellOutOfBounds`] for coordinates outside the grid.
    pub fn set_cell(&mut self, x: i64, y: i64, exists: bool) -> Result<(), GridError> {
        let cell = self.checked_cell(x, y)?;
        self.grid.set_exists(cell, exists);
        Ok(())
    }

    /// Whether a cell exists.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellOutOfBounds`] for coordinates outside the grid.
    pub fn cell_exists(&self, x: i64, y: i64) -> Result<bool, GridError> {
        Ok(self.grid.exists(self.checked_cell(x, y)?))
    }

    /// Whether a component was placed on a cell.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellOutOfBounds`] for coordinates outside the grid.
    pub fn cell_occupied(&self, x: i64, y: i64) -> Result<bool, GridError> {
        Ok(self.grid.is_occupied(self.checked_cell(x, y)?))
    }

    /// Looks up a component by id.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ComponentNotFound`] for unknown ids.
    pub fn component(&self, id: &ComponentId) -> Result<&GridComponent, GridError> {
        self.registry.get(id)
    }

    /// Looks up the component placed at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellOutOfBounds`] or [`GridError::NoComponentAt`].
    pub fn component_at(&self, x: i64, y: i64) -> Result<&GridComponent, GridError> {
        let cell = self.checked_cell(x, y)?;
        self.registry.at(cell)
    }

    /// Satisfaction percentage of one component.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ComponentNotFound`] for unknown ids.
    pub fn satisfaction(&self, id: &ComponentId) -> Result<f32, GridError> {
        self.component(id).map(GridComponent::satisfaction)
    }

    /// All components in placement order.
    pub fn components(&self) -> &[GridComponent] {
        self.registry.components()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    /// Current connectivity subgroups.
    pub fn subgroups(&self) -> Vec<Subgroup> {
        all_subgroups(&self.grid)
    }

    /// Dependency edges recorded by the most recent step.
    pub fn dependencies(&self) -> &DependencyMap {
        &self.dependencies
    }

    /// Running equilibrium, `None` before any step had eligible components.
    pub fn running_equilibrium(&self) -> Option<f32> {
        self.equilibrium.running()
    }

    /// Simulated time of day the next step will compute.
    pub fn time_of_day(&self) -> TimeOfDay {
        self.clock.now()
    }

    pub fn steps_taken(&self) -> usize {
        self.clock.steps()
    }
}
