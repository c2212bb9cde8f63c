//! Satisfaction aggregation across steps.

use crate::components::GridComponent;
use crate::grid::CellGrid;

/// Average satisfaction of the components whose cell currently exists.
///
/// Returns `None` when no component sits on an existing cell.
pub fn average_satisfaction(components: &[GridComponent], grid: &CellGrid) -> Option<f32> {
    let (sum, count) = components
        .iter()
        .filter(|c| grid.exists(c.cell))
        .fold((0.0_f32, 0_usize), |(sum, n), c| (sum + c.satisfaction(), n + 1));
    (count > 0).then(|| sum / count as f32)
}

/// Running equilibrium: the mean of per-step average satisfaction.
///
/// Steps without any eligible component contribute no sample and are not
/// counted, so an empty grid never divides by zero.
#[derive(Debug, Clone, Default)]
pub struct Equilibrium {
    accumulated: f32,
    samples: usize,
}

impl Equilibrium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples the current state and returns the step average, if any.
    pub fn update(&mut self, components: &[GridComponent], grid: &CellGrid) -> Option<f32> {
        let average = average_satisfaction(components, grid)?;
        self.accumulated += average;
        self.samples += 1;
        Some(average)
    }

    /// Accumulated average over all sampled steps; 100 means every
    /// component was perfectly matched at every observed step.
    pub fn running(&self) -> Option<f32> {
        (self.samples > 0).then(|| self.accumulated / self.samples as f32)
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}
