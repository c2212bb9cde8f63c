//! Per-step simulation record.

use std::fmt;

use super::clock::TimeOfDay;

/// Complete record of one simulation timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Zero-based step index.
    pub timestep: usize,
    /// Simulated time of day the step was computed for.
    pub time: TimeOfDay,
    /// Number of connectivity subgroups at this step.
    pub subgroups: usize,
    /// Number of individual source-to-sink transfers.
    pub transfers: usize,
    /// Energy moved by all transfers (kWh).
    pub delivered_kwh: f32,
    /// Consumer demand left unserved after allocation (kWh).
    pub unmet_demand_kwh: f32,
    /// Converter demand left unserved after allocation (kWh).
    pub converter_shortfall_kwh: f32,
    /// Energy held by all storages after allocation (kWh).
    pub stored_kwh: f32,
    /// Average satisfaction of components on existing cells, if any.
    pub step_satisfaction: Option<f32>,
    /// Running equilibrium after this step, if any step has been sampled.
    pub running_equilibrium: Option<f32>,
}

impl StepResult {
    /// Returns `true` when every consumer got its full demand.
    pub fn demand_met(&self) -> bool {
        self.unmet_demand_kwh <= f32::EPSILON
    }
}

fn percent(value: Option<f32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%"))
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>3} ({}) | groups={:>2} transfers={:>3} delivered={:>7.2} kWh | \
             unmet={:.2} p2x_short={:.2} stored={:.2} kWh | \
             satisfaction={} equilibrium={}",
            self.timestep,
            self.time,
            self.subgroups,
            self.transfers,
            self.delivered_kwh,
            self.unmet_demand_kwh,
            self.converter_shortfall_kwh,
            self.stored_kwh,
            percent(self.step_satisfaction),
            percent(self.running_equilibrium),
        )
    }
}
