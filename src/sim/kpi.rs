//! Post-hoc KPI computation from simulation results.

use std::fmt;

use super::types::StepResult;

/// Aggregate indicators derived from a complete simulation run.
///
/// Computed post-hoc from `Vec<StepResult>` so reported metrics always
/// agree with the step records.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiReport {
    /// Number of steps in the run.
    pub steps: usize,
    /// Running equilibrium after the last step (percent).
    pub final_equilibrium: Option<f32>,
    /// Lowest per-step average satisfaction (percent).
    pub min_step_satisfaction: Option<f32>,
    /// Total energy moved by all transfers (kWh).
    pub total_delivered_kwh: f32,
    /// Total consumer demand left unserved (kWh).
    pub total_unmet_demand_kwh: f32,
    /// Total converter demand left unserved (kWh).
    pub total_converter_shortfall_kwh: f32,
    /// Steps in which every consumer got its full demand.
    pub steps_demand_met: usize,
}

impl KpiReport {
    /// Computes all KPIs from the complete step record vector.
    pub fn from_results(results: &[StepResult]) -> Self {
        let mut report = Self {
            steps: results.len(),
            final_equilibrium: results.last().and_then(|r| r.running_equilibrium),
            min_step_satisfaction: None,
            total_delivered_kwh: 0.0,
            total_unmet_demand_kwh: 0.0,
            total_converter_shortfall_kwh: 0.0,
            steps_demand_met: 0,
        };

        for r in results {
            report.total_delivered_kwh += r.delivered_kwh;
            report.total_unmet_demand_kwh += r.unmet_demand_kwh;
            report.total_converter_shortfall_kwh += r.converter_shortfall_kwh;
            if r.demand_met() {
                report.steps_demand_met += 1;
            }
            if let Some(s) = r.step_satisfaction {
                report.min_step_satisfaction =
                    Some(report.min_step_satisfaction.map_or(s, |m| m.min(s)));
            }
        }

        report
    }

    /// Share of steps in which all consumer demand was met (percent).
    pub fn demand_met_pct(&self) -> f32 {
        if self.steps == 0 {
            0.0
        } else {
            100.0 * self.steps_demand_met as f32 / self.steps as f32
        }
    }
}

fn percent(value: Option<f32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%"))
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Steps simulated:        {}", self.steps)?;
        writeln!(f, "Running equilibrium:    {}", percent(self.final_equilibrium))?;
        writeln!(
            f,
            "Lowest satisfaction:    {}",
            percent(self.min_step_satisfaction)
        )?;
        writeln!(f, "Energy delivered:       {:.2} kWh", self.total_delivered_kwh)?;
        writeln!(f, "Unmet demand:           {:.2} kWh", self.total_unmet_demand_kwh)?;
        writeln!(
            f,
            "Converter shortfall:    {:.2} kWh",
            self.total_converter_shortfall_kwh
        )?;
        write!(f, "Demand fully met:       {:.1}%", self.demand_met_pct())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::clock::TimeOfDay;

    fn make_result(delivered: f32, unmet: f32, satisfaction: Option<f32>) -> StepResult {
        StepResult {
            timestep: 0,
            time: TimeOfDay::default(),
            subgroups: 1,
            transfers: 1,
            delivered_kwh: delivered,
            unmet_demand_kwh: unmet,
            converter_shortfall_kwh: 0.0,
            stored_kwh: 0.0,
            step_satisfaction: satisfaction,
            running_equilibrium: satisfaction,
        }
    }

    #[test]
    fn totals_and_counts() {
        let results = vec![
            make_result(2.0, 0.0, Some(100.0)),
            make_result(1.0, 1.5, Some(60.0)),
            make_result(3.0, 0.0, Some(90.0)),
        ];
        let kpi = KpiReport::from_results(&results);
        assert_eq!(kpi.steps, 3);
        assert!((kpi.total_delivered_kwh - 6.0).abs() < 1e-6);
        assert!((kpi.total_unmet_demand_kwh - 1.5).abs() < 1e-6);
        assert_eq!(kpi.steps_demand_met, 2);
        assert_eq!(kpi.min_step_satisfaction, Some(60.0));
        assert_eq!(kpi.final_equilibrium, Some(90.0));
    }

    #[test]
    fn unsampled_steps_do_not_set_minimum() {
        let results = vec![make_result(0.0, 0.0, None)];
        let kpi = KpiReport::from_results(&results);
        assert_eq!(kpi.min_step_satisfaction, None);
    }

    #[test]
    fn empty_results() {
        let kpi = KpiReport::from_results(&[]);
        assert_eq!(kpi.steps, 0);
        assert_eq!(kpi.final_equilibrium, None);
        assert_eq!(kpi.demand_met_pct(), 0.0);
    }

    #[test]
    fn display_has_header() {
        let kpi = KpiReport::from_results(&[make_result(1.0, 0.0, Some(80.0))]);
        let s = kpi.to_string();
        assert!(s.starts_with("--- KPI Report ---"));
        assert!(s.contains("Running equilibrium:    80.0%"));
    }
}
