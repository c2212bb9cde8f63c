//! Time-indexed supply and demand updates.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{trace, warn};

use super::clock::TimeOfDay;
use crate::components::{ComponentId, ComponentKind, GridComponent, Registry};
use crate::error::LoadError;

/// Per-component updates taking effect at one time of day.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioEntry {
    /// Energy added to each producer's held stock (kWh).
    #[serde(default, rename = "producerKWHs", alias = "providerKWHs")]
    pub producer_deltas: BTreeMap<ComponentId, f32>,
    /// Replacement demand for each consumer (kWh).
    #[serde(default, rename = "consumerKWHs", alias = "userKWHs")]
    pub consumer_targets: BTreeMap<ComponentId, f32>,
    /// Replacement demand for each converter (kWh).
    #[serde(default, rename = "converterKWHs", alias = "p2xKWHs")]
    pub converter_targets: BTreeMap<ComponentId, f32>,
}

impl ScenarioEntry {
    pub fn is_empty(&self) -> bool {
        self.producer_deltas.is_empty()
            && self.consumer_targets.is_empty()
            && self.converter_targets.is_empty()
    }
}

/// Scenario entries keyed by time of day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioTable {
    entries: BTreeMap<TimeOfDay, ScenarioEntry>,
}

impl ScenarioTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `"HH:MM"`-labelled entries.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidTimeLabel`] for the first label that does
    /// not parse.
    pub fn from_labels(
        labelled: impl IntoIterator<Item = (String, ScenarioEntry)>,
    ) -> Result<Self, LoadError> {
        let mut table = Self::new();
        for (label, entry) in labelled {
            table.insert(label.parse()?, entry);
        }
        Ok(table)
    }

    /// Inserts or replaces the entry for `time`.
    pub fn insert(&mut self, time: TimeOfDay, entry: ScenarioEntry) {
        self.entries.insert(time, entry);
    }

    pub fn get(&self, time: TimeOfDay) -> Option<&ScenarioEntry> {
        self.entries.get(&time)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TimeOfDay, &ScenarioEntry)> {
        self.entries.iter()
    }
}

/// Applies the entry for `time` to the registry.
///
/// - Producer deltas are added to the held stock, clamped into `[0, max_kwh]`.
/// - Consumer and converter targets replace `desired_kwh` and reset
///   `current_kwh` to zero: demand is per timestep, never cumulative.
///
/// A time without an entry leaves every component untouched. Ids that are
/// unknown or name a component of the wrong kind are skipped with a warning.
///
/// # Returns
///
/// `true` when an entry existed for `time`.
pub fn apply_scenario(table: &ScenarioTable, time: TimeOfDay, registry: &mut Registry) -> bool {
    let Some(entry) = table.get(time) else {
        return false;
    };
    trace!(%time, "applying scenario entry");

    for (id, &delta) in &entry.producer_deltas {
        if let Some(c) = lookup(registry, id, time, "producer") {
            if let ComponentKind::Producer { max_kwh } = c.kind {
                c.current_kwh = (c.current_kwh + delta).clamp(0.0, max_kwh);
            } else {
                warn!(%id, %time, kind = c.kind_name(), "producer delta names a non-producer");
            }
        }
    }

    for (id, &target) in &entry.consumer_targets {
        if let Some(c) = lookup(registry, id, time, "consumer") {
            if c.is_consumer() {
                c.desired_kwh = target.max(0.0);
                c.current_kwh = 0.0;
            } else {
                warn!(%id, %time, kind = c.kind_name(), "consumer target names a non-consumer");
            }
        }
    }

    for (id, &target) in &entry.converter_targets {
        if let Some(c) = lookup(registry, id, time, "converter") {
            if c.is_converter() {
                c.desired_kwh = target.max(0.0);
                c.current_kwh = 0.0;
            } else {
                warn!(%id, %time, kind = c.kind_name(), "converter target names a non-converter");
            }
        }
    }

    true
}

fn lookup<'a>(
    registry: &'a mut Registry,
    id: &ComponentId,
    time: TimeOfDay,
    expected: &str,
) -> Option<&'a mut GridComponent> {
    let found = registry.get_mut(id);
    if found.is_none() {
        warn!(%id, %time, expected, "scenario names an unknown component");
    }
    found
}
