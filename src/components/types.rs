//! Common types for grid components.

use std::fmt;

use serde::Deserialize;

use crate::grid::Cell;

/// Caller-defined component identifier, unique across all component kinds.
///
/// Layout files may use either strings or integers; both are normalised
/// to their string form, so the integer `1` and the string `"1"` are the
/// same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "RawId")]
pub struct ComponentId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for ComponentId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        }
    }
}

impl ComponentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for ComponentId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind-specific attributes of a component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentKind {
    /// Generator with an output ceiling.
    Producer { max_kwh: f32 },
    /// Load whose demand arrives per timestep.
    Consumer,
    /// Storage with a charge capacity.
    Storage { max_kwh: f32 },
    /// Power-to-x converter: a deferrable load served last.
    Converter,
}

/// A component bound to one grid cell.
///
/// `current_kwh` is the energy currently held (producers, storages) or
/// delivered so far this timestep (consumers, converters). `desired_kwh`
/// is the per-timestep target.
#[derive(Debug, Clone, PartialEq)]
pub struct GridComponent {
    pub id: ComponentId,
    pub display_name: Option<String>,
    pub cell: Cell,
    pub current_kwh: f32,
    pub desired_kwh: f32,
    pub kind: ComponentKind,
}

impl GridComponent {
    fn new(id: impl Into<ComponentId>, cell: Cell, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            cell,
            current_kwh: 0.0,
            desired_kwh: 0.0,
            kind,
        }
    }

    /// Creates a producer with generation ceiling `max_kwh`.
    ///
    /// # Panics
    ///
    /// Panics if `max_kwh` is negative.
    pub fn producer(id: impl Into<ComponentId>, cell: Cell, max_kwh: f32) -> Self {
        assert!(max_kwh >= 0.0, "producer max_kwh must be >= 0");
        Self::new(id, cell, ComponentKind::Producer { max_kwh })
    }

    pub fn consumer(id: impl Into<ComponentId>, cell: Cell) -> Self {
        Self::new(id, cell, ComponentKind::Consumer)
    }

    /// Creates a storage with charge capacity `max_kwh`.
    ///
    /// # Panics
    ///
    /// Panics if `max_kwh` is negative.
    pub fn storage(id: impl Into<ComponentId>, cell: Cell, max_kwh: f32) -> Self {
        assert!(max_kwh >= 0.0, "storage max_kwh must be >= 0");
        Self::new(id, cell, ComponentKind::Storage { max_kwh })
    }

    pub fn converter(id: impl Into<ComponentId>, cell: Cell) -> Self {
        Self::new(id, cell, ComponentKind::Converter)
    }

    /// Sets the initial held or delivered energy, clamped into the
    /// component's capacity when it has one.
    pub fn with_current_kwh(mut self, kwh: f32) -> Self {
        self.current_kwh = match self.max_kwh() {
            Some(max) => kwh.clamp(0.0, max),
            None => kwh.max(0.0),
        };
        self
    }

    pub fn with_desired_kwh(mut self, kwh: f32) -> Self {
        self.desired_kwh = kwh.max(0.0);
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Capacity of producers and storages.
    pub fn max_kwh(&self) -> Option<f32> {
        match self.kind {
            ComponentKind::Producer { max_kwh } | ComponentKind::Storage { max_kwh } => {
                Some(max_kwh)
            }
            ComponentKind::Consumer | ComponentKind::Converter => None,
        }
    }

    /// Level a sink is filled up to: demand for consumers and converters,
    /// capacity for storages. Producers never act as sinks.
    pub fn sink_target_kwh(&self) -> f32 {
        match self.kind {
            ComponentKind::Consumer | ComponentKind::Converter => self.desired_kwh,
            ComponentKind::Storage { max_kwh } => max_kwh,
            ComponentKind::Producer { .. } => 0.0,
        }
    }

    /// Remaining energy the component would accept as a sink.
    pub fn outstanding_kwh(&self) -> f32 {
        (self.sink_target_kwh() - self.current_kwh).max(0.0)
    }

    /// Satisfaction score in percent.
    ///
    /// - Producer: 100 when nothing is held, else `(1 - current/max) * 100`.
    /// - Consumer, Converter: `current/desired * 100`, 100 when there is no demand.
    /// - Storage: `current/max * 100`, 100 when capacity is zero.
    pub fn satisfaction(&self) -> f32 {
        match self.kind {
            ComponentKind::Producer { max_kwh } => {
                if self.current_kwh == 0.0 || max_kwh <= 0.0 {
                    100.0
                } else {
                    (1.0 - self.current_kwh / max_kwh) * 100.0
                }
            }
            ComponentKind::Consumer | ComponentKind::Converter => {
                if self.desired_kwh == 0.0 {
                    100.0
                } else {
                    self.current_kwh / self.desired_kwh * 100.0
                }
            }
            ComponentKind::Storage { max_kwh } => {
                if max_kwh == 0.0 {
                    100.0
                } else {
                    self.current_kwh / max_kwh * 100.0
                }
            }
        }
    }

    /// Human-readable kind name.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ComponentKind::Producer { .. } => "Producer",
            ComponentKind::Consumer => "Consumer",
            ComponentKind::Storage { .. } => "Storage",
            ComponentKind::Converter => "Converter",
        }
    }

    pub fn is_producer(&self) -> bool {
        matches!(self.kind, ComponentKind::Producer { .. })
    }

    pub fn is_consumer(&self) -> bool {
        matches!(self.kind, ComponentKind::Consumer)
    }

    pub fn is_storage(&self) -> bool {
        matches!(self.kind, ComponentKind::Storage { .. })
    }

    pub fn is_converter(&self) -> bool {
        matches!(self.kind, ComponentKind::Converter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: usize, y: usize) -> Cell {
        Cell::new(x, y)
    }

    #[test]
    fn id_deserializes_from_string_or_integer() {
        let a: ComponentId = serde_json::from_str("\"pv-1\"").expect("string id");
        let b: ComponentId = serde_json::from_str("7").expect("integer id");
        assert_eq!(a.as_str(), "pv-1");
        assert_eq!(b, ComponentId::from(7));
    }

    #[test]
    fn integer_and_string_forms_are_the_same_id() {
        let n: ComponentId = serde_json::from_str("1").expect("integer id");
        let s: ComponentId = serde_json::from_str("\"1\"").expect("string id");
        assert_eq!(n, s);
        assert_eq!(ComponentId::from(1), ComponentId::from("1"));
    }

    #[test]
    fn idle_producer_is_fully_satisfied() {
        let p = GridComponent::producer("p", at(0, 0), 10.0);
        assert_eq!(p.satisfaction(), 100.0);
    }

    #[test]
    fn producer_satisfaction_falls_with_held_energy() {
        let p = GridComponent::producer("p", at(0, 0), 10.0).with_current_kwh(4.0);
        assert!((p.satisfaction() - 60.0).abs() < 1e-4);
        let full = GridComponent::producer("p", at(0, 0), 10.0).with_current_kwh(10.0);
        assert_eq!(full.satisfaction(), 0.0);
    }

    #[test]
    fn consumer_without_demand_is_fully_satisfied() {
        let u = GridComponent::consumer("u", at(0, 0));
        assert_eq!(u.satisfaction(), 100.0);
    }

    #[test]
    fn consumer_satisfaction_is_delivered_share() {
        let mut u = GridComponent::consumer("u", at(0, 0)).with_desired_kwh(4.0);
        u.current_kwh = 1.0;
        assert_eq!(u.satisfaction(), 25.0);
        assert_eq!(u.outstanding_kwh(), 3.0);
    }

    #[test]
    fn storage_satisfaction_is_state_of_charge() {
        let s = GridComponent::storage("s", at(0, 0), 8.0).with_current_kwh(2.0);
        assert_eq!(s.satisfaction(), 25.0);
        assert_eq!(s.sink_target_kwh(), 8.0);
        let empty = GridComponent::storage("s", at(0, 0), 0.0);
        assert_eq!(empty.satisfaction(), 100.0);
    }

    #[test]
    fn converter_behaves_like_consumer() {
        let mut c = GridComponent::converter("x", at(0, 0)).with_desired_kwh(2.0);
        assert_eq!(c.satisfaction(), 0.0);
        c.current_kwh = 2.0;
        assert_eq!(c.satisfaction(), 100.0);
        assert_eq!(c.outstanding_kwh(), 0.0);
    }

    #[test]
    fn initial_charge_is_clamped_to_capacity() {
        let s = GridComponent::storage("s", at(0, 0), 5.0).with_current_kwh(9.0);
        assert_eq!(s.current_kwh, 5.0);
    }

    #[test]
    #[should_panic]
    fn negative_capacity_panics() {
        GridComponent::producer("p", at(0, 0), -1.0);
    }
}
