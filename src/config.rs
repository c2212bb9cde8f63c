//! TOML-based run configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::sim::clock::TimeOfDay;

/// Top-level run configuration parsed from TOML.
///
/// All sections have defaults matching the `demo` preset. Load from TOML
/// with [`RunConfig::from_toml_file`] or pick a preset with
/// [`RunConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Grid size, step count and start time.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Where the grid layout comes from and which cells to switch off.
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Optional scenario file.
    #[serde(default)]
    pub scenario: ScenarioSource,
    /// Synthetic scenario parameters, used when no scenario file is given.
    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Simulation timing and lattice size.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Cells per side of the square lattice (must be > 0).
    pub grid_size: usize,
    /// Number of 15-minute steps to run (must be > 0).
    pub steps: usize,
    /// Time of day of the first step.
    pub start_time: TimeOfDay,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            steps: 96,
            start_time: TimeOfDay::default(),
        }
    }
}

/// Layout source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// JSON layout file; the built-in demo layout when absent.
    pub path: Option<PathBuf>,
    /// Cells switched off after the layout is loaded.
    pub disabled_cells: Vec<[i64; 2]>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioSource {
    pub path: Option<PathBuf>,
}

/// Synthetic daily profile parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Master random seed.
    pub seed: u64,
    /// Start of producer output (inclusive).
    pub sunrise: TimeOfDay,
    /// End of producer output (exclusive).
    pub sunset: TimeOfDay,
    /// Fraction of a producer's `maxKWH` added per step at solar noon.
    pub solar_yield: f32,
    /// Relative noise on producer output.
    pub solar_noise_std: f32,
    /// Mean consumer demand per step (kWh).
    pub demand_base_kwh: f32,
    /// Amplitude of the daily demand swing (kWh).
    pub demand_amp_kwh: f32,
    /// Absolute noise on consumer demand (kWh).
    pub demand_noise_std: f32,
    /// Converter demand per daylight step (kWh).
    pub converter_kwh: f32,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            sunrise: TimeOfDay::new(6, 0),
            sunset: TimeOfDay::new(20, 0),
            solar_yield: 0.25,
            solar_noise_std: 0.1,
            demand_base_kwh: 0.6,
            demand_amp_kwh: 0.4,
            demand_noise_std: 0.05,
            converter_kwh: 1.5,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.steps"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Cells joining the west and east halves of the demo layout.
pub const DEMO_BRIDGE: [[i64; 2]; 3] = [[6, 2], [7, 2], [8, 2]];

impl RunConfig {
    /// Built-in layout, synthetic day at default parameters.
    pub fn demo() -> Self {
        Self::default()
    }

    /// Demo layout with the bridge cut, leaving two independent subgroups.
    pub fn islanded() -> Self {
        Self {
            layout: LayoutConfig {
                path: None,
                disabled_cells: vec![DEMO_BRIDGE[1]],
            },
            ..Self::default()
        }
    }

    /// Halved solar yield and doubled demand.
    pub fn scarce() -> Self {
        let base = ProfileConfig::default();
        Self {
            profile: ProfileConfig {
                solar_yield: base.solar_yield / 2.0,
                demand_base_kwh: base.demand_base_kwh * 2.0,
                demand_amp_kwh: base.demand_amp_kwh * 2.0,
                ..base
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo", "islanded", "scarce"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            "islanded" => Ok(Self::islanded()),
            "scarce" => Ok(Self::scarce()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// Malformed `"HH:MM"` labels are reported here, as TOML errors.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.grid_size == 0 {
            errors.push(ConfigError::new("simulation.grid_size", "must be > 0"));
        }
        if s.steps == 0 {
            errors.push(ConfigError::new("simulation.steps", "must be > 0"));
        }

        let size = s.grid_size as i64;
        for [x, y] in &self.layout.disabled_cells {
            if !(0..size).contains(x) || !(0..size).contains(y) {
                errors.push(ConfigError::new(
                    "layout.disabled_cells",
                    format!("({x}, {y}) is outside the {size}x{size} grid"),
                ));
            }
        }

        let p = &self.profile;
        if p.sunrise >= p.sunset {
            errors.push(ConfigError::new("profile.sunrise", "must be before profile.sunset"));
        }
        if !(0.0..=1.0).contains(&p.solar_yield) {
            errors.push(ConfigError::new("profile.solar_yield", "must be in [0.0, 1.0]"));
        }
        let non_negative = [
            ("profile.solar_noise_std", p.solar_noise_std),
            ("profile.demand_base_kwh", p.demand_base_kwh),
            ("profile.demand_amp_kwh", p.demand_amp_kwh),
            ("profile.demand_noise_std", p.demand_noise_std),
            ("profile.converter_kwh", p.converter_kwh),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        errors
    }
}
