//! Grid-based energy micro-grid simulator.

/// Producers, consumers, storages and converters bound to grid cells.
pub mod components;
pub mod config;
pub mod error;
/// Cell lattice and connectivity queries.
pub mod grid;
pub mod io;
pub mod profile;
/// Simulation engine, scenario feed, allocation and metrics.
pub mod sim;
