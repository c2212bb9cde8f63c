pub mod allocation;
/// Simulated time of day and the 15-minute step clock.
pub mod clock;
pub mod engine;
pub mod kpi;
/// Satisfaction averaging and running equilibrium.
pub mod metrics;
pub mod ordering;
/// Scenario feed: time-indexed supply and demand updates.
pub mod scenario;
pub mod types;
