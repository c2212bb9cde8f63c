//! Grid components and their registry.

/// Placement-checked component store.
pub mod registry;
pub mod types;

// Re-export the main types for convenience
pub use registry::{PlacementError, Registry};
pub use types::{ComponentId, ComponentKind, GridComponent};
