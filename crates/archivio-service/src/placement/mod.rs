//! Placement tracking.

pub mod service;

pub use service::{AssignRequest, PlacementService};
