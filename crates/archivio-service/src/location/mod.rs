//! Location tree maintenance.

pub mod paths;
pub mod service;

pub use service::{CreateLocationRequest, LocationTreeService};
