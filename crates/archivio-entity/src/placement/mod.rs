//! Placement entities: where an external object currently sits.

pub mod model;
pub mod target;

pub use model::{CreatePlacement, Placement};
pub use target::TargetKind;
