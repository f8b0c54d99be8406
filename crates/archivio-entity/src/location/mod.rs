//! Physical location hierarchy entities.

pub mod kind;
pub mod model;

pub use kind::LocationKind;
pub use model::{CreateLocation, LocationNode};
