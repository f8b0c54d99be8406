//! Inventory flattening.

pub mod flatten;
pub mod service;

pub use flatten::{FlattenReport, MalformedSubtree, flatten};
pub use service::InventoryService;
