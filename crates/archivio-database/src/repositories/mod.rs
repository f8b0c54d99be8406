//! Repository implementations for the archive core.

pub mod allocation;
pub mod catalog;
pub mod location;
pub mod placement;

pub use allocation::AllocationRepository;
pub use catalog::CatalogRepository;
pub use location::LocationRepository;
pub use placement::PlacementRepository;
