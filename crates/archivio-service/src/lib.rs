//! # archivio-service
//!
//! Business logic service layer for Studio Archivio. Each service
//! orchestrates repositories to implement application-level use cases:
//! collision-free code allocation, location tree maintenance, placement
//! tracking, and inventory flattening.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references. All mutation of the
//! location forest and the placement table goes through these services,
//! never through direct field writes, so invariants are enforced once.

pub mod allocator;
pub mod inventory;
pub mod location;
pub mod placement;

pub use allocator::CodeAllocator;
pub use inventory::{FlattenReport, InventoryService};
pub use location::LocationTreeService;
pub use placement::PlacementService;
