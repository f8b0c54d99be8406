//! Read-only reference types for externally-owned catalog entities.

pub mod refs;
pub mod source;

pub use refs::{DocumentRef, DossierRef};
pub use source::CatalogSource;
