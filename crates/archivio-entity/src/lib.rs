//! # archivio-entity
//!
//! Domain entity models for Studio Archivio: the physical location
//! hierarchy, placement records, inventory rows, and the read-only
//! reference types for externally-owned dossiers and documents.

pub mod catalog;
pub mod inventory;
pub mod location;
pub mod placement;
