//! # archivio-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for the archive location hierarchy, code allocation,
//! placements, and the read-only catalog lookups.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
