//! Collision-free code allocation.

pub mod service;
pub mod state;

pub use service::{CodeAllocator, ROOT_SCOPE, scope_for};
pub use state::{BucketState, MAX_SEQUENCE, normalize_prefix, render};
