//! Inventory listing row types.

pub mod row;

pub use row::{InventoryRow, RowKind, order_token};
