//! Archive code-allocation configuration.

use serde::{Deserialize, Serialize};

/// Settings governing physical-location code allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// How many times an allocation or placement is retried internally
    /// after a unique-constraint conflict before surfacing the error.
    #[serde(default = "default_retry_attempts")]
    pub allocation_retry_attempts: u32,
    /// When true, ordinary `create` fills gaps left by deleted nodes
    /// instead of always advancing the high-water mark. Gap reuse is
    /// otherwise only applied when an explicit preferred sequence is
    /// passed (bulk import / renumbering).
    #[serde(default)]
    pub gap_fill_on_create: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            allocation_retry_attempts: default_retry_attempts(),
            gap_fill_on_create: false,
        }
    }
}

fn default_retry_attempts() -> u32 {
    3
}
