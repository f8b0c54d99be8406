//! Database configuration.

use serde::{Deserialize, Serialize};

/// PostgreSQL connection settings for the archive store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL, including credentials and database name.
    pub url: String,
    /// Upper bound on pooled connections.
    #[serde(default = "defaults::max_connections")]
    pub max_connections: u32,
    /// Connections kept open while idle.
    #[serde(default = "defaults::min_connections")]
    pub min_connections: u32,
    /// Seconds to wait when acquiring a connection.
    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Seconds before an idle connection is dropped.
    #[serde(default = "defaults::idle_timeout")]
    pub idle_timeout_seconds: u64,
}

mod defaults {
    pub fn max_connections() -> u32 {
        16
    }

    pub fn min_connections() -> u32 {
        2
    }

    pub fn connect_timeout() -> u64 {
        10
    }

    pub fn idle_timeout() -> u64 {
        600
    }
}
