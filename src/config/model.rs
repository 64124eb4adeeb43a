//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for acquiring a lock.
///
/// This struct represents the contents of an optional YAML config file.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding all request and lock entries (default: home directory).
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Logical lock name (default: "default_lock").
    #[serde(default = "default_name")]
    pub name: String,

    /// Seconds between two directory checks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds to wait for the lock before giving up.
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Whether to withdraw a new lock that raced with another one.
    #[serde(default = "default_true")]
    pub verify_after_create: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            name: default_name(),
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
            verify_after_create: default_true(),
        }
    }
}
