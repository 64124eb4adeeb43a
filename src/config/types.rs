//! Configuration defaults and command-line overrides.

use directories::BaseDirs;
use std::path::PathBuf;

/// Default delay between directory checks, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default total wait budget, in seconds.
pub const DEFAULT_MAX_WAIT_SECS: u64 = 3600;

/// Default logical lock name.
pub const DEFAULT_NAME: &str = "default_lock";

/// Default lock directory: the user's home, or the current directory when no
/// home can be resolved.
pub fn default_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub(super) fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

pub(super) fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

pub(super) fn default_max_wait_secs() -> u64 {
    DEFAULT_MAX_WAIT_SECS
}

pub(super) fn default_true() -> bool {
    true
}

/// Values given on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub dir: Option<PathBuf>,
    pub name: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub max_wait_secs: Option<u64>,
    /// Turn off post-create verification.
    pub no_verify: bool,
}
