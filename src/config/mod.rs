//! Configuration model for dirlock.
//!
//! The protocol itself only sees an [`AcquireOptions`](crate::acquire::AcquireOptions)
//! value. This module builds one from three layers: built-in defaults, an
//! optional YAML file, and command-line overrides. Unknown YAML fields are
//! ignored for forward compatibility.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::{
    DEFAULT_MAX_WAIT_SECS, DEFAULT_NAME, DEFAULT_POLL_INTERVAL_SECS, Overrides, default_dir,
};
