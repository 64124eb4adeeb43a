//! Dirlock: fair mutual exclusion coordinated through a shared directory.
//!
//! Independent processes, possibly on different hosts sharing a network
//! filesystem, serialize access to a resource using nothing but files in a
//! common directory. There is no lock server: a participant drops a
//! `.request` file, waits until it is the oldest request among those sharing
//! its lock name or host, then creates a `.lock` file once no other lock is
//! held.
//!
//! ```no_run
//! use dirlock::acquire::{AcquireOptions, acquire};
//! use std::time::Duration;
//!
//! let options = AcquireOptions::new("/shared/locks", "nightly-build")
//!     .with_poll_interval(Duration::from_secs(5))
//!     .with_max_wait(Duration::from_secs(600));
//! let lock = acquire(options)?;
//! // ... use the resource ...
//! lock.remove()?;
//! # Ok::<(), dirlock::error::LockError>(())
//! ```

pub mod acquire;
pub mod config;
pub mod entry;
pub mod error;
pub mod exit_codes;
pub mod identity;
pub mod release;
