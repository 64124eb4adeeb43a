//! Releasing a held lock by its identifier.
//!
//! The id printed by `acquire` is enough to find the lock again, from any
//! process with access to the directory.

use crate::entry::{Entry, EntryKind, list_entries};
use crate::error::{LockError, Result};
use std::path::Path;
use tracing::info;

/// Find the lock entry carrying `id` in `dir`.
///
/// # Returns
///
/// * `Ok(Entry)` - The single matching lock
/// * `Err(LockError::NotFound)` - No lock carries that id
/// * `Err(LockError::Ambiguous)` - More than one lock carries that id
pub fn find_lock(dir: &Path, id: &str) -> Result<Entry> {
    let id = id.trim();
    let mut matches = list_entries(dir)
        .with_kind(EntryKind::Lock)
        .with_id(id)
        .into_sorted();

    match matches.len() {
        0 => Err(LockError::NotFound {
            id: id.to_string(),
            dir: dir.to_path_buf(),
        }),
        1 => Ok(matches.remove(0)),
        count => Err(LockError::Ambiguous {
            id: id.to_string(),
            count,
        }),
    }
}

/// Remove the lock entry carrying `id` from `dir`.
///
/// Returns the removed entry for reporting.
pub fn release(dir: &Path, id: &str) -> Result<Entry> {
    let lock = find_lock(dir, id)?;
    lock.remove()?;
    info!(name = %lock.name(), id = %lock.id(), "lock released");
    Ok(lock)
}
