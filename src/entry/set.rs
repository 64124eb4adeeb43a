//! Point-in-time collections of entries and the queries over them.
//!
//! A set is always read fresh from the directory; nothing is cached between
//! polls because other participants can add or remove files at any moment.

use super::{Entry, EntryKind};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// An unordered snapshot of the entries in a lock directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySet {
    entries: Vec<Entry>,
}

impl EntrySet {
    /// Keep the entries accepted by `accept`.
    pub fn filter<F>(self, accept: F) -> Self
    where
        F: Fn(&Entry) -> bool,
    {
        self.entries.into_iter().filter(|e| accept(e)).collect()
    }

    pub fn with_kind(self, kind: EntryKind) -> Self {
        self.filter(|e| e.kind() == kind)
    }

    pub fn with_name(self, name: &str) -> Self {
        self.filter(|e| e.name() == name)
    }

    pub fn with_node(self, node: &str) -> Self {
        self.filter(|e| e.node() == node)
    }

    pub fn with_id(self, id: &str) -> Self {
        self.filter(|e| e.id() == id)
    }

    /// The entries competing with `entry`: every other entry sharing its
    /// lock name or its node. `entry` itself is left out.
    pub fn matching(&self, entry: &Entry) -> Self {
        self.entries
            .iter()
            .filter(|e| e.path() != entry.path() && e.shares_domain(entry))
            .cloned()
            .collect()
    }

    /// The entry with the smallest `created`, ties broken by file name.
    pub fn oldest(&self) -> Option<&Entry> {
        self.entries
            .iter()
            .min_by(|a, b| (a.created(), a.file_name()).cmp(&(b.created(), b.file_name())))
    }

    /// Whether `entry` comes first among the entries it competes with.
    ///
    /// Only entries sharing its name or node are considered, so requests for
    /// unrelated locks from unrelated hosts never wait on each other.
    pub fn is_oldest(&self, entry: &Entry) -> bool {
        self.matching(entry).iter().all(|other| entry.precedes(other))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Entries ordered oldest first.
    pub fn into_sorted(mut self) -> Vec<Entry> {
        self.entries
            .sort_by(|a, b| (a.created(), a.file_name()).cmp(&(b.created(), b.file_name())));
        self.entries
    }
}

impl FromIterator<Entry> for EntrySet {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EntrySet {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntrySet {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Read every entry directly inside `dir`.
///
/// Only regular files are considered, and files that do not decode are
/// skipped. A directory that cannot be read yields an empty set: a poll cycle
/// must not abort because the listing failed once.
pub fn list_entries(dir: &Path) -> EntrySet {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to read lock directory");
            return EntrySet::default();
        }
    };

    let mut entries = Vec::new();
    for item in read {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to read lock directory entry");
                continue;
            }
        };

        // The file may vanish between listing and stat; skip it if so
        let is_file = item.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        let path = item.path();
        match Entry::decode(&path) {
            Some(entry) => entries.push(entry),
            None => debug!(path = %path.display(), "skipping non-conforming file"),
        }
    }

    EntrySet { entries }
}
