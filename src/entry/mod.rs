//! Entry model for dirlock.
//!
//! An entry is a single file in the lock directory standing for either a
//! pending request or a held lock. Its whole identity lives in the file name:
//!
//! ```text
//! <name>__<node>__<id>__<created><extension>
//! ```
//!
//! - `name`: logical lock name, path separators replaced by `_`
//! - `node`: short host name of the creator
//! - `id`: unique token (32 hex digits)
//! - `created`: creation instant in nanoseconds since the Unix epoch
//! - `extension`: `.request` or `.lock`
//!
//! No field may contain `__`, may be empty, or may start or end with `_`;
//! [`sanitize_field`] enforces this so the name always splits back into the
//! same four fields.
//!
//! The file body holds informational JSON metadata (owner, pid, timestamp).
//! Nothing in the protocol depends on it.

mod set;

pub use set::{EntrySet, list_entries};

use crate::error::{LockError, Result};
use crate::identity::owner_string;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Separator between the four identity fields of an entry file name.
pub const FIELD_SEPARATOR: &str = "__";

/// Extension of request entries.
pub const REQUEST_EXTENSION: &str = ".request";

/// Extension of lock entries.
pub const LOCK_EXTENSION: &str = ".lock";

/// What an entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Intent to acquire; queued for fairness.
    Request,
    /// A currently held lock.
    Lock,
}

impl EntryKind {
    /// File name suffix for this kind, including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            EntryKind::Request => REQUEST_EXTENSION,
            EntryKind::Lock => LOCK_EXTENSION,
        }
    }

    fn from_file_name(file_name: &str) -> Option<(Self, &str)> {
        if let Some(stem) = file_name.strip_suffix(REQUEST_EXTENSION) {
            Some((EntryKind::Request, stem))
        } else {
            file_name
                .strip_suffix(LOCK_EXTENSION)
                .map(|stem| (EntryKind::Lock, stem))
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Request => write!(f, "request"),
            EntryKind::Lock => write!(f, "lock"),
        }
    }
}

/// A request or lock file, with the identity decoded from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    path: PathBuf,
    name: String,
    node: String,
    id: String,
    created: i64,
    kind: EntryKind,
}

impl Entry {
    /// Build the entry for the given fields inside `dir`.
    ///
    /// `name` and `node` go through [`sanitize_field`], and dashes are
    /// stripped from `id`, so the resulting file name always decodes back
    /// into the stored fields. Nothing is written to disk.
    pub fn new(
        dir: &Path,
        name: &str,
        node: &str,
        id: &str,
        created: i64,
        kind: EntryKind,
    ) -> Self {
        let name = sanitize_field(name);
        let node = sanitize_field(node);
        let id = sanitize_field(&id.replace('-', ""));
        let path = dir.join(encode_file_name(&name, &node, &id, created, kind));
        Self {
            path,
            name,
            node,
            id,
            created,
            kind,
        }
    }

    /// Decode an entry from its path.
    ///
    /// Returns `None` for anything that does not follow the naming scheme:
    /// wrong extension, wrong field count, empty or unnormalized fields, or a
    /// non-numeric timestamp.
    pub fn decode(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let (kind, stem) = EntryKind::from_file_name(file_name)?;

        let fields: Vec<&str> = stem.split(FIELD_SEPARATOR).collect();
        let [name, node, id, created] = fields.as_slice() else {
            return None;
        };

        if ![name, node, id].iter().all(|f| is_valid_field(f)) {
            return None;
        }
        if created.is_empty() || !created.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let created = created.parse::<i64>().ok()?;

        Some(Self {
            path: path.to_path_buf(),
            name: name.to_string(),
            node: node.to_string(),
            id: id.to_string(),
            created,
            kind,
        })
    }

    /// Full path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the entry.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// The encoded file name.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creation instant in nanoseconds since the Unix epoch.
    pub fn created(&self) -> i64 {
        self.created
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether this entry competes with `other` for fairness: same lock name
    /// or same node.
    pub fn shares_domain(&self, other: &Entry) -> bool {
        self.name == other.name || self.node == other.node
    }

    /// Whether this entry sorts before `other` in the queue.
    ///
    /// Smaller `created` wins; equal timestamps fall back to the file name so
    /// every participant agrees on the order.
    pub fn precedes(&self, other: &Entry) -> bool {
        (self.created, self.file_name()) < (other.created, other.file_name())
    }

    /// Whether this entry is the oldest of its kind in its domain, using a
    /// fresh read of its directory.
    pub fn is_oldest(&self) -> bool {
        list_entries(self.dir())
            .with_kind(self.kind)
            .is_oldest(self)
    }

    /// Write the backing file with exclusive-create semantics.
    ///
    /// Fails with `AlreadyExists` if a file with the same name is present.
    pub fn create(&self) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)?;

        let metadata = EntryMetadata::new();
        let json = serde_json::to_string_pretty(&metadata).map_err(io::Error::other)?;
        let written = file
            .write_all(json.as_bytes())
            .and_then(|()| file.sync_all());

        if let Err(e) = written {
            // A half-written entry still counts, take it back out
            let _ = fs::remove_file(&self.path);
            return Err(e);
        }
        Ok(())
    }

    /// Delete the backing file.
    ///
    /// Failure leaves a stale entry behind, so it is reported as
    /// [`LockError::Cleanup`].
    pub fn remove(&self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|source| LockError::Cleanup {
            path: self.path.clone(),
            source,
        })
    }

    /// Read the informational metadata, if the file still exists and parses.
    pub fn metadata(&self) -> Option<EntryMetadata> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Time since creation, derived from the encoded timestamp.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(DateTime::<Utc>::from_timestamp_nanos(self.created))
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} (node: {}, id: {}, age: {})",
            self.kind,
            self.name,
            self.node,
            self.id,
            format_age(self.age())
        )
    }
}

/// Metadata written into each entry file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Owner of the entry (e.g., `user@HOST`).
    pub owner: String,

    /// Process ID of the creator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Wall-clock creation time (RFC3339).
    pub created_at: DateTime<Utc>,
}

impl EntryMetadata {
    /// Metadata for an entry created now by this process.
    pub fn new() -> Self {
        Self {
            owner: owner_string(),
            pid: Some(std::process::id()),
            created_at: Utc::now(),
        }
    }
}

impl Default for EntryMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the file name for the given, already normalized, fields.
pub fn encode_file_name(name: &str, node: &str, id: &str, created: i64, kind: EntryKind) -> String {
    format!(
        "{name}{sep}{node}{sep}{id}{sep}{created}{ext}",
        sep = FIELD_SEPARATOR,
        ext = kind.extension()
    )
}

/// Normalize a value so it can be used as an identity field.
///
/// Path separators become `_`, runs of `_` collapse to one, and leading or
/// trailing `_` and whitespace are trimmed. The result never contains the
/// `__` separator, and sanitizing it again returns it unchanged.
pub fn sanitize_field(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c == '/' || c == '\\' { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches(|c: char| c == '_' || c.is_whitespace()).to_string()
}

fn is_valid_field(field: &str) -> bool {
    !field.is_empty() && sanitize_field(field) == field
}

/// Current time in nanoseconds since the Unix epoch.
pub fn now_nanos() -> i64 {
    // Out of range only after the year 2262
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Format an age as a short human-readable string.
pub fn format_age(age: Duration) -> String {
    let seconds = age.num_seconds().max(0);
    let minutes = age.num_minutes();
    let hours = age.num_hours();
    let days = age.num_days();

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}
