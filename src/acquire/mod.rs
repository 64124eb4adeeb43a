//! The acquire protocol.
//!
//! Acquiring a lock walks through these states:
//!
//! 1. **Requesting**: make sure the directory exists and drop a `.request`
//!    entry for `(name, node, id, now)`.
//! 2. **Waiting for turn**: poll until our request is the oldest one among the
//!    requests sharing its name or node.
//! 3. **Attempting lock**: count the `.lock` entries in the whole directory.
//!    None means we create ours; one or two means someone is handing over, so
//!    we poll again; more than two is a broken directory and we stop.
//! 4. **Acquired**: our request is removed and the lock entry is returned.
//!    Releasing it is up to the caller.
//!
//! A single deadline, started when `acquire` is called, covers both waiting
//! phases. Whenever the protocol gives up, it removes its own request and
//! reports a removal failure alongside the original cause.
//!
//! # Handoff
//!
//! Counting locks and then creating one is not atomic. With
//! [`AcquireOptions::verify_after_create`] set, a freshly created lock is
//! checked against a second listing: if any other lock showed up in the
//! meantime, ours is withdrawn and the attempt counts as contention.


use crate::config::{DEFAULT_MAX_WAIT_SECS, DEFAULT_NAME, DEFAULT_POLL_INTERVAL_SECS};
use crate::entry::{Entry, EntryKind, list_entries, now_nanos};
use crate::error::{LockError, Result};
use crate::identity::{Identity, SystemIdentity};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Number of lock entries that still counts as a handoff in progress.
pub const MAX_TRANSIENT_LOCKS: usize = 2;

/// Longest sleep between two checks of the cancellation flag.
const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Resolved inputs of one acquire call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireOptions {
    /// Directory shared by every participant.
    pub dir: PathBuf,

    /// Logical lock name.
    pub name: String,

    /// Delay between two directory checks.
    pub poll_interval: Duration,

    /// Total budget for waiting in the queue and for the lock.
    pub max_wait: Duration,

    /// Withdraw a new lock if another one appeared while it was created.
    pub verify_after_create: bool,
}

impl AcquireOptions {
    /// Options for `name` in `dir` with the default timings.
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
            verify_after_create: true,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_verify_after_create(mut self, verify: bool) -> Self {
        self.verify_after_create = verify;
        self
    }
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self::new(PathBuf::from("."), DEFAULT_NAME)
    }
}

/// Outcome of a single attempt at creating the lock entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockAttempt {
    /// The lock entry was created and is ours.
    Acquired(Entry),
    /// One or two locks exist; try again later.
    Contended { existing: usize },
}

/// Runs the acquire protocol for one set of options.
///
/// The acquirer holds no state between calls, so one value can be reused and
/// several acquirers for different names can run side by side.
pub struct Acquirer<I: Identity = SystemIdentity> {
    options: AcquireOptions,
    identity: I,
    cancel: Option<Arc<AtomicBool>>,
}

impl Acquirer<SystemIdentity> {
    /// Acquirer using the local host name and random tokens.
    pub fn new(options: AcquireOptions) -> Self {
        Self::with_identity(options, SystemIdentity::new())
    }
}

impl<I: Identity> Acquirer<I> {
    pub fn with_identity(options: AcquireOptions, identity: I) -> Self {
        Self {
            options,
            identity,
            cancel: None,
        }
    }

    /// Stop waiting as soon as `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &AcquireOptions {
        &self.options
    }

    /// Queue for the lock and take it once it is our turn.
    ///
    /// # Returns
    ///
    /// * `Ok(Entry)` - The lock entry now held by the caller
    /// * `Err(LockError::Config)` - Name or node is empty after normalization
    /// * `Err(LockError::Setup)` - Directory or request could not be created
    /// * `Err(LockError::Timeout)` - Budget ran out while queued
    /// * `Err(LockError::ContentionExhausted)` - Budget ran out while locks existed
    /// * `Err(LockError::ConsistencyViolation)` - More than two locks found
    /// * `Err(LockError::CleanupAfter)` - Any of the above, and our request
    ///   could not be removed
    pub fn acquire(&self) -> Result<Entry> {
        let started = Instant::now();
        let request = self.request()?;

        let outcome = self
            .wait_for_turn(&request, started)
            .and_then(|()| self.lock(started));

        match outcome {
            Ok(lock) => self.finish(&request, lock),
            Err(e) => Err(self.abandon(&request, e)),
        }
    }

    /// Make a single attempt at creating the lock entry.
    ///
    /// Does not look at the request queue; `acquire` only calls this once our
    /// request is the oldest.
    pub fn try_lock(&self) -> Result<LockAttempt> {
        let dir = &self.options.dir;
        let existing = list_entries(dir).with_kind(EntryKind::Lock).len();

        match existing {
            0 => {
                let lock = self.new_entry(EntryKind::Lock);
                lock.create().map_err(|source| LockError::LockCreate {
                    path: lock.path().to_path_buf(),
                    source,
                })?;

                if self.options.verify_after_create {
                    self.verify(lock)
                } else {
                    Ok(LockAttempt::Acquired(lock))
                }
            }
            n if n <= MAX_TRANSIENT_LOCKS => Ok(LockAttempt::Contended { existing: n }),
            count => Err(LockError::ConsistencyViolation {
                dir: dir.clone(),
                count,
            }),
        }
    }

    fn request(&self) -> Result<Entry> {
        let request = self.new_entry(EntryKind::Request);
        // An entry that does not decode is invisible to every other participant
        if Entry::decode(request.path()).as_ref() != Some(&request) {
            return Err(LockError::Config(format!(
                "cannot build a lock entry from name '{}' and node '{}'",
                self.options.name,
                self.identity.node()
            )));
        }

        create_lock_dir(&self.options.dir)?;
        request.create().map_err(|source| LockError::Setup {
            context: format!("failed to create request '{}'", request.path().display()),
            source,
        })?;

        info!(name = %request.name(), request = %request.path().display(), "lock requested");
        Ok(request)
    }

    fn wait_for_turn(&self, request: &Entry, started: Instant) -> Result<()> {
        loop {
            self.check_cancelled()?;

            let requests = list_entries(&self.options.dir).with_kind(EntryKind::Request);
            if requests.is_oldest(request) {
                debug!(name = %request.name(), "request is first in queue");
                return Ok(());
            }

            if self.deadline_passed(started) {
                return Err(LockError::Timeout {
                    max_wait: self.options.max_wait,
                });
            }

            let ahead = requests
                .matching(request)
                .iter()
                .filter(|other| other.precedes(request))
                .count();
            debug!(name = %request.name(), ahead, "waiting for turn");
            self.pause();
        }
    }

    fn lock(&self, started: Instant) -> Result<Entry> {
        loop {
            self.check_cancelled()?;

            match self.try_lock()? {
                LockAttempt::Acquired(lock) => return Ok(lock),
                LockAttempt::Contended { existing } => {
                    if self.deadline_passed(started) {
                        return Err(LockError::ContentionExhausted {
                            max_wait: self.options.max_wait,
                            existing,
                        });
                    }
                    debug!(existing, "lock exists, retrying");
                    self.pause();
                }
            }
        }
    }

    /// Keep `lock` only if no other lock appeared next to it.
    fn verify(&self, lock: Entry) -> Result<LockAttempt> {
        let others = list_entries(&self.options.dir)
            .with_kind(EntryKind::Lock)
            .filter(|e| e.path() != lock.path())
            .len();

        if others == 0 {
            return Ok(LockAttempt::Acquired(lock));
        }

        warn!(
            lock = %lock.path().display(),
            others,
            "another lock was created concurrently, withdrawing ours"
        );
        lock.remove()?;
        Ok(LockAttempt::Contended { existing: others })
    }

    /// Drop our request now that the lock is held.
    ///
    /// A leftover request would keep blocking its whole domain, so if it
    /// cannot be removed the lock is given back and the caller gets an error.
    fn finish(&self, request: &Entry, lock: Entry) -> Result<Entry> {
        match discard(request) {
            Ok(()) => {
                info!(name = %lock.name(), id = %lock.id(), "lock acquired");
                Ok(lock)
            }
            Err(source) => {
                warn!(request = %request.path().display(), error = %source, "failed to remove request after locking");
                let primary = LockError::Cleanup {
                    path: request.path().to_path_buf(),
                    source,
                };
                match discard(&lock) {
                    Ok(()) => Err(primary),
                    Err(source) => {
                        Err(primary.with_cleanup_failure(lock.path().to_path_buf(), source))
                    }
                }
            }
        }
    }

    /// Remove our request after a failure, layering any removal error on top
    /// of `primary`.
    fn abandon(&self, request: &Entry, primary: LockError) -> LockError {
        warn!(name = %request.name(), error = %primary, "giving up on lock");
        match discard(request) {
            Ok(()) => primary,
            Err(source) => {
                warn!(request = %request.path().display(), error = %source, "failed to remove request");
                primary.with_cleanup_failure(request.path().to_path_buf(), source)
            }
        }
    }

    fn new_entry(&self, kind: EntryKind) -> Entry {
        Entry::new(
            &self.options.dir,
            &self.options.name,
            &self.identity.node(),
            &self.identity.token(),
            now_nanos(),
            kind,
        )
    }

    fn deadline_passed(&self, started: Instant) -> bool {
        started.elapsed() > self.options.max_wait
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(LockError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for one poll interval, waking early if cancelled.
    fn pause(&self) {
        if self.cancel.is_none() {
            thread::sleep(self.options.poll_interval);
            return;
        }

        let until = Instant::now() + self.options.poll_interval;
        while !self.is_cancelled() {
            let now = Instant::now();
            if now >= until {
                break;
            }
            thread::sleep((until - now).min(CANCEL_CHECK_INTERVAL));
        }
    }
}

/// Acquire a lock with the local host identity.
///
/// Convenience wrapper around [`Acquirer::acquire`].
pub fn acquire(options: AcquireOptions) -> Result<Entry> {
    Acquirer::new(options).acquire()
}

/// Create the lock directory (and parents) if it does not exist yet.
pub fn create_lock_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o774);
    }

    builder.create(dir).map_err(|source| LockError::Setup {
        context: format!("unable to create lock dir '{}'", dir.display()),
        source,
    })
}

/// Remove one of our own entries; an entry that is already gone is fine.
fn discard(entry: &Entry) -> io::Result<()> {
    match fs::remove_file(entry.path()) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %entry.path().display(), "entry already removed");
            Ok(())
        }
        other => other,
    }
}
