//! Hot-reloading file content cache
//!
//! A [`CachedFile`] keeps the bytes of one configuration file in memory and
//! re-reads them when the file's modification time changes. Filesystem stats
//! are throttled to one per reload interval no matter how many callers ask;
//! inside the window callers get the last known content without touching the
//! filesystem or taking a lock.
//!
//! [`Reloading`] layers a parsed value on top: the value is rebuilt from
//! scratch whenever the underlying content changes and published with an
//! atomic pointer swap, so readers never see a half-built table.

use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Minimum time between two filesystem stats of the same file
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(5);

/// File content as of one successful load
#[derive(Debug)]
pub struct Snapshot {
    data: Vec<u8>,
    modified: SystemTime,
    loaded_at: SystemTime,
    generation: u64,
}

impl Snapshot {
    /// Raw file bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Modification time of the file when it was read
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Wall-clock time of the read
    pub fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }

    /// Load counter, starting at 1 and incremented on every reload
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Cached content of a single file, reloaded lazily on modification
pub struct CachedFile {
    path: PathBuf,
    interval: Duration,
    /// Milliseconds since the Unix epoch of the last stat
    last_check: AtomicU64,
    /// Set while the file can't be stat'ed or read
    failed: AtomicBool,
    current: ArcSwap<Snapshot>,
    reload_lock: Mutex<()>,
}

impl CachedFile {
    /// Open a file with the default reload interval.
    ///
    /// The file is read immediately; a missing or unreadable file is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_interval(path, DEFAULT_RELOAD_INTERVAL)
    }

    /// Open a file with a custom reload interval
    pub fn with_interval(path: impl AsRef<Path>, interval: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let modified = stat_modified(&path)?;
        let snapshot = read_snapshot(&path, modified, 1)?;
        tracing::info!(
            path = %path.display(),
            bytes = snapshot.data.len(),
            "Loaded cached file"
        );

        Ok(Self {
            path,
            interval,
            last_check: AtomicU64::new(unix_millis(SystemTime::now())),
            failed: AtomicBool::new(false),
            current: ArcSwap::from_pointee(snapshot),
            reload_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last loaded content, without checking the file
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Return the current content and whether this call reloaded it.
    ///
    /// Within the reload interval of the previous check this returns the
    /// cached content with `changed == false`. Once the interval has passed
    /// the file is stat'ed; if its modification time differs from the cached
    /// one the whole file is re-read under the reload lock.
    ///
    /// After a failed stat or read every call checks the file again and
    /// fails until it is readable, regardless of the interval.
    pub fn get(&self) -> Result<(Arc<Snapshot>, bool)> {
        let now = unix_millis(SystemTime::now());
        if !self.failed.load(Ordering::Acquire) {
            let last = self.last_check.load(Ordering::Acquire);
            if now.saturating_sub(last) < duration_millis(self.interval) {
                return Ok((self.current.load_full(), false));
            }

            // One caller per window performs the stat; the others keep reading.
            if self
                .last_check
                .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Ok((self.current.load_full(), false));
            }
        }

        match self.check() {
            Ok(result) => {
                if self.failed.swap(false, Ordering::AcqRel) {
                    self.last_check.store(now, Ordering::Release);
                    tracing::info!(path = %self.path.display(), "File readable again");
                }
                Ok(result)
            }
            Err(e) => {
                self.failed.store(true, Ordering::Release);
                Err(e)
            }
        }
    }

    fn check(&self) -> Result<(Arc<Snapshot>, bool)> {
        let modified = stat_modified(&self.path)?;
        if self.current.load().modified == modified {
            return Ok((self.current.load_full(), false));
        }

        let _guard = self
            .reload_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let current = self.current.load_full();
        if current.modified == modified {
            return Ok((current, false));
        }

        let snapshot = Arc::new(read_snapshot(
            &self.path,
            modified,
            current.generation + 1,
        )?);
        tracing::info!(
            path = %self.path.display(),
            bytes = snapshot.data().len(),
            generation = snapshot.generation(),
            modified = ?snapshot.modified(),
            "Reloaded cached file"
        );
        self.current.store(Arc::clone(&snapshot));

        Ok((snapshot, true))
    }
}

impl std::fmt::Debug for CachedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedFile")
            .field("path", &self.path)
            .field("interval", &self.interval)
            .field("generation", &self.current.load().generation)
            .finish()
    }
}

fn stat_modified(path: &Path) -> Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| Error::config(format!("Can't stat file '{}': {}", path.display(), e)))
}

fn read_snapshot(path: &Path, modified: SystemTime, generation: u64) -> Result<Snapshot> {
    let data = std::fs::read(path)
        .map_err(|e| Error::config(format!("Failed to read '{}': {}", path.display(), e)))?;
    Ok(Snapshot {
        data,
        modified,
        loaded_at: SystemTime::now(),
        generation,
    })
}

fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(duration_millis)
        .unwrap_or(0)
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

struct Parsed<T> {
    generation: u64,
    value: Arc<T>,
}

/// A value derived from a [`CachedFile`], rebuilt whenever the file changes
pub struct Reloading<T> {
    file: CachedFile,
    parse: fn(&[u8]) -> Result<T>,
    parsed: ArcSwap<Parsed<T>>,
}

impl<T> Reloading<T> {
    /// Parse the file's current content; a parse error fails construction.
    pub fn new(file: CachedFile, parse: fn(&[u8]) -> Result<T>) -> Result<Self> {
        let snapshot = file.current();
        let value = parse(snapshot.data())?;
        Ok(Self {
            file,
            parse,
            parsed: ArcSwap::from_pointee(Parsed {
                generation: snapshot.generation(),
                value: Arc::new(value),
            }),
        })
    }

    /// Backing file
    pub fn file(&self) -> &CachedFile {
        &self.file
    }

    /// Current value, reparsing first if the file content moved on.
    ///
    /// A parse failure is returned to the caller and is not remembered, so
    /// every later call retries until the file is fixed.
    pub fn get(&self) -> Result<Arc<T>> {
        let (snapshot, _) = self.file.get()?;
        let generation = snapshot.generation();
        {
            let parsed = self.parsed.load();
            if parsed.generation >= generation {
                return Ok(Arc::clone(&parsed.value));
            }
        }

        let value = Arc::new((self.parse)(snapshot.data())?);
        tracing::debug!(
            path = %self.file.path().display(),
            generation,
            "Rebuilt parsed content"
        );
        self.parsed.rcu(|current| {
            if current.generation >= generation {
                Arc::clone(current)
            } else {
                Arc::new(Parsed {
                    generation,
                    value: Arc::clone(&value),
                })
            }
        });

        Ok(value)
    }
}
