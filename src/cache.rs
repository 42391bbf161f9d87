//! Resumable chunk storage with expiry and capacity eviction.
//!
//! ## The Problem
//!
//! A caller receives chunk 1 of N and comes back later, in a separate stateless request,
//! for chunk 2. The chunk list has to outlive the request that produced it, under a key
//! the caller can quote back.
//!
//! ## Keys
//!
//! The key is the first 8 lowercase hex characters of the SHA-256 of the source prompt.
//! The same prompt always maps to the same key, so re-running a prompt overwrites its
//! previous entry instead of piling up new ones.
//!
//! ## Lifetime
//!
//! ```text
//! put:  sweep files older than ttl (by mtime)
//!       write <key>.json  {chunks, timestamp, sourceHash}
//!       evict oldest (by mtime) until count <= max_entries
//! get:  missing            -> None
//!       now - timestamp > ttl -> delete, None
//!       unreadable/corrupt -> delete, None
//!       otherwise          -> chunks
//! ```
//!
//! ## Concurrency
//!
//! Stores are **not** synchronized with each other. Two handles (or two processes)
//! pointed at the same directory race freely: one writer's eviction sweep can delete an
//! entry another writer just created, before anyone reads it. Callers must treat a miss
//! as possible even immediately after a successful `put`, and fall back to regenerating.
//! This is accepted for the expected access pattern of one server process handling
//! requests sequentially.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{EditChunk, Error, Result};

/// Entries older than this are treated as absent.
pub const DEFAULT_TTL: Duration = Duration::from_millis(600_000);

/// Maximum number of entries kept before the oldest are evicted.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Directory name under the system temp dir used by default.
pub const DEFAULT_CACHE_DIR_NAME: &str = "editslabs-chunks";

const KEY_LEN: usize = 8;
const ENTRY_EXT: &str = "json";

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to. Intended for tests.
///
/// ```rust
/// use std::time::Duration;
/// use editslabs::{Clock, ManualClock};
///
/// let clock = ManualClock::default();
/// let t0 = clock.now();
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now().duration_since(t0).unwrap(), Duration::from_secs(5));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    /// Start at the given instant.
    #[must_use]
    pub fn starting_at(now: SystemTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(SystemTime::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Where and how long chunks are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory dedicated to this cache. Created on demand.
    pub dir: PathBuf,
    /// Age after which an entry is treated as absent.
    pub ttl: Duration,
    /// Entry count above which the oldest entries are evicted.
    pub max_entries: usize,
}

impl CacheConfig {
    /// Defaults, overridden by `EDITSLABS_CACHE_DIR`, `EDITSLABS_CACHE_TTL_MS` and
    /// `EDITSLABS_CACHE_MAX_ENTRIES` when set to usable values.
    #[must_use]
    pub fn from_env() -> Self {
        fn from_env<T: std::str::FromStr>(var: &str) -> Option<T> {
            std::env::var(var).ok().and_then(|v| v.trim().parse().ok())
        }

        let defaults = Self::default();
        Self {
            dir: std::env::var_os("EDITSLABS_CACHE_DIR")
                .filter(|v| !v.is_empty())
                .map_or(defaults.dir, PathBuf::from),
            ttl: from_env::<u64>("EDITSLABS_CACHE_TTL_MS")
                .filter(|ms| *ms > 0)
                .map_or(defaults.ttl, Duration::from_millis),
            max_entries: from_env::<usize>("EDITSLABS_CACHE_MAX_ENTRIES")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_entries),
        }
    }

    /// Same limits, different directory.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME),
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// What is persisted per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The full chunk list for one result.
    pub chunks: Vec<EditChunk>,
    /// Creation time, epoch milliseconds.
    pub timestamp: u64,
    /// Full hex SHA-256 of the source prompt.
    pub source_hash: String,
}

/// Administrative snapshot of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently held (expired-but-unswept entries included).
    pub count: usize,
    /// Configured time-to-live.
    pub ttl: Duration,
    /// Configured capacity.
    pub max_entries: usize,
    /// Human-readable location (a directory path, or `memory`).
    pub location: String,
}

/// Key-value storage for chunk lists.
///
/// Implementations swallow their own failures: `put` always returns the key, and any
/// read problem surfaces as `None`.
pub trait ChunkStore: Send + Sync {
    /// Persist `chunks` under the key derived from `source` and return that key.
    fn put(&self, source: &str, chunks: &[EditChunk]) -> String;

    /// Chunks stored under `key`, unless absent, expired, or corrupt.
    fn get(&self, key: &str) -> Option<Vec<EditChunk>>;

    /// Drop expired entries, then the oldest entries beyond capacity.
    fn evict(&self);

    /// Current count and configuration.
    fn stats(&self) -> CacheStats;

    /// How long an entry stays readable after it is written.
    fn ttl(&self) -> Duration;

    /// Delete every entry.
    fn clear(&self);
}

/// Full hex SHA-256 of `source` and the short key taken from it.
///
/// ```rust
/// let (key, hash) = editslabs::cache_key("hello");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(key, &hash[..8]);
/// ```
#[must_use]
pub fn cache_key(source: &str) -> (String, String) {
    let hash = hex::encode(Sha256::digest(source.as_bytes()));
    (hash[..KEY_LEN].to_string(), hash)
}

/// Whether `key` has the shape [`cache_key`] produces.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    key.len() == KEY_LEN && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn epoch_ms(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

fn ttl_ms(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

/// One JSON file per key in a dedicated directory.
///
/// The directory is shared, unlocked state; see the module docs for the races this
/// allows.
pub struct FileChunkStore {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FileChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileChunkStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FileChunkStore {
    /// Store using the system clock.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Store with an injected clock.
    #[must_use]
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.config.dir.join(format!("{key}.{ENTRY_EXT}"))
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.config.dir)?;
        Ok(())
    }

    /// Every `*.json` entry with its modification time.
    fn entries(&self) -> Result<Vec<(PathBuf, SystemTime)>> {
        let mut out = Vec::new();
        let dir = match fs::read_dir(&self.config.dir) {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(err) => return Err(err.into()),
        };
        for item in dir {
            let item = item?;
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            match item.metadata().and_then(|m| m.modified()) {
                Ok(mtime) => out.push((path, mtime)),
                Err(err) => log::debug!("cannot stat {}: {err}", path.display()),
            }
        }
        Ok(out)
    }

    fn sweep_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut removed = 0;
        for (path, mtime) in self.entries()? {
            let age = now.duration_since(mtime).unwrap_or_default();
            if age > self.config.ttl {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(err) => log::debug!("cannot remove {}: {err}", path.display()),
                }
            }
        }
        if removed > 0 {
            log::debug!("swept {removed} expired cache entries");
        }
        Ok(removed)
    }

    fn enforce_capacity(&self) -> Result<usize> {
        let mut entries = self.entries()?;
        if entries.len() <= self.config.max_entries {
            return Ok(0);
        }
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        let excess = entries.len() - self.config.max_entries;
        for (path, _) in entries.iter().take(excess) {
            if let Err(err) = fs::remove_file(path) {
                log::debug!("cannot evict {}: {err}", path.display());
            }
        }
        log::debug!("evicted {excess} cache entries over capacity");
        Ok(excess)
    }

    fn write_entry(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        self.ensure_dir()?;
        let path = self.entry_path(key);
        let tmp = path.with_extension(format!("{ENTRY_EXT}.tmp"));
        let bytes = serde_json::to_vec(entry)?;
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            // Eviction orders by mtime, so stamp it from the same clock as `timestamp`.
            file.set_modified(self.clock.now())?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn read_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        if !is_valid_key(key) {
            return Err(Error::InvalidKey(key.to_string()));
        }
        let bytes = match fs::read(self.entry_path(key)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn remove_entry(&self, key: &str) {
        if let Err(err) = fs::remove_file(self.entry_path(key)) {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::debug!("cannot remove cache entry {key}: {err}");
            }
        }
    }
}

impl ChunkStore for FileChunkStore {
    fn put(&self, source: &str, chunks: &[EditChunk]) -> String {
        if let Err(err) = self.ensure_dir().and_then(|()| self.sweep_expired()) {
            log::debug!("cache sweep failed: {err}");
        }

        let (key, source_hash) = cache_key(source);
        let entry = CacheEntry {
            chunks: chunks.to_vec(),
            timestamp: epoch_ms(self.clock.now()),
            source_hash,
        };
        match self.write_entry(&key, &entry) {
            Ok(()) => log::debug!("cached {} chunks under {key}", chunks.len()),
            Err(err) => log::error!("failed to cache chunks under {key}: {err}"),
        }

        if let Err(err) = self.enforce_capacity() {
            log::debug!("cache capacity check failed: {err}");
        }
        key
    }

    fn get(&self, key: &str) -> Option<Vec<EditChunk>> {
        let entry = match self.read_entry(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                log::debug!("cache miss for {key}");
                return None;
            }
            Err(Error::InvalidKey(_)) => {
                log::debug!("rejecting malformed cache key {key:?}");
                return None;
            }
            Err(err) => {
                log::warn!("cache entry {key} unreadable, removing: {err}");
                self.remove_entry(key);
                return None;
            }
        };

        let age = epoch_ms(self.clock.now()).saturating_sub(entry.timestamp);
        if age > ttl_ms(self.config.ttl) {
            log::debug!("cache entry {key} expired after {age}ms, removing");
            self.remove_entry(key);
            return None;
        }

        log::debug!("cache hit for {key}: {} chunks", entry.chunks.len());
        Some(entry.chunks)
    }

    fn evict(&self) {
        if let Err(err) = self.sweep_expired().and_then(|_| self.enforce_capacity()) {
            log::debug!("cache eviction failed: {err}");
        }
    }

    fn ttl(&self) -> Duration {
        self.config.ttl
    }

    fn stats(&self) -> CacheStats {
        let count = match self.entries() {
            Ok(entries) => entries.len(),
            Err(err) => {
                log::debug!("cannot list cache dir: {err}");
                0
            }
        };
        CacheStats {
            count,
            ttl: self.config.ttl,
            max_entries: self.config.max_entries,
            location: self.config.dir.display().to_string(),
        }
    }

    fn clear(&self) {
        match self.entries() {
            Ok(entries) => {
                for (path, _) in entries {
                    if let Err(err) = fs::remove_file(&path) {
                        log::error!("failed to remove {}: {err}", path.display());
                    }
                }
                log::debug!("cache cleared");
            }
            Err(err) => log::error!("failed to clear cache: {err}"),
        }
    }
}

/// In-process store with the same TTL and capacity behavior as [`FileChunkStore`].
///
/// Entries do not survive a restart. Insertion time stands in for file mtime.
pub struct MemoryChunkStore {
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, (CacheEntry, SystemTime)>>,
}

impl std::fmt::Debug for MemoryChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryChunkStore")
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}

impl MemoryChunkStore {
    /// Store with the given limits and the system clock.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self::with_clock(ttl, max_entries, Arc::new(SystemClock))
    }

    /// Store with an injected clock.
    #[must_use]
    pub fn with_clock(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            max_entries,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (CacheEntry, SystemTime)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sweep(&self, map: &mut HashMap<String, (CacheEntry, SystemTime)>) {
        let now = self.clock.now();
        map.retain(|_, (_, stored)| now.duration_since(*stored).unwrap_or_default() <= self.ttl);
        if map.len() > self.max_entries {
            let mut by_age: Vec<(SystemTime, String)> =
                map.iter().map(|(k, (_, t))| (*t, k.clone())).collect();
            by_age.sort();
            let excess = map.len() - self.max_entries;
            for (_, key) in by_age.into_iter().take(excess) {
                map.remove(&key);
            }
        }
    }
}

impl Default for MemoryChunkStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl ChunkStore for MemoryChunkStore {
    fn put(&self, source: &str, chunks: &[EditChunk]) -> String {
        let (key, source_hash) = cache_key(source);
        let now = self.clock.now();
        let entry = CacheEntry {
            chunks: chunks.to_vec(),
            timestamp: epoch_ms(now),
            source_hash,
        };
        let mut map = self.lock();
        map.insert(key.clone(), (entry, now));
        self.sweep(&mut map);
        key
    }

    fn get(&self, key: &str) -> Option<Vec<EditChunk>> {
        let mut map = self.lock();
        let (entry, _) = map.get(key)?;
        let age = epoch_ms(self.clock.now()).saturating_sub(entry.timestamp);
        if age > ttl_ms(self.ttl) {
            map.remove(key);
            return None;
        }
        Some(entry.chunks.clone())
    }

    fn evict(&self) {
        let mut map = self.lock();
        self.sweep(&mut map);
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            count: self.lock().len(),
            ttl: self.ttl,
            max_entries: self.max_entries,
            location: "memory".to_string(),
        }
    }

    fn clear(&self) {
        self.lock().clear();
    }
}
