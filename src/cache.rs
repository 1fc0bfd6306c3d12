//! Owned caches for the layers around the generators.
//!
//! [`TtlCache`] keeps recently fetched values in memory and reads time from
//! an injected [`Clock`]. [`ResponseCache`] keeps rendered PNG bytes on disk
//! under a hash of the request parameters.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: DashMap<K, (Instant, V)>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the value if it was stored less than one TTL ago.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.entries
            .remove_if(key, |_, (stored, _)| now.duration_since(*stored) >= self.ttl);
        self.entries.get(key).map(|entry| entry.value().1.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        self.entries
            .retain(|_, (stored, _)| now.duration_since(*stored) < self.ttl);
        self.entries.insert(key, (now, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub const DEFAULT_RESPONSE_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// PNG bytes on disk, fresh for `max_age` after they were written.
///
/// I/O failures are logged and treated as misses.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    max_age: Duration,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Hex blake3 digest of the JSON form of `params`.
    pub fn key<P: Serialize + ?Sized>(params: &P) -> String {
        let json = serde_json::to_vec(params).unwrap_or_default();
        hex::encode(blake3::hash(&json).as_bytes())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.png"))
    }

    pub fn get<P: Serialize + ?Sized>(&self, params: &P) -> Option<Vec<u8>> {
        let path = self.path_for(&Self::key(params));
        let modified = fs::metadata(&path).and_then(|meta| meta.modified()).ok()?;
        let age = modified.elapsed().unwrap_or_default();
        if age >= self.max_age {
            debug!(path = %path.display(), "cached response expired");
            return None;
        }
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cache read failed");
                None
            }
        }
    }

    /// Stores `bytes` under the key for `params`, first dropping expired entries.
    pub fn put<P: Serialize + ?Sized>(&self, params: &P, bytes: &[u8]) {
        let pruned = self.prune_expired();
        if pruned > 0 {
            debug!(dir = %self.dir.display(), pruned, "removed expired responses");
        }
        let path = self.path_for(&Self::key(params));
        let written = fs::create_dir_all(&self.dir).and_then(|()| fs::write(&path, bytes));
        if let Err(err) = written {
            warn!(path = %path.display(), error = %err, "cache write failed");
        }
    }

    /// Removes cached PNGs older than `max_age` and returns how many went.
    pub fn prune_expired(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "png") {
                continue;
            }
            let expired = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .map(|modified| modified.elapsed().unwrap_or_default() >= self.max_age)
                .unwrap_or(false);
            if !expired {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) => warn!(path = %path.display(), error = %err, "cache prune failed"),
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn entries_expire_after_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(600), clock.clone());
        cache.insert("jdoe".to_string(), 7);
        clock.advance(Duration::from_secs(599));
        assert_eq!(cache.get(&"jdoe".to_string()), Some(7));
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"jdoe".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_evicts_stale_entries() {
        let clock = Arc::new(ManualClock::new());
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(10), clock.clone());
        cache.insert("a", 1);
        clock.advance(Duration::from_secs(20));
        cache.insert("b", 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn response_keys_depend_on_every_param() {
        let a = ResponseCache::key(&json!({"type": "skills", "username": "jdoe", "theme": "dark"}));
        let b = ResponseCache::key(&json!({"type": "skills", "username": "jdoe", "theme": "light"}));
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(a, ResponseCache::key(&json!({"type": "skills", "username": "jdoe", "theme": "dark"})));
    }

    #[test]
    fn response_cache_round_trip_and_expiry() {
        let dir = TempDir::new().unwrap();
        let params = json!({"type": "badge", "username": "jdoe"});

        let fresh = ResponseCache::new(dir.path(), DEFAULT_RESPONSE_MAX_AGE);
        assert_eq!(fresh.get(&params), None);
        fresh.put(&params, b"png-bytes");
        assert_eq!(fresh.get(&params).as_deref(), Some(&b"png-bytes"[..]));

        let stale = ResponseCache::new(dir.path(), Duration::ZERO);
        assert_eq!(stale.get(&params), None);
    }

    #[test]
    fn put_prunes_expired_responses() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::ZERO);
        cache.put(&json!({"username": "a"}), b"a");
        cache.put(&json!({"username": "b"}), b"b");
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.iter().filter(|name| name.ends_with(".png")).count(), 1);
        assert!(names.contains(&format!("{}.png", ResponseCache::key(&json!({"username": "b"})))));

        assert_eq!(cache.prune_expired(), 1);
        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(ResponseCache::new(dir.path(), Duration::ZERO).prune_expired(), 0);
    }

    #[test]
    fn shared_cache_serves_many_threads() {
        let cache: Arc<TtlCache<u32, u32>> =
            Arc::new(TtlCache::new(Duration::from_secs(60), Arc::new(SystemClock)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.insert(i, i * 10);
                    cache.get(&i)
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), Some(i as u32 * 10));
        }
        assert_eq!(cache.len(), 8);
    }
}
