//! Keyed snapshot cache with explicit TTLs
//!
//! The cache is constructed with an injected clock so tests control time
//! instead of sleeping. Expired entries are kept until overwritten, which
//! lets callers fall back to the last good value when a recompute fails.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time, used everywhere outside tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

/// Process-local cache of computed snapshots
pub struct SnapshotCache<T> {
    entries: Mutex<HashMap<String, Entry<T>>>,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> SnapshotCache<T> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Cache backed by the system clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Returns the cached value and whether it is still fresh. A stale
    /// value is still returned so callers can degrade to it on failure.
    pub fn get(&self, key: &str) -> Option<(T, bool)> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries.get(key).map(|entry| {
            let fresh = self.clock.now() < entry.expires_at;
            (entry.value.clone(), fresh)
        })
    }

    pub fn set(&self, key: &str, value: T, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(key.to_string(), Entry { value, expires_at });
    }
}

/// Clocks for tests; kept in the library so integration tests can inject
/// time instead of sleeping through real TTLs.
pub mod test_support {
    use super::*;

    /// Clock advanced by hand from tests
    pub struct ManualClock {
        current: Mutex<Instant>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                current: Mutex::new(Instant::now()),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut current = self.current.lock().unwrap();
            *current += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.current.lock().unwrap()
        }
    }
}
