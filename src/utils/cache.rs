//! Caching utilities for ryt-decipher

use crate::platform::cipher::OperationPlan;
use crate::platform::player::PlayerRelease;
use moka::future::Cache;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default lifetime of a cached operation plan
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Plan and signature timestamp extracted from one player release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub plan: OperationPlan,
    pub signature_timestamp: String,
    pub expires_at: Instant,
}

struct CacheSlot {
    release: PlayerRelease,
    entry: CacheEntry,
}

/// Single-slot, TTL-bounded cache of the most recently extracted plan.
///
/// A hit requires the same release to be requested again before expiry;
/// storing a plan for another release replaces the previous one.
pub struct DecipherCache {
    slot: Mutex<Option<CacheSlot>>,
    ttl: Duration,
}

impl DecipherCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live entry for `release`, if any
    pub fn get(&self, release: &PlayerRelease) -> Option<CacheEntry> {
        self.get_at(release, Instant::now())
    }

    /// Like [`get`](Self::get) with an explicit clock
    pub fn get_at(&self, release: &PlayerRelease, now: Instant) -> Option<CacheEntry> {
        let slot = self.lock();
        match slot.as_ref() {
            Some(cached) if cached.release == *release && cached.entry.expires_at > now => {
                Some(cached.entry.clone())
            }
            _ => None,
        }
    }

    /// Store a plan for `release`, expiring one TTL from now
    pub fn set(
        &self,
        release: PlayerRelease,
        plan: OperationPlan,
        signature_timestamp: String,
    ) -> CacheEntry {
        let expires_at = Instant::now() + self.ttl;
        self.set_with_expiry(release, plan, signature_timestamp, expires_at)
    }

    /// Store a plan with an explicit expiry time
    pub fn set_with_expiry(
        &self,
        release: PlayerRelease,
        plan: OperationPlan,
        signature_timestamp: String,
        expires_at: Instant,
    ) -> CacheEntry {
        let entry = CacheEntry {
            plan,
            signature_timestamp,
            expires_at,
        };

        let mut slot = self.lock();
        if let Some(previous) = slot.as_ref().filter(|cached| cached.release != release) {
            debug!("Replacing cached plan for {} with {}", previous.release, release);
        }
        *slot = Some(CacheSlot {
            release,
            entry: entry.clone(),
        });
        entry
    }

    /// Release currently held in the slot, expired or not
    pub fn cached_release(&self) -> Option<PlayerRelease> {
        self.lock().as_ref().map(|cached| cached.release.clone())
    }

    /// Drop the cached plan
    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> MutexGuard<'_, Option<CacheSlot>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DecipherCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

/// High-performance async cache using moka
pub type AsyncCache<K, V> = Cache<K, V>;

/// Create a new async cache with TTL and max capacity
pub fn new_async_cache_with_capacity<K, V>(ttl: Duration, max_capacity: u64) -> AsyncCache<K, V>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .time_to_live(ttl)
        .max_capacity(max_capacity)
        .build()
}
