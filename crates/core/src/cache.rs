use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Freshness window for assembled recommendations.
pub const RECOMMENDATION_TTL_MINUTES: i64 = 5;
/// Freshness window for the USD/KRW rate.
pub const FX_TTL_HOURS: i64 = 12;

#[derive(Debug, Clone)]
struct Entry<K, T> {
    key: K,
    value: T,
    stored_at: DateTime<Utc>,
}

/// Single-slot cache. A value is fresh while its key matches the caller's key
/// and it is younger than the TTL; stale values stay readable as a fallback.
#[derive(Debug)]
pub struct TimedCache<K, T> {
    ttl: Duration,
    slot: Mutex<Option<Entry<K, T>>>,
}

impl<K: PartialEq + Clone, T: Clone> TimedCache<K, T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn fresh(&self, key: &K, now: DateTime<Utc>) -> Option<T> {
        let slot = self.slot.lock();
        let entry = slot.as_ref()?;
        let age = now - entry.stored_at;
        (entry.key == *key && age >= Duration::zero() && age < self.ttl)
            .then(|| entry.value.clone())
    }

    /// Last stored value regardless of age or key.
    pub fn last(&self) -> Option<T> {
        self.slot.lock().as_ref().map(|e| e.value.clone())
    }

    pub fn store(&self, key: K, value: T, now: DateTime<Utc>) {
        *self.slot.lock() = Some(Entry {
            key,
            value,
            stored_at: now,
        });
    }
}
