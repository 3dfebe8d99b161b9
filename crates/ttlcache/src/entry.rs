//! Cached entry and its expiry deadline

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Absolute expiry time of an entry.
///
/// A TTL too large to add to `now` yields a deadline that never passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// Deadline `ttl` after `now`, saturating to "never"
    pub fn after(now: Instant, ttl: Duration) -> Self {
        match now.checked_add(ttl) {
            Some(at) => Deadline(Some(at)),
            None => Self::never(),
        }
    }

    /// A deadline that never passes
    pub const fn never() -> Self {
        Deadline(None)
    }

    /// True once `now` has reached the deadline
    pub fn has_passed(&self, now: Instant) -> bool {
        matches!(self.0, Some(at) if at <= now)
    }
}

pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: Arc<V>,
    pub(crate) expires_at: Deadline,
    hits: AtomicU32,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: Arc<V>, expires_at: Deadline) -> Self {
        Self {
            key,
            value,
            expires_at,
            hits: AtomicU32::new(0),
        }
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.has_passed(now)
    }

    /// Count one access; returns the count including this one
    pub(crate) fn record_hit(&self) -> u32 {
        self.hits.fetch_add(1, Ordering::Relaxed).saturating_add(1)
    }

    pub(crate) fn reset_hits(&self) {
        self.hits.store(0, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn hits(&self) -> u32 {
        self.hits.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_passes() {
        let now = Instant::now();
        let deadline = Deadline::after(now, Duration::from_millis(10));

        assert!(!deadline.has_passed(now));
        assert!(deadline.has_passed(now + Duration::from_millis(10)));
        assert!(deadline.has_passed(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_deadline_saturates() {
        let now = Instant::now();
        let deadline = Deadline::after(now, Duration::MAX);

        assert_eq!(deadline, Deadline::never());
        assert!(!deadline.has_passed(now + Duration::from_secs(86_400 * 365)));
    }

    #[test]
    fn test_entry_hits() {
        let entry = Entry::new("k", Arc::new(1), Deadline::never());

        assert_eq!(entry.record_hit(), 1);
        assert_eq!(entry.record_hit(), 2);
        entry.reset_hits();
        assert_eq!(entry.hits(), 0);
        assert_eq!(entry.record_hit(), 1);
    }
}
