/// In-process profile cache.
///
/// A read accelerator in front of the store, nothing more: entries expire
/// lazily after 30 minutes, capacity is bounded with LRU eviction, and a
/// miss always falls through to Postgres. Owned by `AppState` and passed
/// around explicitly; there is no global instance.
///
/// All methods are synchronous under a single `std::sync::Mutex`. Critical
/// sections only touch in-memory maps, so holding the lock across them is
/// cheap and nothing awaits while holding it.
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::models::profile::ProfileRecord;

pub const CACHE_TTL_MINUTES: i64 = 30;
pub const CACHE_CAPACITY: usize = 100;
/// Profiles older than this want re-analysis; distinct from the in-memory TTL.
pub const STALE_AFTER_DAYS: i64 = 7;
const MOST_ACCESSED_LIMIT: usize = 5;

struct CacheEntry {
    record: ProfileRecord,
    cached_at: DateTime<Utc>,
    access_count: u64,
    last_accessed_at: DateTime<Utc>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<Uuid, CacheEntry>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub hit_rate_approx: f64,
    pub most_accessed: Vec<MostAccessed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MostAccessed {
    pub profile_id: Uuid,
    pub access_count: u64,
}

pub struct ProfileCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::with_capacity(CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner.lock().expect("profile cache mutex poisoned")
    }

    pub fn get(&self, id: Uuid) -> Option<ProfileRecord> {
        self.get_at(id, Utc::now())
    }

    /// Clock-explicit variant used by tests.
    pub(crate) fn get_at(&self, id: Uuid, now: DateTime<Utc>) -> Option<ProfileRecord> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get(&id) {
            Some(entry) => now - entry.cached_at > Duration::minutes(CACHE_TTL_MINUTES),
            None => {
                inner.misses += 1;
                return None;
            }
        };

        if expired {
            inner.entries.remove(&id);
            inner.misses += 1;
            debug!("Cache entry for profile {id} expired");
            return None;
        }

        inner.hits += 1;
        inner.entries.get_mut(&id).map(|entry| {
            entry.access_count += 1;
            entry.last_accessed_at = now;
            entry.record.clone()
        })
    }

    pub fn set(&self, id: Uuid, record: ProfileRecord) {
        self.set_at(id, record, Utc::now())
    }

    pub(crate) fn set_at(&self, id: Uuid, record: ProfileRecord, now: DateTime<Utc>) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        // Replacing an existing id never needs an eviction.
        if !inner.entries.contains_key(&id) {
            while inner.entries.len() >= self.capacity {
                let victim = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_accessed_at)
                    .map(|(victim_id, _)| *victim_id);
                match victim {
                    Some(victim_id) => {
                        inner.entries.remove(&victim_id);
                        debug!("Evicted least-recently-used profile {victim_id} from cache");
                    }
                    None => break,
                }
            }
        }

        inner.entries.insert(
            id,
            CacheEntry {
                record,
                cached_at: now,
                access_count: 0,
                last_accessed_at: now,
            },
        );
    }

    pub fn delete(&self, id: Uuid) -> bool {
        self.lock().entries.remove(&id).is_some()
    }

    /// Drops every cached profile belonging to an owner. Used on deletes and
    /// bulk re-imports so stale voices never serve another request.
    pub fn clear_for_owner(&self, owner_id: Uuid) -> usize {
        let mut guard = self.lock();
        let before = guard.entries.len();
        guard.entries.retain(|_, entry| entry.record.owner_id != owner_id);
        before - guard.entries.len()
    }

    /// Sweeps expired entries eagerly. Expiration is otherwise lazy, so a
    /// periodic sweep keeps abandoned profiles from squatting on capacity.
    pub fn clear_expired(&self) -> usize {
        self.clear_expired_at(Utc::now())
    }

    pub(crate) fn clear_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut guard = self.lock();
        let before = guard.entries.len();
        guard
            .entries
            .retain(|_, entry| now - entry.cached_at <= Duration::minutes(CACHE_TTL_MINUTES));
        let removed = before - guard.entries.len();
        if removed > 0 {
            debug!("Swept {removed} expired profile cache entries");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let guard = self.lock();
        let lookups = guard.hits + guard.misses;
        let hit_rate_approx = if lookups == 0 {
            0.0
        } else {
            guard.hits as f64 / lookups as f64
        };

        let mut most_accessed: Vec<MostAccessed> = guard
            .entries
            .iter()
            .map(|(id, entry)| MostAccessed {
                profile_id: *id,
                access_count: entry.access_count,
            })
            .collect();
        most_accessed.sort_by(|a, b| b.access_count.cmp(&a.access_count));
        most_accessed.truncate(MOST_ACCESSED_LIMIT);

        CacheStats {
            size: guard.entries.len(),
            hit_rate_approx,
            most_accessed,
        }
    }
}

/// Whether a stored profile is due for re-analysis: never analyzed, or the
/// last analysis is older than `STALE_AFTER_DAYS`.
pub fn needs_refresh(record: &ProfileRecord) -> bool {
    needs_refresh_at(record, Utc::now())
}

pub(crate) fn needs_refresh_at(record: &ProfileRecord, now: DateTime<Utc>) -> bool {
    match record.last_analyzed_at {
        None => true,
        Some(analyzed_at) => now - analyzed_at > Duration::days(STALE_AFTER_DAYS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::test_fixtures::make_record;

    fn t0() -> DateTime<Utc> {
        "2026-03-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_hit_within_ttl_miss_after() {
        let cache = ProfileCache::new();
        let record = make_record(Uuid::new_v4());
        let id = record.id;
        cache.set_at(id, record, t0());

        // exactly at the boundary is still fresh; expiry is strictly greater
        let at_boundary = t0() + Duration::minutes(30);
        assert!(cache.get_at(id, at_boundary).is_some());

        let past_boundary = t0() + Duration::minutes(31);
        assert!(cache.get_at(id, past_boundary).is_none());
        // lazy expiry actually removed the entry
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_get_updates_access_count() {
        let cache = ProfileCache::new();
        let record = make_record(Uuid::new_v4());
        let id = record.id;
        cache.set_at(id, record, t0());

        for minute in 1..=3 {
            cache.get_at(id, t0() + Duration::minutes(minute));
        }

        let stats = cache.stats();
        assert_eq!(stats.most_accessed.len(), 1);
        assert_eq!(stats.most_accessed[0].profile_id, id);
        assert_eq!(stats.most_accessed[0].access_count, 3);
    }

    #[test]
    fn test_eviction_picks_oldest_last_access() {
        let cache = ProfileCache::with_capacity(3);
        let records: Vec<_> = (0..3).map(|_| make_record(Uuid::new_v4())).collect();
        for (i, record) in records.iter().enumerate() {
            cache.set_at(record.id, record.clone(), t0() + Duration::seconds(i as i64));
        }

        // touch the first two later; the third becomes LRU
        cache.get_at(records[0].id, t0() + Duration::minutes(5));
        cache.get_at(records[1].id, t0() + Duration::minutes(6));

        let newcomer = make_record(Uuid::new_v4());
        cache.set_at(newcomer.id, newcomer.clone(), t0() + Duration::minutes(7));

        assert_eq!(cache.stats().size, 3);
        assert!(cache.get_at(records[2].id, t0() + Duration::minutes(8)).is_none());
        assert!(cache.get_at(records[0].id, t0() + Duration::minutes(8)).is_some());
        assert!(cache.get_at(newcomer.id, t0() + Duration::minutes(8)).is_some());
    }

    #[test]
    fn test_default_capacity_holds_one_hundred() {
        let cache = ProfileCache::new();
        let mut first_id = None;
        for i in 0..101 {
            let record = make_record(Uuid::new_v4());
            first_id.get_or_insert(record.id);
            cache.set_at(record.id, record, t0() + Duration::seconds(i));
        }
        assert_eq!(cache.stats().size, CACHE_CAPACITY);
        // the very first insert was never accessed again, so it was the victim
        assert!(cache
            .get_at(first_id.unwrap(), t0() + Duration::seconds(200))
            .is_none());
    }

    #[test]
    fn test_replacing_existing_id_does_not_evict() {
        let cache = ProfileCache::with_capacity(2);
        let a = make_record(Uuid::new_v4());
        let b = make_record(Uuid::new_v4());
        cache.set_at(a.id, a.clone(), t0());
        cache.set_at(b.id, b.clone(), t0() + Duration::seconds(1));

        // overwrite `a` while at capacity
        cache.set_at(a.id, a.clone(), t0() + Duration::seconds(2));

        assert_eq!(cache.stats().size, 2);
        assert!(cache.get_at(b.id, t0() + Duration::seconds(3)).is_some());
    }

    #[test]
    fn test_hit_rate_reflects_lookups() {
        let cache = ProfileCache::new();
        let record = make_record(Uuid::new_v4());
        let id = record.id;

        assert_eq!(cache.stats().hit_rate_approx, 0.0);

        cache.set_at(id, record, t0());
        cache.get_at(id, t0() + Duration::minutes(1));
        cache.get_at(id, t0() + Duration::minutes(2));
        cache.get_at(Uuid::new_v4(), t0() + Duration::minutes(3));

        let stats = cache.stats();
        assert!((stats.hit_rate_approx - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_delete_removes_entry() {
        let cache = ProfileCache::new();
        let record = make_record(Uuid::new_v4());
        let id = record.id;
        cache.set_at(id, record, t0());

        assert!(cache.delete(id));
        assert!(!cache.delete(id));
        assert!(cache.get_at(id, t0()).is_none());
    }

    #[test]
    fn test_clear_for_owner_scopes_by_owner() {
        let cache = ProfileCache::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        for _ in 0..3 {
            let record = make_record(alice);
            cache.set_at(record.id, record, t0());
        }
        let bobs = make_record(bob);
        cache.set_at(bobs.id, bobs.clone(), t0());

        assert_eq!(cache.clear_for_owner(alice), 3);
        assert_eq!(cache.stats().size, 1);
        assert!(cache.get_at(bobs.id, t0() + Duration::minutes(1)).is_some());
    }

    #[test]
    fn test_clear_expired_sweeps_only_stale_entries() {
        let cache = ProfileCache::new();
        let old = make_record(Uuid::new_v4());
        let fresh = make_record(Uuid::new_v4());
        cache.set_at(old.id, old, t0());
        cache.set_at(fresh.id, fresh.clone(), t0() + Duration::minutes(25));

        let removed = cache.clear_expired_at(t0() + Duration::minutes(40));
        assert_eq!(removed, 1);
        assert_eq!(cache.stats().size, 1);
        assert!(cache
            .get_at(fresh.id, t0() + Duration::minutes(41))
            .is_some());
    }

    #[test]
    fn test_most_accessed_caps_at_five() {
        let cache = ProfileCache::new();
        for i in 0..6u32 {
            let record = make_record(Uuid::new_v4());
            let id = record.id;
            cache.set_at(id, record, t0());
            for j in 0..=i {
                cache.get_at(id, t0() + Duration::seconds(i64::from(i * 10 + j)));
            }
        }

        let stats = cache.stats();
        assert_eq!(stats.most_accessed.len(), 5);
        // sorted by access count descending; the least-touched entry fell off
        assert_eq!(stats.most_accessed[0].access_count, 6);
        assert_eq!(stats.most_accessed[4].access_count, 2);
    }

    #[test]
    fn test_needs_refresh_rules() {
        let mut record = make_record(Uuid::new_v4());

        record.last_analyzed_at = None;
        assert!(needs_refresh_at(&record, t0()));

        record.last_analyzed_at = Some(t0() - Duration::days(8));
        assert!(needs_refresh_at(&record, t0()));

        record.last_analyzed_at = Some(t0() - Duration::days(2));
        assert!(!needs_refresh_at(&record, t0()));
    }
}
