//! TTL cache for pending destructive operations.
//!
//! Each pending operation lives under its typed operation key with a
//! per-entry TTL; a companion per-subject marker (same TTL) lets the
//! coordinator reject a second `initiate` while one is live. Expiry is
//! the only cancellation mechanism; there is no explicit cancel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache;
use moka::Expiry;

use crate::confirm::{Dependent, OperationKey, Subject};

/// Frozen state of a pending destructive operation, exactly as minted at
/// initiation time. The dependent snapshot is never recomputed for an
/// existing key.
#[derive(Debug, Clone)]
pub struct PendingOperation {
    pub subject: Subject,
    pub dependents: Vec<Dependent>,
    pub issuer_token: String,
}

/// Cache value carrying its own expiry.
#[derive(Clone)]
struct Ttled<T> {
    value: T,
    ttl: Duration,
}

struct PerEntryTtl;

impl<T: Clone + Send + Sync + 'static> Expiry<String, Ttled<T>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Ttled<T>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Clone)]
pub struct OperationCache {
    ops: Cache<String, Ttled<Arc<PendingOperation>>>,
    pending: Cache<String, Ttled<String>>,
}

impl OperationCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            ops: Cache::builder()
                .max_capacity(capacity)
                .expire_after(PerEntryTtl)
                .build(),
            pending: Cache::builder()
                .max_capacity(capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Stores a pending operation under its key and marks its subject as
    /// locked for the same window.
    pub fn set(&self, key: &OperationKey, operation: PendingOperation, ttl: Duration) {
        let subject_key = operation.subject.pending_cache_key();
        self.ops.insert(
            key.cache_key(),
            Ttled {
                value: Arc::new(operation),
                ttl,
            },
        );
        self.pending.insert(
            subject_key,
            Ttled {
                value: key.cache_key(),
                ttl,
            },
        );
    }

    pub fn get(&self, key: &OperationKey) -> Option<Arc<PendingOperation>> {
        self.ops.get(&key.cache_key()).map(|e| e.value)
    }

    /// Consumes the entry: at most one caller can ever observe `Some` for
    /// a given key. Clears the subject marker alongside.
    pub fn take(&self, key: &OperationKey) -> Option<Arc<PendingOperation>> {
        let entry = self.ops.remove(&key.cache_key())?;
        self.pending
            .invalidate(&entry.value.subject.pending_cache_key());
        Some(entry.value)
    }

    pub fn delete(&self, key: &OperationKey) {
        if let Some(entry) = self.ops.remove(&key.cache_key()) {
            self.pending
                .invalidate(&entry.value.subject.pending_cache_key());
        }
    }

    /// Rendered operation key of the live pending operation for a subject,
    /// if any.
    pub fn pending_key_for(&self, subject: &Subject) -> Option<String> {
        self.pending
            .get(&subject.pending_cache_key())
            .map(|e| e.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::SubjectKind;

    fn pending_op(subject: &Subject) -> PendingOperation {
        PendingOperation {
            subject: subject.clone(),
            dependents: vec![Dependent {
                entity: "category_mapping".to_string(),
                id: "m1".to_string(),
                label: "comic c1".to_string(),
            }],
            issuer_token: "token-1".to_string(),
        }
    }

    #[test]
    fn test_set_get_take() {
        let cache = OperationCache::new(100);
        let subject = Subject::new(SubjectKind::Category, "cat-1");
        let key = OperationKey::mint(&subject);

        cache.set(&key, pending_op(&subject), Duration::from_secs(180));

        let got = cache.get(&key).unwrap();
        assert_eq!(got.issuer_token, "token-1");
        assert_eq!(got.dependents.len(), 1);

        // First take wins; second take observes nothing.
        assert!(cache.take(&key).is_some());
        assert!(cache.take(&key).is_none());
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_pending_marker_follows_operation() {
        let cache = OperationCache::new(100);
        let subject = Subject::new(SubjectKind::Comic, "c-1");
        let key = OperationKey::mint(&subject);

        assert!(cache.pending_key_for(&subject).is_none());

        cache.set(&key, pending_op(&subject), Duration::from_secs(180));
        assert_eq!(cache.pending_key_for(&subject), Some(key.to_string()));

        cache.take(&key);
        assert!(cache.pending_key_for(&subject).is_none());
    }

    #[test]
    fn test_delete_clears_both_entries() {
        let cache = OperationCache::new(100);
        let subject = Subject::new(SubjectKind::Season, "s-1");
        let key = OperationKey::mint(&subject);

        cache.set(&key, pending_op(&subject), Duration::from_secs(180));
        cache.delete(&key);

        assert!(cache.get(&key).is_none());
        assert!(cache.pending_key_for(&subject).is_none());
    }

    #[test]
    fn test_entries_expire() {
        let cache = OperationCache::new(100);
        let subject = Subject::new(SubjectKind::Episode, "e-1");
        let key = OperationKey::mint(&subject);

        cache.set(&key, pending_op(&subject), Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(50));

        assert!(cache.get(&key).is_none());
        assert!(cache.pending_key_for(&subject).is_none());
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        let cache = OperationCache::new(100);
        let s1 = Subject::new(SubjectKind::Category, "a");
        let s2 = Subject::new(SubjectKind::Category, "b");
        let k1 = OperationKey::mint(&s1);
        let k2 = OperationKey::mint(&s2);

        cache.set(&k1, pending_op(&s1), Duration::from_secs(180));
        cache.set(&k2, pending_op(&s2), Duration::from_secs(180));

        cache.take(&k1);
        assert!(cache.get(&k2).is_some());
    }
}
