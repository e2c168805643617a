//! In-memory cache of tokens that already passed signature and claim checks.
//!
//! Entries are keyed by the SHA-256 digest of the raw token, so the cache
//! never holds credentials. Expiry is checked lazily on lookup.
use std::{
    num::NonZeroUsize,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use lru::LruCache;
use tokio::time::Instant;

use crate::services::auth::claims::Claims;

#[derive(Debug)]
struct CacheEntry {
    claims: Arc<Claims>,
    expires_at: Instant,
}

/// Counters for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
}

/// Bounded, TTL-limited verification cache.
///
/// A hit means "this exact token was fully verified within the TTL window";
/// it says nothing about which routes the token may reach.
#[derive(Debug)]
pub struct VerificationCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl VerificationCache {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Claims of a previously verified token, unless absent or expired.
    pub fn lookup(&self, token: &str) -> Option<Arc<Claims>> {
        let key = cache_key(token);
        let now = Instant::now();
        let mut entries = self.lock();

        let cached = entries
            .get(&key)
            .map(|entry| (entry.expires_at, Arc::clone(&entry.claims)));

        match cached {
            Some((expires_at, claims)) if expires_at > now => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(claims)
            }
            Some(_) => {
                // Stale entries are dropped, never served.
                entries.pop(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Remember `token` as verified.
    ///
    /// The entry lives for the configured TTL, or until the token's own `exp`
    /// if that comes first. Already-expired tokens are not stored.
    pub fn store(&self, token: &str, claims: Arc<Claims>) {
        let Some(left) = claims.remaining_lifetime(chrono::Utc::now().timestamp()) else {
            return;
        };
        let lifetime = left.min(self.ttl);
        if lifetime.is_zero() {
            return;
        }

        let key = cache_key(token);
        let entry = CacheEntry {
            claims,
            expires_at: Instant::now() + lifetime,
        };

        let mut entries = self.lock();
        if let Some((old_key, _)) = entries.push(key.clone(), entry)
            && old_key != key
        {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            len: self.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn cache_key(token: &str) -> String {
    use base64::Engine as _;
    use sha2::{Digest, Sha256};

    let digest = Sha256::digest(token.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}
