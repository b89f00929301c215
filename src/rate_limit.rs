use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::debug;

// Quota settings - limit per window, how many keys we remember
#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    pub limit: u32,
    pub window: Duration,
    pub max_tracked: usize,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            limit: 5,
            window: Duration::from_secs(60),
            max_tracked: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaOutcome {
    Granted { used: u32 },
    Exhausted { used: u32 },
}

impl QuotaOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, QuotaOutcome::Granted { .. })
    }
}

/// Per-client request counters.
///
/// `try_acquire` must compare and increment as one step per key, so two
/// callers for the same key can never both see room for the last slot.
pub trait QuotaStore: Send + Sync {
    fn try_acquire(&self, key: &str) -> QuotaOutcome;

    fn tracked(&self) -> usize;

    /// Drop idle entries. Returns how many were removed.
    fn purge_expired(&self) -> usize;
}

// Quota entry - tracks requests per client key
#[derive(Debug, Clone, Copy)]
pub struct ClientQuota {
    pub used: u32,
    pub expires_at: Instant, // pushed forward on every granted request
    pub last_seen: Instant,  // for eviction when the table is full
}

impl ClientQuota {
    fn fresh(now: Instant, window: Duration) -> Self {
        Self {
            used: 0,
            expires_at: now + window,
            last_seen: now,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

// In-memory store, one DashMap shard lock per key while counting
pub struct MemoryQuotaStore {
    entries: DashMap<String, ClientQuota>,
    policy: QuotaPolicy,
}

impl MemoryQuotaStore {
    pub fn new(policy: QuotaPolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
        }
    }

    // Called without holding any entry guard
    fn make_room(&self, now: Instant) {
        self.entries.retain(|_, q| !q.is_expired(now));
        if self.entries.len() < self.policy.max_tracked {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().last_seen)
            .map(|e| e.key().clone());

        if let Some(key) = oldest {
            debug!(client = %key, "quota table full, evicting least recent client");
            self.entries.remove(&key);
        }
    }
}

impl QuotaStore for MemoryQuotaStore {
    fn try_acquire(&self, key: &str) -> QuotaOutcome {
        let now = Instant::now();
        let window = self.policy.window;

        if !self.entries.contains_key(key) && self.entries.len() >= self.policy.max_tracked {
            self.make_room(now);
        }

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| ClientQuota::fresh(now, window));

        // idle too long? start over, never reuse the old count
        if entry.is_expired(now) {
            *entry = ClientQuota::fresh(now, window);
        }
        entry.last_seen = now;

        if entry.used >= self.policy.limit {
            return QuotaOutcome::Exhausted { used: entry.used };
        }

        entry.used += 1;
        entry.expires_at = now + window;
        QuotaOutcome::Granted { used: entry.used }
    }

    fn tracked(&self) -> usize {
        self.entries.len()
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, q| !q.is_expired(now));
        before.saturating_sub(self.entries.len())
    }
}

// Background sweep so idle clients do not pile up between requests
pub async fn quota_sweeper(store: Arc<dyn QuotaStore>, every: Duration) {
    let mut interval = interval(every);

    loop {
        interval.tick().await;
        let removed = store.purge_expired();
        crate::metrics::TRACKED_CLIENTS.set(store.tracked() as f64);
        if removed > 0 {
            debug!(removed, "swept expired client quotas");
        }
    }
}
