//! Provider Liveness Cache
//!
//! Remembers whether each provider answered its availability probe, for a
//! short TTL. Each provider has its own slot; the check, the probe and the
//! store happen under that slot's lock, so concurrent callers probe a
//! provider at most once per expiry and never see a half-written entry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lexbrief_llm::ModelProvider;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct LivenessEntry {
    available: bool,
    checked_at: Instant,
}

type Slot = Arc<Mutex<Option<LivenessEntry>>>;

/// Process-wide availability cache keyed by provider name.
#[derive(Debug)]
pub struct LivenessCache {
    ttl: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl LivenessCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    async fn slot(&self, name: &str) -> Slot {
        let mut slots = self.slots.lock().await;
        slots.entry(name.to_string()).or_default().clone()
    }

    fn fresh(&self, entry: Option<LivenessEntry>) -> Option<bool> {
        entry
            .filter(|entry| entry.checked_at.elapsed() < self.ttl)
            .map(|entry| entry.available)
    }

    /// Cached availability, probing the provider when the entry is missing or stale.
    pub async fn is_available(&self, provider: &dyn ModelProvider) -> bool {
        let name = provider.name();
        let slot = self.slot(name).await;
        let mut entry = slot.lock().await;
        if let Some(available) = self.fresh(*entry) {
            return available;
        }

        let available = provider.is_available().await;
        debug!(provider = %name, available, "Probed provider liveness");
        *entry = Some(LivenessEntry {
            available,
            checked_at: Instant::now(),
        });
        available
    }

    /// Fresh cached value, if any. Waits for a probe in progress.
    pub async fn cached(&self, name: &str) -> Option<bool> {
        let slot = self.slot(name).await;
        let entry = slot.lock().await;
        self.fresh(*entry)
    }

    /// Overwrite the entry for a provider.
    pub async fn record(&self, name: &str, available: bool) {
        let slot = self.slot(name).await;
        *slot.lock().await = Some(LivenessEntry {
            available,
            checked_at: Instant::now(),
        });
    }
}
