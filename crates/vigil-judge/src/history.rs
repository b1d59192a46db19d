use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use vigil_common::types::{HistoryEntry, MetricSample};

/// Shared handle to one series window. The window carries its own lock so
/// snapshot readers never touch the shard map.
pub type SeriesHandle = Arc<RwLock<SeriesWindow>>;

/// Bounded newest-first buffer of samples for a single series.
pub struct SeriesWindow {
    cap: usize,
    entries: VecDeque<HistoryEntry>,
}

impl SeriesWindow {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: VecDeque::with_capacity(cap),
        }
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.cap);
    }

    /// Copies the newest `n` entries. `enough` is false when the window
    /// holds fewer than `n`.
    pub fn snapshot(&self, n: usize) -> (Vec<HistoryEntry>, bool) {
        let take = n.min(self.entries.len());
        let copied = self.entries.iter().take(take).copied().collect();
        (copied, self.entries.len() >= n)
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().copied().collect()
    }

    pub fn newest(&self) -> Option<HistoryEntry> {
        self.entries.front().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Shard {
    series: RwLock<HashMap<String, SeriesHandle>>,
}

/// Sharded map from series fingerprint to its window. Per-sample work is
/// dominated by a single shard acquisition.
pub struct HistoryStore {
    shards: Vec<Shard>,
    max_history: usize,
}

impl HistoryStore {
    pub fn new(shard_count: usize, max_history: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Shard {
                series: RwLock::new(HashMap::new()),
            })
            .collect();
        Self {
            shards,
            max_history: max_history.max(1),
        }
    }

    // Fingerprints are lowercase hex; the leading byte spreads series over
    // all 256 buckets.
    fn shard(&self, key: &str) -> &Shard {
        let idx = key
            .get(..2)
            .and_then(|prefix| u8::from_str_radix(prefix, 16).ok())
            .unwrap_or(0) as usize;
        &self.shards[idx % self.shards.len()]
    }

    /// Appends the sample to its series window, creating the window on
    /// first sight, and returns the handle.
    pub fn push(&self, sample: &MetricSample) -> SeriesHandle {
        let key = sample.primary_key();
        self.push_keyed(&key, sample)
    }

    /// Same as [`push`](Self::push) for callers that already computed the
    /// fingerprint.
    pub fn push_keyed(&self, key: &str, sample: &MetricSample) -> SeriesHandle {
        let shard = self.shard(key);
        let handle = {
            let existing = shard.series.read().get(key).cloned();
            match existing {
                Some(handle) => handle,
                None => shard
                    .series
                    .write()
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(RwLock::new(SeriesWindow::new(self.max_history))))
                    .clone(),
            }
        };
        handle.write().push(HistoryEntry {
            timestamp: sample.timestamp,
            value: sample.value,
        });
        handle
    }

    pub fn get(&self, key: &str) -> Option<SeriesHandle> {
        self.shard(key).series.read().get(key).cloned()
    }

    pub fn series_count(&self) -> usize {
        self.shards.iter().map(|s| s.series.read().len()).sum()
    }

    /// Removes series whose newest entry is older than `now - ttl`.
    /// Returns the number of evicted series.
    pub fn sweep_stale(&self, now: i64, ttl: i64) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            let mut series = shard.series.write();
            let before = series.len();
            series.retain(|_, handle| {
                handle
                    .read()
                    .newest()
                    .is_some_and(|entry| entry.timestamp >= now - ttl)
            });
            removed += before - series.len();
        }
        removed
    }
}
