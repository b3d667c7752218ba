use bytes::Bytes;
use std::collections::HashMap;

/// Lifetime and current-window counts for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterPair {
    pub total: u64,
    pub interval: u64,
}

/// One row of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCount {
    pub key: Bytes,
    pub total: u64,
    pub interval: u64,
}

/// Key to counter table.
///
/// Entries are created on first sight and never evicted, so memory grows with
/// the number of distinct keys seen during the run. Evicting would make the
/// reported totals wrong.
#[derive(Debug, Default)]
pub struct DnsQueryAggregator {
    counts: HashMap<Bytes, CounterPair>,
}

impl DnsQueryAggregator {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    pub fn increment(&mut self, key: Bytes) {
        let pair = self.counts.entry(key).or_default();
        pair.total += 1;
        pair.interval += 1;
    }

    /// Zeroes every interval counter. Totals are left alone.
    pub fn rollover(&mut self) {
        for pair in self.counts.values_mut() {
            pair.interval = 0;
        }
    }

    /// All entries, highest total first, ties ordered by key.
    pub fn snapshot(&self) -> Vec<QueryCount> {
        let mut rows: Vec<QueryCount> = self
            .counts
            .iter()
            .map(|(key, pair)| QueryCount {
                key: key.clone(),
                total: pair.total,
                interval: pair.interval,
            })
            .collect();

        rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
        rows
    }

    #[cfg(test)]
    pub fn get(&self, key: &[u8]) -> Option<CounterPair> {
        self.counts.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn total_count(&self) -> u64 {
        self.counts.values().map(|pair| pair.total).sum()
    }
}
