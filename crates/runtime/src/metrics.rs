use std::collections::BTreeMap;

/// Counter and duration aggregation for engine diagnostics.
///
/// Sorted maps keep snapshots stable across runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    durations: BTreeMap<&'static str, DurationStats>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct DurationStats {
    pub count: u64,
    pub total_ms: u64,
    pub max_ms: u64,
}

impl DurationStats {
    pub fn record(&mut self, ms: u64) {
        self.count += 1;
        self.total_ms = self.total_ms.saturating_add(ms);
        self.max_ms = self.max_ms.max(ms);
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc(&mut self, name: &'static str) {
        self.add(name, 1);
    }

    pub fn add(&mut self, name: &'static str, by: u64) {
        *self.counters.entry(name).or_insert(0) += by;
    }

    pub fn record_duration(&mut self, name: &'static str, ms: u64) {
        self.durations.entry(name).or_default().record(ms);
    }

    pub fn duration(&self, name: &str) -> Option<DurationStats> {
        self.durations.get(name).copied()
    }

    /// Sorted `(name, value)` pairs for logs.
    pub fn counters(&self) -> Vec<(&'static str, u64)> {
        self.counters.iter().map(|(k, v)| (*k, *v)).collect()
    }
}
