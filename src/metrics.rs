//! Dispatch counters and engine latency percentiles.
//! Counters are lock-free; latency samples live in a fixed ring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

/// Fixed-capacity ring buffer for latency samples (microseconds).
struct SampleRing {
    samples: Vec<f64>,
    pos: usize,
    count: usize,
}

impl SampleRing {
    fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)],
            pos: 0,
            count: 0,
        }
    }

    fn push(&mut self, value: f64) {
        let capacity = self.samples.len();
        self.samples[self.pos] = value;
        self.pos = (self.pos + 1) % capacity;
        if self.count < capacity {
            self.count += 1;
        }
    }

    fn percentile(&self, p: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mut sorted = self.samples[..self.count].to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let idx = ((p / 100.0) * (self.count as f64 - 1.0)).round() as usize;
        sorted[idx.min(self.count - 1)]
    }
}

pub struct DispatchMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    engine_calls: AtomicU64,
    reinstalls: AtomicU64,
    unchanged_outputs: AtomicU64,
    failures: AtomicU64,
    engine_latency: Mutex<SampleRing>,
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            engine_calls: AtomicU64::new(0),
            reinstalls: AtomicU64::new(0),
            unchanged_outputs: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            engine_latency: Mutex::new(SampleRing::new(256)),
        }
    }

    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn engine_call(&self, elapsed: Duration) {
        self.engine_calls.fetch_add(1, Ordering::Relaxed);
        let elapsed_us = elapsed.as_micros() as f64;
        self.engine_latency.lock().push(elapsed_us);
        tracing::debug!(elapsed_us, "engine_call_recorded");
    }

    pub fn reinstall(&self) {
        self.reinstalls.fetch_add(1, Ordering::Relaxed);
    }

    /// Engine returned text judged identical to the input.
    pub fn unchanged_output(&self) {
        self.unchanged_outputs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let ring = self.engine_latency.lock();
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            engine_calls: self.engine_calls.load(Ordering::Relaxed),
            reinstalls: self.reinstalls.load(Ordering::Relaxed),
            unchanged_outputs: self.unchanged_outputs.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            engine_p50_us: ring.percentile(50.0),
            engine_p95_us: ring.percentile(95.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub engine_calls: u64,
    pub reinstalls: u64,
    pub unchanged_outputs: u64,
    pub failures: u64,
    pub engine_p50_us: f64,
    pub engine_p95_us: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let m = DispatchMetrics::new();
        m.cache_hit();
        m.cache_miss();
        m.cache_miss();
        m.reinstall();
        let s = m.snapshot();
        assert_eq!((s.cache_hits, s.cache_misses, s.reinstalls), (1, 2, 1));
        assert_eq!(s.engine_calls, 0);
        assert_eq!(s.engine_p50_us, 0.0);
    }

    #[test]
    fn latency_percentiles() {
        let m = DispatchMetrics::new();
        for ms in 1..=100u64 {
            m.engine_call(Duration::from_millis(ms));
        }
        let s = m.snapshot();
        assert_eq!(s.engine_calls, 100);
        // index round(0.5 * 99) = 50 → 51 ms
        assert_eq!(s.engine_p50_us, 51_000.0);
        assert!(s.engine_p95_us >= 95_000.0);
    }

    #[test]
    fn ring_overwrites_oldest() {
        let mut ring = SampleRing::new(2);
        ring.push(1.0);
        ring.push(2.0);
        ring.push(3.0);
        assert_eq!(ring.percentile(0.0), 2.0);
        assert_eq!(ring.percentile(100.0), 3.0);
    }
}
