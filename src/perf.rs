// Per-tick latency sampling and percentile reporting
// Strictly an observer; never blocks the simulation loop

use std::time::Duration;
use tracing::info;

pub struct PerformanceTracker {
    latencies_ns: Vec<u64>,
    wall_time: Duration,
}

impl PerformanceTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            latencies_ns: Vec::with_capacity(capacity),
            wall_time: Duration::ZERO,
        }
    }

    pub fn record_latency(&mut self, ns: u64) {
        self.latencies_ns.push(ns);
    }

    pub fn set_wall_time(&mut self, wall: Duration) {
        self.wall_time = wall;
    }

    pub fn events(&self) -> usize {
        self.latencies_ns.len()
    }

    /// Latency at quantile `p` in [0, 1], from a sorted copy of the samples
    /// indexed at floor(p * (N - 1)). 0 with no samples.
    pub fn percentile(&self, p: f64) -> u64 {
        if self.latencies_ns.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies_ns.clone();
        sorted.sort_unstable();
        let idx = (p * (sorted.len() - 1) as f64).floor() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    /// Events per wall-clock second
    pub fn throughput(&self) -> f64 {
        let secs = self.wall_time.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.latencies_ns.len() as f64 / secs
    }

    pub fn report(&self) {
        info!(
            events = self.events(),
            p50_ns = self.percentile(0.50),
            p90_ns = self.percentile(0.90),
            p99_ns = self.percentile(0.99),
            p999_ns = self.percentile(0.999),
            throughput_eps = self.throughput(),
            "tick latency"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentiles_on_known_samples() {
        let mut perf = PerformanceTracker::new(100);
        // Insert 1..=100 shuffled enough to prove sorting happens
        for ns in (1..=100).rev() {
            perf.record_latency(ns);
        }

        assert_eq!(perf.percentile(0.0), 1);
        assert_eq!(perf.percentile(1.0), 100);
        // floor(0.5 * 99) = 49 -> the 50th smallest sample
        assert_eq!(perf.percentile(0.50), 50);
        assert_eq!(perf.percentile(0.99), 99);
    }

    #[test]
    fn test_empty_tracker_reports_zero() {
        let perf = PerformanceTracker::new(8);
        assert_eq!(perf.percentile(0.5), 0);
        assert_eq!(perf.throughput(), 0.0);
    }

    #[test]
    fn test_throughput() {
        let mut perf = PerformanceTracker::new(4);
        for _ in 0..10 {
            perf.record_latency(1_000);
        }
        perf.set_wall_time(Duration::from_secs(2));
        assert!((perf.throughput() - 5.0).abs() < 1e-9);
    }
}
