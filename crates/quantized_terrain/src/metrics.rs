//! Provider statistics: tile outcomes and synthesis timings.
//!
//! Counters are lock-free and safe to bump from worker threads. Timings go
//! into a bounded rolling window behind a mutex.
//!
//! # Usage
//!
//! ```ignore
//! let snapshot = provider.metrics();
//! println!(
//!     "{} synthesized, {} busy, avg {:.1} µs",
//!     snapshot.synthesized, snapshot.busy, snapshot.synthesis_time_avg_us
//! );
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::Degradation;

/// Rolling window for storing recent values (e.g., timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  /// Push a new value, evicting the oldest if at capacity.
  pub fn push(&mut self, value: T) {
    if self.capacity == 0 {
      return;
    }
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  /// Oldest to newest.
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    self.buffer.iter()
  }

  pub fn last(&self) -> Option<&T> {
    self.buffer.back()
  }
}

impl RollingWindow<u64> {
  pub fn sum(&self) -> u64 {
    self.buffer.iter().sum()
  }

  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.sum() as f64 / self.buffer.len() as f64
    }
  }

  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = self.buffer.iter().min()?;
    let max = self.buffer.iter().max()?;
    Some((*min, *max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(256)
  }
}

/// Live counters shared by the provider and its workers.
#[derive(Debug, Default)]
pub struct ProviderMetrics {
  synthesized: AtomicU64,
  busy: AtomicU64,
  degraded: [AtomicU64; Degradation::ALL.len()],
  synthesis_time_us: Mutex<RollingWindow<u64>>,
}

impl ProviderMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  /// A tile was synthesized at full fidelity in `elapsed_us`.
  pub fn record_synthesized(&self, elapsed_us: u64) {
    self.synthesized.fetch_add(1, Ordering::Relaxed);
    if let Ok(mut window) = self.synthesis_time_us.lock() {
      window.push(elapsed_us);
    }
  }

  pub fn record_busy(&self) {
    self.busy.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_degradation(&self, kind: Degradation) {
    self.degraded[kind.index()].fetch_add(1, Ordering::Relaxed);
  }

  pub fn degradations(&self, kind: Degradation) -> u64 {
    self.degraded[kind.index()].load(Ordering::Relaxed)
  }

  pub fn snapshot(&self) -> MetricsSnapshot {
    let (average, min_max, samples) = match self.synthesis_time_us.lock() {
      Ok(window) => (window.average(), window.min_max(), window.len()),
      Err(_) => (0.0, None, 0),
    };
    MetricsSnapshot {
      synthesized: self.synthesized.load(Ordering::Relaxed),
      busy: self.busy.load(Ordering::Relaxed),
      degraded: Degradation::ALL.map(|kind| self.degradations(kind)),
      synthesis_time_avg_us: average,
      synthesis_time_min_max_us: min_max,
      timing_samples: samples,
    }
  }
}

/// Point-in-time copy of [`ProviderMetrics`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricsSnapshot {
  pub synthesized: u64,
  pub busy: u64,
  /// Indexed by [`Degradation::index`].
  pub degraded: [u64; Degradation::ALL.len()],
  pub synthesis_time_avg_us: f64,
  pub synthesis_time_min_max_us: Option<(u64, u64)>,
  pub timing_samples: usize,
}

impl MetricsSnapshot {
  pub fn degradations(&self, kind: Degradation) -> u64 {
    self.degraded[kind.index()]
  }

  /// Placeholder tiles delivered, all causes.
  pub fn total_degraded(&self) -> u64 {
    self.degraded.iter().sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rolling_window_evicts_oldest() {
    let mut window = RollingWindow::new(3);
    for v in [10u64, 20, 30, 40] {
      window.push(v);
    }
    assert_eq!(window.len(), 3);
    assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![20, 30, 40]);
    assert_eq!(window.sum(), 90);
    assert_eq!(window.average(), 30.0);
    assert_eq!(window.min_max(), Some((20, 40)));
    assert_eq!(window.last(), Some(&40));
  }

  #[test]
  fn test_empty_window() {
    let window = RollingWindow::<u64>::default();
    assert!(window.is_empty());
    assert_eq!(window.average(), 0.0);
    assert_eq!(window.min_max(), None);
  }

  #[test]
  fn test_counters_and_snapshot() {
    let metrics = ProviderMetrics::new();
    metrics.record_synthesized(120);
    metrics.record_synthesized(80);
    metrics.record_busy();
    metrics.record_degradation(Degradation::SourceUnavailable);
    metrics.record_degradation(Degradation::SourceUnavailable);
    metrics.record_degradation(Degradation::WorkerFailure);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.synthesized, 2);
    assert_eq!(snapshot.busy, 1);
    assert_eq!(snapshot.degradations(Degradation::SourceUnavailable), 2);
    assert_eq!(snapshot.degradations(Degradation::WorkerFailure), 1);
    assert_eq!(snapshot.degradations(Degradation::TileTooWide), 0);
    assert_eq!(snapshot.total_degraded(), 3);
    assert_eq!(snapshot.synthesis_time_avg_us, 100.0);
    assert_eq!(snapshot.synthesis_time_min_max_us, Some((80, 120)));
  }
}
