//! Two independent estimators of desired ring depth, derived from packet-arrival timegaps.
//!
//! Grounded on the teacher's `JitterBufferStats` (`audio/buffers/jitter_buffer.rs`), which
//! keeps a `Mutex<VecDeque<u64>>` latency window and derives an EMA from it; here the window
//! is kept as timestamped samples so two differently-sized windows (the too-many-starves
//! window and the shrink/reduction window) can both be queried from the same history.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Hard cap on how much history is retained regardless of the configured window sizes, so a
/// misconfigured (very large) window setting can't make this grow unbounded.
const MAX_RETENTION_SECONDS: u64 = 300;

fn ceil_div(n: u64, d: u64) -> u32 {
    if d == 0 {
        return 0;
    }
    (n.div_ceil(d)) as u32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGapStats {
    pub min_usec: u64,
    pub max_usec: u64,
    pub avg_usec: f64,
    pub stddev_usec: f64,
}

struct Inner {
    last_arrival_usec: Option<u64>,
    /// `(arrival_timestamp_usec, gap_usec_since_previous_arrival)`, oldest first.
    samples: VecDeque<(u64, u64)>,
}

pub struct JitterEstimator {
    inner: Mutex<Inner>,
}

impl Default for JitterEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl JitterEstimator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                last_arrival_usec: None,
                samples: VecDeque::new(),
            }),
        }
    }

    /// Records an accepted (non-duplicate) packet's arrival time, computing the timegap since
    /// the previous accepted arrival. The first call after construction or `reset()` only
    /// establishes the baseline and records no gap.
    pub fn record_arrival(&self, now_usec: u64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(last) = inner.last_arrival_usec {
            let gap = now_usec.saturating_sub(last);
            inner.samples.push_back((now_usec, gap));
        }
        inner.last_arrival_usec = Some(now_usec);

        let cutoff = now_usec.saturating_sub(MAX_RETENTION_SECONDS * 1_000_000);
        while let Some(&(ts, _)) = inner.samples.front() {
            if ts < cutoff {
                inner.samples.pop_front();
            } else {
                break;
            }
        }
    }

    fn gaps_in_window(inner: &Inner, now_usec: u64, window_seconds: u64) -> Vec<u64> {
        let cutoff = now_usec.saturating_sub(window_seconds * 1_000_000);
        inner
            .samples
            .iter()
            .filter(|&&(ts, _)| ts >= cutoff)
            .map(|&(_, gap)| gap)
            .collect()
    }

    /// F: the maximum observed timegap within `window_seconds`, converted to whole frames.
    pub fn max_gap_frames(&self, now_usec: u64, window_seconds: u64, frame_duration_usec: u64) -> u32 {
        let inner = self.inner.lock().unwrap();
        let gaps = Self::gaps_in_window(&inner, now_usec, window_seconds);
        let max_gap = gaps.into_iter().max().unwrap_or(0);
        ceil_div(max_gap, frame_duration_usec)
    }

    /// P: `num_stddevs` standard deviations above the mean timegap within `window_seconds`,
    /// converted to whole frames.
    pub fn stddev_gap_frames(
        &self,
        now_usec: u64,
        window_seconds: u64,
        frame_duration_usec: u64,
        num_stddevs: f64,
    ) -> u32 {
        let inner = self.inner.lock().unwrap();
        let gaps = Self::gaps_in_window(&inner, now_usec, window_seconds);
        if gaps.is_empty() {
            return 0;
        }
        let (mean, stddev) = mean_and_stddev(&gaps);
        let target_usec = mean + num_stddevs * stddev;
        ceil_div(target_usec.max(0.0).round() as u64, frame_duration_usec)
    }

    /// Timegap min/max/avg/stddev within `window_seconds`, for stats reporting. `None` if no
    /// gaps were recorded in the window.
    pub fn time_gap_stats(&self, now_usec: u64, window_seconds: u64) -> Option<TimeGapStats> {
        let inner = self.inner.lock().unwrap();
        let gaps = Self::gaps_in_window(&inner, now_usec, window_seconds);
        if gaps.is_empty() {
            return None;
        }
        let (mean, stddev) = mean_and_stddev(&gaps);
        Some(TimeGapStats {
            min_usec: *gaps.iter().min().unwrap(),
            max_usec: *gaps.iter().max().unwrap(),
            avg_usec: mean,
            stddev_usec: stddev,
        })
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.last_arrival_usec = None;
        inner.samples.clear();
    }
}

fn mean_and_stddev(values: &[u64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_arrival_records_no_gap() {
        let est = JitterEstimator::new();
        est.record_arrival(1_000_000);
        assert_eq!(est.max_gap_frames(1_000_000, 60, 20_000), 0);
    }

    #[test]
    fn max_gap_reflects_largest_observed_gap() {
        let est = JitterEstimator::new();
        est.record_arrival(0);
        est.record_arrival(20_000); // gap 20ms
        est.record_arrival(100_000); // gap 80ms
        let frames = est.max_gap_frames(100_000, 60, 20_000);
        assert_eq!(frames, 4); // ceil(80_000 / 20_000)
    }

    #[test]
    fn gaps_outside_window_are_excluded() {
        let est = JitterEstimator::new();
        est.record_arrival(0);
        est.record_arrival(200_000_000); // gap 200s, far outside a 60s window
        est.record_arrival(200_020_000); // gap 20ms, inside window relative to `now`
        let frames = est.max_gap_frames(200_020_000, 60, 20_000);
        assert_eq!(frames, 1);
    }

    #[test]
    fn stddev_estimator_grows_with_variance() {
        let est = JitterEstimator::new();
        let mut t = 0u64;
        est.record_arrival(t);
        for gap in [20_000, 20_000, 20_000, 100_000] {
            t += gap;
            est.record_arrival(t);
        }
        let frames = est.stddev_gap_frames(t, 60, 20_000, 3.0);
        assert!(frames > 1);
    }

    #[test]
    fn time_gap_stats_none_when_no_samples() {
        let est = JitterEstimator::new();
        assert!(est.time_gap_stats(0, 30).is_none());
    }

    #[test]
    fn reset_clears_history() {
        let est = JitterEstimator::new();
        est.record_arrival(0);
        est.record_arrival(50_000);
        est.reset();
        assert_eq!(est.max_gap_frames(50_000, 60, 20_000), 0);
        assert!(est.time_gap_stats(50_000, 60).is_none());
    }
}
