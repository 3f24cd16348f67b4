//! Starvation bookkeeping: counts starves, retains their timestamps for the too-many-starves
//! window, and latches `is_starved` until the ring catches back up to the target depth.
//!
//! Grounded on the teacher's `JitterBufferStats.latency_window: Mutex<VecDeque<u64>>` plus its
//! `adjust_target_latency` grow-on-loss branch (`audio/buffers/jitter_buffer.rs`), generalized
//! from a loss-rate EMA to an explicit bounded history so `count_in_window` can be evaluated
//! against a runtime-configurable window size.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

pub struct StarveController {
    starve_count: AtomicU64,
    is_starved: AtomicBool,
    history: Mutex<VecDeque<u64>>,
}

impl Default for StarveController {
    fn default() -> Self {
        Self::new()
    }
}

impl StarveController {
    pub fn new() -> Self {
        Self {
            starve_count: AtomicU64::new(0),
            is_starved: AtomicBool::new(false),
            history: Mutex::new(VecDeque::new()),
        }
    }

    pub fn starve_count(&self) -> u64 {
        self.starve_count.load(Ordering::Relaxed)
    }

    pub fn is_starved(&self) -> bool {
        self.is_starved.load(Ordering::Relaxed)
    }

    /// Records a starve at `now_usec`. Latches `is_starved`; the caller clears it again via
    /// [`Self::clear_if_caught_up`] once depth recovers. `window_seconds` is the
    /// too-many-starves window (SPEC_FULL §3's `windowSecondsForDesiredCalcOnTooManyStarves`):
    /// the history is pruned to that window here, at write time, rather than left to grow
    /// until `count_in_window` happens to filter it out.
    pub fn record_starve(&self, now_usec: u64, window_seconds: u64) {
        self.starve_count.fetch_add(1, Ordering::Relaxed);
        self.is_starved.store(true, Ordering::Relaxed);

        let mut history = self.history.lock().unwrap();
        history.push_back(now_usec);
        let cutoff = now_usec.saturating_sub(window_seconds * 1_000_000);
        while let Some(&oldest) = history.front() {
            if oldest < cutoff {
                history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of starves recorded within `window_seconds` of `now_usec`.
    pub fn count_in_window(&self, now_usec: u64, window_seconds: u64) -> u32 {
        let cutoff = now_usec.saturating_sub(window_seconds * 1_000_000);
        let history = self.history.lock().unwrap();
        history.iter().filter(|&&ts| ts >= cutoff).count() as u32
    }

    /// Forces `is_starved = true` regardless of current depth (consumer-driven signal that
    /// playback has gone silent for reasons outside this stream's own pop accounting).
    pub fn set_starved(&self) {
        self.is_starved.store(true, Ordering::Relaxed);
    }

    /// Clears the starved latch once the ring has caught back up to `desired_frames`.
    pub fn clear_if_caught_up(&self, frames_available: u32, desired_frames: u32) {
        if frames_available >= desired_frames {
            self.is_starved.store(false, Ordering::Relaxed);
        }
    }

    pub fn reset_stats(&self) {
        self.starve_count.store(0, Ordering::Relaxed);
        self.is_starved.store(false, Ordering::Relaxed);
        self.history.lock().unwrap().clear();
    }
}
