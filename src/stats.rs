//! Read-only stats snapshot exposed to the timer thread.

/// A point-in-time snapshot of an [`crate::stream::InboundStream`]'s health, as returned by
/// `get_audio_stream_stats`. All counters are monotonically non-decreasing for the lifetime of
/// the stream (a `reset()` starts a new lifetime and zeroes them).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioStreamStats {
    pub desired_frames: u32,
    pub frames_available: u32,
    pub frames_available_avg: f64,
    pub starve_count: u64,
    pub silent_frames_dropped: u64,
    pub overflow_count: u64,
    pub old_frames_dropped: u64,
    pub packets_received: u64,
    pub time_gap_min_usec: Option<u64>,
    pub time_gap_max_usec: Option<u64>,
    pub time_gap_avg_usec: Option<f64>,
    pub time_gap_stddev_usec: Option<f64>,
}
