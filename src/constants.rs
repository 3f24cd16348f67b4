//! Crate-wide constants. Mirrors the wire-visible constants an `AudioStreamStats` snapshot
//! is computed from, plus the internal thresholds the sequence tracker and estimators use.

/// Added to an estimator's output before it is allowed to raise `desired_frames`.
pub const DESIRED_JITTER_BUFFER_FRAMES_PADDING: u32 = 1;

/// Width of the rolling window the 30-second packet-arrival stats (timegap min/max/avg/stddev
/// reported in `AudioStreamStats`) are computed over.
pub const STATS_FOR_STATS_PACKET_WINDOW_SECONDS: u64 = 30;

/// `current_jitter_buffer_frames` is refreshed from a time-weighted average of
/// `frames_available` sampled on this cadence.
pub const FRAMES_AVAILABLE_STAT_WINDOW_USECS: u64 = 2_000_000;

/// Default total frame capacity of a newly constructed ring buffer.
pub const INBOUND_RING_BUFFER_FRAME_CAPACITY: usize = 100;

/// Multiplier applied to the timegap standard deviation by the P estimator.
pub const NUM_STDDEVS_FOR_DESIRED_JITTER: f64 = 3.0;

/// A sequence-number distance beyond this is classified UNREASONABLE rather than
/// EARLY/LATE, forcing a resync.
pub const MAX_REASONABLE_SEQ_GAP: u32 = 1000;
