//! `InboundStream`: the stream-front orchestrator tying the ring buffer, sequence tracker,
//! jitter estimator, starve controller, and depth policy together into the single entity a
//! network receiver and a mixer/consumer actually talk to.
//!
//! Grounded on the teacher's `network/receive.rs` (one stream-like object per remote host,
//! behind a small set of operations the producer/consumer/timer threads call) and
//! `audio/buffers/jitter_buffer.rs` (the same three-thread contract: producer pushes, consumer
//! pulls, a periodic callback recomputes target depth).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::capability::StreamProperties;
use crate::constants::STATS_FOR_STATS_PACKET_WINDOW_SECONDS;
use crate::depth_policy;
use crate::jitter_estimator::JitterEstimator;
use crate::sequence_tracker::{SequenceClass, SequenceTracker};
use crate::settings::{EstimatorMode, Settings};
use crate::starve_controller::StarveController;
use crate::stats::AudioStreamStats;

const HEADER_LEN: usize = 3;

struct FramesAvgState {
    last_update_usec: Option<u64>,
    avg: Option<f64>,
}

/// An inbound audio stream from one remote sender: parses arriving packets into a jitter
/// buffer and serves frame/sample pops to a local consumer.
///
/// Generic over `P` so the wire format's properties sub-header (if any) is pluggable without
/// dynamic dispatch or a base-class hierarchy (SPEC_FULL §4.9).
pub struct InboundStream<P: StreamProperties> {
    properties: P,
    frame_sample_count: usize,
    frame_capacity: u32,
    frame_duration_usec: u64,

    ring: crate::ring_buffer::RingBuffer<i16>,
    seq_tracker: Mutex<SequenceTracker>,
    jitter: JitterEstimator,
    starve: StarveController,
    settings: Mutex<Settings>,

    desired_frames: AtomicU32,
    has_started: AtomicBool,
    packets_received: AtomicU64,
    silent_frames_dropped: AtomicU64,
    old_frames_dropped: AtomicU64,

    /// Ring offsets of silence placeholders written to cover a loss gap, keyed by the missing
    /// sequence number, so a later LATE packet can still write its real data back in.
    pending_fills: Mutex<HashMap<u16, u64>>,
    frames_available_avg: Mutex<FramesAvgState>,
}

impl<P: StreamProperties> InboundStream<P> {
    /// Builds a new stream. Fails only on construction-time misconfiguration (SPEC_FULL §7):
    /// `frame_sample_count` and `frame_capacity` must both be at least 1.
    ///
    /// `frame_duration_usec` is the wall-clock duration one frame represents; it depends on
    /// the sample rate the wire format negotiates, which this crate does not itself decode
    /// (see DESIGN.md) — the caller supplies it once the first packet has told it the rate.
    pub fn new(
        properties: P,
        frame_sample_count: usize,
        frame_capacity: u32,
        frame_duration_usec: u64,
        settings: Settings,
    ) -> Result<Self> {
        if frame_sample_count < 1 {
            bail!("frame_sample_count must be at least 1");
        }
        if frame_capacity < 1 {
            bail!("frame_capacity must be at least 1");
        }

        let desired_frames = depth_policy::static_desired_frames(&settings, frame_capacity);

        Ok(Self {
            properties,
            frame_sample_count,
            frame_capacity,
            frame_duration_usec,
            ring: crate::ring_buffer::RingBuffer::new(frame_sample_count, frame_capacity as usize),
            seq_tracker: Mutex::new(SequenceTracker::new()),
            jitter: JitterEstimator::new(),
            starve: StarveController::new(),
            settings: Mutex::new(settings),
            desired_frames: AtomicU32::new(desired_frames),
            has_started: AtomicBool::new(false),
            packets_received: AtomicU64::new(0),
            silent_frames_dropped: AtomicU64::new(0),
            old_frames_dropped: AtomicU64::new(0),
            pending_fills: Mutex::new(HashMap::new()),
            frames_available_avg: Mutex::new(FramesAvgState {
                last_update_usec: None,
                avg: None,
            }),
        })
    }

    // ---- producer: parseData -------------------------------------------------------------

    /// Parses one arriving packet, updating the ring, sequence tracker, and jitter estimator.
    /// Returns the number of bytes consumed. Never fails: every malformed-input path is a
    /// counted, non-fatal condition (SPEC_FULL §7).
    pub fn parse_data(&self, packet: &[u8], now_usec: u64) -> usize {
        if packet.len() < HEADER_LEN {
            return 0;
        }
        let packet_type = packet[0];
        let seq = u16::from_le_bytes([packet[1], packet[2]]);
        let payload = &packet[HEADER_LEN..];

        self.packets_received.fetch_add(1, Ordering::Relaxed);

        let class = self.seq_tracker.lock().unwrap().classify(seq);

        match class {
            SequenceClass::Unreasonable => {
                warn!(seq, "unreasonable sequence jump, resyncing stream");
                self.reset();
                HEADER_LEN
            }
            SequenceClass::Duplicate => packet.len(),
            SequenceClass::Late { behind_by } => {
                self.handle_late(packet_type, payload, seq, behind_by);
                packet.len()
            }
            SequenceClass::OnTime => {
                self.accept(packet_type, payload, seq, 0, now_usec);
                packet.len()
            }
            SequenceClass::Early { gap } => {
                self.accept(packet_type, payload, seq, gap, now_usec);
                packet.len()
            }
        }
    }

    fn accept(&self, packet_type: u8, payload: &[u8], seq: u16, gap: u32, now_usec: u64) {
        let parsed = match self.properties.parse_stream_properties(packet_type, payload) {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "malformed stream properties, discarding packet tail");
                return;
            }
        };

        if gap > 0 {
            let missing_start = seq.wrapping_sub(gap as u16);
            self.write_loss_fill(missing_start, gap, parsed.num_audio_samples);
        }

        let data_payload = &payload[parsed.payload_offset..];
        let samples = match self.properties.parse_audio_data(
            packet_type,
            data_payload,
            parsed.num_audio_samples,
        ) {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, "malformed audio data, discarding packet tail");
                return;
            }
        };

        self.ring.write_samples(&samples);
        self.jitter.record_arrival(now_usec);
        self.recompute_growth(now_usec);
        self.trim_if_over_budget();
        self.update_frames_available_avg(now_usec);
    }

    /// Loss-fill for `gap` missing sequence numbers starting at `missing_start`, each worth
    /// `num_audio_samples` silent samples (SPEC_FULL §4.6 "Loss fill").
    ///
    /// Before the first `frames_available_avg` measurement exists there's nothing to compare
    /// the ring depth against, so gaps are always filled in full — the "droppable silents"
    /// elision only kicks in once a real average is established (degrades gracefully when the
    /// per-second tick isn't being driven, per SPEC_FULL §4.8).
    fn write_loss_fill(&self, missing_start: u16, gap: u32, num_audio_samples: usize) {
        let avg = self.frames_available_avg.lock().unwrap().avg;

        for i in 0..gap {
            let missing_seq = missing_start.wrapping_add(i as u16);
            let frames_available = self.ring.frames_available();
            let comfortably_full = match avg {
                Some(avg) => frames_available as f64 > avg,
                None => false,
            };

            if comfortably_full {
                self.silent_frames_dropped
                    .fetch_add(num_audio_samples as u64, Ordering::Relaxed);
                continue;
            }

            let offset = self.ring.write_cursor();
            self.ring.write_silent(num_audio_samples);
            self.pending_fills.lock().unwrap().insert(missing_seq, offset);
        }
    }

    fn handle_late(&self, packet_type: u8, payload: &[u8], seq: u16, behind_by: u32) {
        let parsed = match self.properties.parse_stream_properties(packet_type, payload) {
            Ok(p) => p,
            Err(_) => return,
        };
        let data_payload = &payload[parsed.payload_offset..];
        let samples = match self.properties.parse_audio_data(
            packet_type,
            data_payload,
            parsed.num_audio_samples,
        ) {
            Ok(s) => s,
            Err(_) => return,
        };

        let offset = self.pending_fills.lock().unwrap().remove(&seq);
        let landed = match offset {
            Some(off) => self.ring.write_at_offset(off, &samples),
            None => false,
        };

        if !landed {
            debug!(seq, behind_by, "late packet has no addressable slot, dropping");
        }
    }

    fn compute_candidate_frames(&self, now_usec: u64, settings: &Settings) -> u32 {
        match settings.estimator_mode {
            EstimatorMode::MaxGap => self.jitter.max_gap_frames(
                now_usec,
                settings.window_seconds_for_desired_calc_on_too_many_starves,
                self.frame_duration_usec,
            ),
            EstimatorMode::StdDev => self.jitter.stddev_gap_frames(
                now_usec,
                settings.window_seconds_for_desired_calc_on_too_many_starves,
                self.frame_duration_usec,
                crate::constants::NUM_STDDEVS_FOR_DESIRED_JITTER,
            ),
        }
    }

    fn recompute_growth(&self, now_usec: u64) {
        let settings = *self.settings.lock().unwrap();
        let too_many = self.starve.count_in_window(
            now_usec,
            settings.window_seconds_for_desired_calc_on_too_many_starves,
        ) >= settings.window_starve_threshold;
        let candidate = self.compute_candidate_frames(now_usec, &settings);
        let new_desired = depth_policy::recompute_on_growth(
            &settings,
            self.frame_capacity,
            self.desired_frames.load(Ordering::Relaxed),
            too_many,
            candidate,
        );
        if new_desired != self.desired_frames.swap(new_desired, Ordering::Relaxed) {
            info!(new_desired, "desired_frames raised");
        }
    }

    fn trim_if_over_budget(&self) {
        let settings = *self.settings.lock().unwrap();
        let desired = self.desired_frames.load(Ordering::Relaxed);
        let limit = desired + settings.max_frames_over_desired;
        if self.ring.frames_available() > limit {
            let dropped = self.ring.drop_oldest_frames_to(desired);
            if dropped > 0 {
                self.old_frames_dropped
                    .fetch_add(dropped as u64, Ordering::Relaxed);
            }
        }
    }

    fn update_frames_available_avg(&self, now_usec: u64) {
        let current = self.ring.frames_available() as f64;
        let mut state = self.frames_available_avg.lock().unwrap();
        match (state.avg, state.last_update_usec) {
            (None, _) => {
                state.avg = Some(current);
            }
            (Some(avg), Some(last)) => {
                let elapsed = now_usec.saturating_sub(last) as f64;
                let window = crate::constants::FRAMES_AVAILABLE_STAT_WINDOW_USECS as f64;
                let alpha = (elapsed / window).min(1.0);
                state.avg = Some(avg + alpha * (current - avg));
            }
            (Some(_), None) => unreachable!("avg is only Some once last_update_usec is Some"),
        }
        state.last_update_usec = Some(now_usec);
    }

    // ---- consumer: pops, starve signalling ------------------------------------------------

    pub fn pop_frames(
        &self,
        max_frames: u32,
        all_or_nothing: bool,
        starve_if_no_frames_popped: bool,
        now_usec: u64,
    ) -> u32 {
        let available = self.ring.frames_available();
        if all_or_nothing && available < max_frames {
            self.on_empty_pop(starve_if_no_frames_popped, now_usec);
            return 0;
        }

        let popped = self.ring.pop_frames(max_frames);
        if popped == 0 {
            self.on_empty_pop(starve_if_no_frames_popped, now_usec);
        } else {
            self.on_successful_pop();
        }
        popped
    }

    pub fn pop_samples(
        &self,
        max_samples: usize,
        all_or_nothing: bool,
        starve_if_no_samples_popped: bool,
        now_usec: u64,
    ) -> Vec<i16> {
        let available = self.ring.samples_available();
        if all_or_nothing && available < max_samples {
            self.on_empty_pop(starve_if_no_samples_popped, now_usec);
            return Vec::new();
        }

        let popped = self.ring.pop_samples(max_samples);
        if popped.is_empty() {
            self.on_empty_pop(starve_if_no_samples_popped, now_usec);
        } else {
            self.on_successful_pop();
        }
        popped
    }

    fn on_empty_pop(&self, starve_if_empty: bool, now_usec: u64) {
        if starve_if_empty {
            let window = self
                .settings
                .lock()
                .unwrap()
                .window_seconds_for_desired_calc_on_too_many_starves;
            self.starve.record_starve(now_usec, window);
            self.recompute_growth(now_usec);
        }
    }

    fn on_successful_pop(&self) {
        self.has_started.store(true, Ordering::Relaxed);
        self.starve.clear_if_caught_up(
            self.ring.frames_available(),
            self.desired_frames.load(Ordering::Relaxed),
        );
    }

    pub fn last_pop_succeeded(&self) -> bool {
        self.ring.last_pop_succeeded()
    }

    pub fn last_pop_output(&self) -> Vec<i16> {
        self.ring.last_pop_output()
    }

    /// Forces the starved latch regardless of current depth (e.g. the consumer played silence
    /// for a reason outside this stream's own pop accounting).
    pub fn set_to_starved(&self) {
        self.starve.set_starved();
    }

    // ---- lifecycle --------------------------------------------------------------------

    /// Drops all buffered frames without resetting any stats counters.
    pub fn clear_buffer(&self) {
        self.ring.clear();
    }

    /// Zeroes every stats counter (packets, drops, overflow, sequence/starve/jitter history)
    /// without touching currently buffered audio.
    pub fn reset_stats(&self) {
        self.packets_received.store(0, Ordering::Relaxed);
        self.silent_frames_dropped.store(0, Ordering::Relaxed);
        self.old_frames_dropped.store(0, Ordering::Relaxed);
        self.ring.reset_overflow_count();
        self.seq_tracker.lock().unwrap().reset_stats();
        self.starve.reset_stats();
        self.jitter.reset();
        self.pending_fills.lock().unwrap().clear();
        let mut state = self.frames_available_avg.lock().unwrap();
        state.avg = None;
        state.last_update_usec = None;
    }

    /// Clears the buffer, resets stats, and resyncs the sequence baseline — the full
    /// escape-hatch reset used both explicitly and on an unreasonable sequence jump.
    pub fn reset(&self) {
        self.ring.reset();
        self.reset_stats();
        self.seq_tracker.lock().unwrap().reset();
        self.has_started.store(false, Ordering::Relaxed);
        let settings = *self.settings.lock().unwrap();
        self.desired_frames.store(
            depth_policy::static_desired_frames(&settings, self.frame_capacity),
            Ordering::Relaxed,
        );
    }

    // ---- settings -----------------------------------------------------------------------

    pub fn settings(&self) -> Settings {
        *self.settings.lock().unwrap()
    }

    pub fn set_settings(&self, settings: Settings) {
        *self.settings.lock().unwrap() = settings;
    }

    pub fn set_max_frames_over_desired(&self, value: u32) {
        self.settings.lock().unwrap().set_max_frames_over_desired(value);
    }

    pub fn set_dynamic_jitter_buffers(&self, value: bool) {
        self.settings.lock().unwrap().set_dynamic_jitter_buffers(value);
    }

    pub fn set_static_desired_jitter_buffer_frames(&self, value: u32) {
        self.settings
            .lock()
            .unwrap()
            .set_static_desired_jitter_buffer_frames(value);
    }

    pub fn set_use_std_dev(&self, value: bool) {
        self.settings.lock().unwrap().set_use_std_dev(value);
    }

    pub fn set_window_starve_threshold(&self, value: u32) {
        self.settings.lock().unwrap().set_window_starve_threshold(value);
    }

    pub fn set_window_seconds_for_desired_calc_on_too_many_starves(&self, value: u64) {
        self.settings
            .lock()
            .unwrap()
            .set_window_seconds_for_desired_calc_on_too_many_starves(value);
    }

    pub fn set_window_seconds_for_desired_reduction(&self, value: u64) {
        self.settings
            .lock()
            .unwrap()
            .set_window_seconds_for_desired_reduction(value);
    }

    // ---- timer: per-second tick -----------------------------------------------------------

    /// Recomputes both estimators, applies `DepthPolicy`'s growth-or-shrink rule, and
    /// refreshes the time-weighted `frames_available_avg` stat. Meant to be called roughly
    /// once per second by a dedicated timer thread; the ring and static mode keep functioning
    /// without it, only dynamic adaptation degrades (SPEC_FULL §4.8).
    pub fn per_second_tick(&self, now_usec: u64) {
        let settings = *self.settings.lock().unwrap();
        let too_many = self.starve.count_in_window(
            now_usec,
            settings.window_seconds_for_desired_calc_on_too_many_starves,
        ) >= settings.window_starve_threshold;
        let candidate = self.compute_candidate_frames(now_usec, &settings);
        let shrink_candidate = self.jitter.max_gap_frames(
            now_usec,
            settings.window_seconds_for_desired_reduction,
            self.frame_duration_usec,
        );

        let new_desired = depth_policy::recompute_on_tick(
            &settings,
            self.frame_capacity,
            self.desired_frames.load(Ordering::Relaxed),
            too_many,
            candidate,
            shrink_candidate,
        );
        self.desired_frames.store(new_desired, Ordering::Relaxed);
        self.starve
            .clear_if_caught_up(self.ring.frames_available(), new_desired);
        self.update_frames_available_avg(now_usec);
    }

    // ---- stats snapshot -------------------------------------------------------------------

    pub fn desired_frames(&self) -> u32 {
        self.desired_frames.load(Ordering::Relaxed)
    }

    pub fn frames_available(&self) -> u32 {
        self.ring.frames_available()
    }

    pub fn is_starved(&self) -> bool {
        self.starve.is_starved()
    }

    pub fn has_started(&self) -> bool {
        self.has_started.load(Ordering::Relaxed)
    }

    pub fn get_audio_stream_stats(&self, now_usec: u64) -> AudioStreamStats {
        let gap_stats = self
            .jitter
            .time_gap_stats(now_usec, STATS_FOR_STATS_PACKET_WINDOW_SECONDS);

        AudioStreamStats {
            desired_frames: self.desired_frames(),
            frames_available: self.ring.frames_available(),
            frames_available_avg: self.frames_available_avg.lock().unwrap().avg.unwrap_or(0.0),
            starve_count: self.starve.starve_count(),
            silent_frames_dropped: self.silent_frames_dropped.load(Ordering::Relaxed),
            overflow_count: self.ring.overflow_count(),
            old_frames_dropped: self.old_frames_dropped.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            time_gap_min_usec: gap_stats.map(|g| g.min_usec),
            time_gap_max_usec: gap_stats.map(|g| g.max_usec),
            time_gap_avg_usec: gap_stats.map(|g| g.avg_usec),
            time_gap_stddev_usec: gap_stats.map(|g| g.stddev_usec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::PcmStreamProperties;
    use proptest::prelude::*;

    fn packet(seq: u16, samples: &[i16]) -> Vec<u8> {
        let mut v = Vec::with_capacity(HEADER_LEN + samples.len() * 2);
        v.push(0); // packet_type, unused by PcmStreamProperties
        v.extend_from_slice(&seq.to_le_bytes());
        for s in samples {
            v.extend_from_slice(&s.to_le_bytes());
        }
        v
    }

    fn frame_of(seq: u16, frame_sample_count: usize) -> Vec<i16> {
        vec![seq as i16; frame_sample_count]
    }

    fn new_stream(settings: Settings, frame_sample_count: usize, frame_capacity: u32) -> InboundStream<PcmStreamProperties> {
        InboundStream::new(
            PcmStreamProperties,
            frame_sample_count,
            frame_capacity,
            1000,
            settings,
        )
        .unwrap()
    }

    #[test]
    fn construction_rejects_zero_frame_sample_count() {
        let err = InboundStream::new(PcmStreamProperties, 0, 10, 1000, Settings::default());
        assert!(err.is_err());
    }

    #[test]
    fn construction_rejects_zero_frame_capacity() {
        let err = InboundStream::new(PcmStreamProperties, 240, 0, 1000, Settings::default());
        assert!(err.is_err());
    }

    /// Scenario 1: lossless in-order, static depth.
    #[test]
    fn scenario_lossless_in_order_static() {
        let settings = Settings {
            dynamic_jitter_buffers: false,
            static_desired_jitter_buffer_frames: 1,
            ..Settings::default()
        };
        let stream = new_stream(settings, 240, 100);

        let mut t = 0u64;
        for seq in 0u16..10 {
            let data = frame_of(seq, 240);
            stream.parse_data(&packet(seq, &data), t);
            t += 5_000;
        }

        for expected in 0u16..10 {
            let popped = stream.pop_frames(1, false, true, t);
            assert_eq!(popped, 1);
            assert_eq!(stream.last_pop_output()[0], expected as i16);
            t += 5_000;
        }

        let stats = stream.get_audio_stream_stats(t);
        assert_eq!(stats.starve_count, 0);
        assert_eq!(stats.silent_frames_dropped, 0);
    }

    /// Scenario 2: a single packet loss. By the time it arrives, `frames_available_avg` has
    /// already settled close to the buffer's steady depth, so the ring reads as "comfortably
    /// full" and the loss-fill is dropped rather than written (the `silentFramesDropped`
    /// branch of SPEC_FULL §4.6's loss-fill rule).
    #[test]
    fn scenario_single_packet_loss_is_dropped_once_comfortably_full() {
        let stream = new_stream(Settings::default(), 240, 100);
        stream.parse_data(&packet(0, &frame_of(0, 240)), 0);
        stream.parse_data(&packet(1, &frame_of(1, 240)), 1_000);
        assert_eq!(stream.frames_available(), 2);

        stream.parse_data(&packet(3, &frame_of(3, 240)), 2_000); // seq 2 lost

        assert_eq!(stream.frames_available(), 3); // only the real frame 3 was added
        let stats = stream.get_audio_stream_stats(2_000);
        assert_eq!(stats.silent_frames_dropped, 240);
    }

    /// Scenario 3: a duplicate packet is discarded; final content matches the no-duplicate
    /// case.
    #[test]
    fn scenario_duplicate_packet_is_discarded() {
        let stream = new_stream(Settings::default(), 4, 100);
        stream.parse_data(&packet(0, &frame_of(0, 4)), 0);
        stream.parse_data(&packet(1, &frame_of(1, 4)), 1_000);
        stream.parse_data(&packet(1, &frame_of(1, 4)), 1_500); // duplicate
        stream.parse_data(&packet(2, &frame_of(2, 4)), 2_000);

        assert_eq!(stream.frames_available(), 3);
        let stats = stream.get_audio_stream_stats(2_000);
        assert_eq!(stats.packets_received, 4);

        for expected in 0u16..3 {
            stream.pop_frames(1, false, true, 2_000);
            assert_eq!(stream.last_pop_output()[0], expected as i16);
        }
    }

    /// Scenario 4: reorder within window. `0,2,1,3` arrives; the late packet's still-silent
    /// placeholder gets written back, so the consumer observes `0,1,2,3`.
    #[test]
    fn scenario_reorder_within_window_writes_back() {
        let stream = new_stream(Settings::default(), 4, 100);
        stream.parse_data(&packet(0, &frame_of(0, 4)), 0);
        stream.parse_data(&packet(2, &frame_of(2, 4)), 1_000);
        stream.parse_data(&packet(1, &frame_of(1, 4)), 1_500);
        stream.parse_data(&packet(3, &frame_of(3, 4)), 2_000);

        assert_eq!(stream.frames_available(), 4);
        for expected in 0u16..4 {
            stream.pop_frames(1, false, true, 2_000);
            assert_eq!(stream.last_pop_output()[0], expected as i16);
        }
    }

    /// Scenario 5: an unreasonable jump forces a resync; the stream resumes cleanly from the
    /// new baseline.
    #[test]
    fn scenario_unreasonable_jump_resyncs() {
        let stream = new_stream(Settings::default(), 4, 100);
        stream.parse_data(&packet(0, &frame_of(0, 4)), 0);
        stream.parse_data(&packet(1, &frame_of(1, 4)), 1_000);
        stream.parse_data(&packet(50_000, &frame_of(50_000, 4)), 2_000);

        assert_eq!(stream.frames_available(), 0);

        stream.parse_data(&packet(50_001, &frame_of(50_001, 4)), 2_500);
        assert_eq!(stream.frames_available(), 1);
    }

    /// Scenario 6: three starves within the too-many-starves window immediately raise
    /// `desired_frames` to at least `F + PADDING`.
    #[test]
    fn scenario_starve_driven_growth() {
        let settings = Settings {
            dynamic_jitter_buffers: true,
            estimator_mode: EstimatorMode::MaxGap,
            window_starve_threshold: 3,
            ..Settings::default()
        };
        let stream = new_stream(settings, 4, 100);

        // Establish arrivals whose max gap implies F = 5 frames (frame_duration_usec = 1000).
        let mut t = 0u64;
        stream.parse_data(&packet(0, &frame_of(0, 4)), t);
        t += 5_000;
        stream.parse_data(&packet(1, &frame_of(1, 4)), t);

        for _ in 0..3 {
            stream.pop_frames(1000, true, true, t); // guaranteed underrun -> starve
        }

        assert!(stream.desired_frames() >= 6);
    }

    #[test]
    fn reset_is_idempotent() {
        let stream = new_stream(Settings::default(), 4, 100);
        stream.parse_data(&packet(0, &frame_of(0, 4)), 0);
        stream.parse_data(&packet(5, &frame_of(5, 4)), 1_000);
        stream.reset();
        let after_first = stream.get_audio_stream_stats(1_000);
        stream.reset();
        let after_second = stream.get_audio_stream_stats(1_000);
        assert_eq!(after_first, after_second);
        assert_eq!(after_first.frames_available, 0);
    }

    #[test]
    fn static_mode_pins_desired_frames_after_first_tick() {
        let settings = Settings {
            dynamic_jitter_buffers: false,
            static_desired_jitter_buffer_frames: 3,
            ..Settings::default()
        };
        let stream = new_stream(settings, 4, 100);
        stream.per_second_tick(1_000_000);
        assert_eq!(stream.desired_frames(), 3);
    }

    #[test]
    fn clear_buffer_drops_frames_without_resetting_stats() {
        let stream = new_stream(Settings::default(), 4, 100);
        stream.parse_data(&packet(0, &frame_of(0, 4)), 0);
        stream.parse_data(&packet(1, &frame_of(1, 4)), 1_000);
        stream.clear_buffer();
        assert_eq!(stream.frames_available(), 0);
        assert_eq!(stream.get_audio_stream_stats(1_000).packets_received, 2);
    }

    #[test]
    fn set_to_starved_forces_latch() {
        let stream = new_stream(Settings::default(), 4, 100);
        assert!(!stream.is_starved());
        stream.set_to_starved();
        assert!(stream.is_starved());
    }

    proptest! {
        /// `frames_available` stays within `[0, frame_capacity]` under an arbitrary
        /// interleaving of packet arrivals (with jitter in sequence number and a chance of
        /// reorder/duplicate) and frame pops.
        #[test]
        fn frames_available_stays_within_capacity(
            ops in proptest::collection::vec(
                (0u8..3, -2i32..=3, 0u32..4),
                1..200,
            )
        ) {
            let stream = new_stream(Settings::default(), 4, 50);
            let mut seq: u16 = 0;
            let mut t: u64 = 0;

            for (kind, seq_delta, pop_count) in ops {
                t += 1_000;
                match kind {
                    0 => {
                        let this_seq = (seq as i32 + seq_delta) as u16;
                        stream.parse_data(&packet(this_seq, &frame_of(this_seq, 4)), t);
                        seq = seq.wrapping_add(1);
                    }
                    1 => {
                        stream.pop_frames(pop_count, false, true, t);
                    }
                    _ => {
                        stream.per_second_tick(t);
                    }
                }

                let available = stream.frames_available();
                prop_assert!(available <= 50);

                let desired = stream.desired_frames();
                prop_assert!(desired <= 50 - stream.settings().max_frames_over_desired);
            }
        }

        /// `packets_received` never decreases across an arbitrary sequence of parses, as long
        /// as none of them is a big enough jump to be classified UNREASONABLE (which resyncs
        /// the stream and starts a fresh counting lifetime, per the note on
        /// `AudioStreamStats`).
        #[test]
        fn packets_received_is_monotonic(deltas in proptest::collection::vec(-5i32..=10, 1..100)) {
            let stream = new_stream(Settings::default(), 4, 50);
            let mut last = 0u64;
            let mut t = 0u64;
            let mut seq: u16 = 0;
            for delta in deltas {
                t += 1_000;
                seq = (seq as i32 + delta) as u16;
                stream.parse_data(&packet(seq, &frame_of(seq, 4)), t);
                let now = stream.get_audio_stream_stats(t).packets_received;
                prop_assert!(now >= last);
                last = now;
            }
        }
    }
}
