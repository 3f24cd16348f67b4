//! Inbound audio jitter buffer and stream receiver.
//!
//! An [`stream::InboundStream`] absorbs network jitter and loss for one remote audio sender:
//! it classifies arriving sequence numbers ([`sequence_tracker`]), stores decoded samples in a
//! fixed-capacity [`ring_buffer::RingBuffer`], estimates the network's jitter from packet
//! arrival timegaps ([`jitter_estimator`]), reacts to playback starvation
//! ([`starve_controller`]), and folds all of that into a single target depth
//! ([`depth_policy`]). The wire format's properties sub-header, if any, is pluggable through
//! the [`capability::StreamProperties`] trait.
//!
//! See `demos/receive_demo.rs` for a runnable example driving a stream with synthetic packets.

pub mod capability;
pub mod constants;
pub mod depth_policy;
pub mod jitter_estimator;
pub mod ring_buffer;
pub mod sample;
pub mod sequence_tracker;
pub mod settings;
pub mod starve_controller;
pub mod stats;
pub mod stream;

pub use capability::{ParsedProperties, PcmStreamProperties, StreamProperties};
pub use sample::AudioSample;
pub use settings::{EstimatorMode, Settings};
pub use stats::AudioStreamStats;
pub use stream::InboundStream;
