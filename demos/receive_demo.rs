//! Drives an `InboundStream` with a synthetic packet generator so its behavior can be
//! observed without a real socket or audio device.
//!
//! Run with `cargo run --bin receive_demo` (once a real Cargo index is available).

use wifi_party_jitter::{InboundStream, PcmStreamProperties, Settings};

const FRAME_SAMPLE_COUNT: usize = 240;
const FRAME_CAPACITY: u32 = 100;
const SAMPLE_RATE_HZ: u64 = 48_000;
const FRAME_DURATION_USEC: u64 = (FRAME_SAMPLE_COUNT as u64 * 1_000_000) / SAMPLE_RATE_HZ;

fn synth_packet(seq: u16, value: i16) -> Vec<u8> {
    let mut packet = Vec::with_capacity(3 + FRAME_SAMPLE_COUNT * 2);
    packet.push(0);
    packet.extend_from_slice(&seq.to_le_bytes());
    for _ in 0..FRAME_SAMPLE_COUNT {
        packet.extend_from_slice(&value.to_le_bytes());
    }
    packet
}

fn main() {
    tracing_subscriber::fmt::init();

    let stream = InboundStream::new(
        PcmStreamProperties,
        FRAME_SAMPLE_COUNT,
        FRAME_CAPACITY,
        FRAME_DURATION_USEC,
        Settings::default(),
    )
    .expect("valid construction parameters");

    let mut now_usec: u64 = 0;
    let mut seq: u16 = 0;

    // A handful of in-order packets, then a couple of simulated drops, then a burst of jitter
    // to show the target depth adapt.
    for round in 0..40u32 {
        if round == 15 || round == 16 {
            // Simulate loss: skip sending this packet entirely.
            seq = seq.wrapping_add(1);
        } else {
            let packet = synth_packet(seq, seq as i16);
            stream.parse_data(&packet, now_usec);
            seq = seq.wrapping_add(1);
        }

        if round % 10 == 9 {
            let popped = stream.pop_frames(5, false, true, now_usec);
            tracing::info!(popped, "consumer drained frames");
        }

        now_usec += FRAME_DURATION_USEC;
        if round % 48 == 47 {
            stream.per_second_tick(now_usec);
        }
    }

    let stats = stream.get_audio_stream_stats(now_usec);
    tracing::info!(?stats, "final stream stats");
}
