//! The pluggable parse hooks a concrete wire format implements.
//!
//! Per the redesign guidance in SPEC_FULL §9, this is a small capability interface rather
//! than a base class the stream subclasses: `InboundStream<P>` is generic over `P:
//! StreamProperties`, matching the teacher's own preference for trait-based capabilities
//! (`pipeline::node::{Source, Sink}`) over inheritance.

use anyhow::Result;

/// Everything the stream front needs from a packet's payload beyond the sequence number it
/// already decoded itself.
pub trait StreamProperties: Send + Sync {
    /// Parses the properties sub-header (if any) out of the payload that follows the
    /// sequence number, returning the number of audio samples the payload announces plus the
    /// byte offset at which the actual audio data begins.
    ///
    /// Returns `Err` on a malformed payload; the caller (`InboundStream::parse_data`) treats
    /// this as "stop parsing this packet, no counters change for the unparsed tail" per §7 —
    /// it is never propagated further.
    fn parse_stream_properties(&self, packet_type: u8, payload: &[u8]) -> Result<ParsedProperties>;

    /// Decodes `num_audio_samples` samples out of `payload` (which starts at the offset
    /// `parse_stream_properties` returned).
    fn parse_audio_data(
        &self,
        packet_type: u8,
        payload: &[u8],
        num_audio_samples: usize,
    ) -> Result<Vec<i16>>;
}

/// Output of [`StreamProperties::parse_stream_properties`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedProperties {
    pub num_audio_samples: usize,
    pub payload_offset: usize,
}

/// Default wire format: no properties sub-header, the whole payload is raw little-endian
/// 16-bit PCM. `num_audio_samples` is simply `payload.len() / 2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PcmStreamProperties;

impl StreamProperties for PcmStreamProperties {
    fn parse_stream_properties(
        &self,
        _packet_type: u8,
        payload: &[u8],
    ) -> Result<ParsedProperties> {
        Ok(ParsedProperties {
            num_audio_samples: payload.len() / 2,
            payload_offset: 0,
        })
    }

    fn parse_audio_data(
        &self,
        _packet_type: u8,
        payload: &[u8],
        num_audio_samples: usize,
    ) -> Result<Vec<i16>> {
        let needed_bytes = num_audio_samples * 2;
        if payload.len() < needed_bytes {
            anyhow::bail!(
                "payload too short for {} samples: have {} bytes, need {}",
                num_audio_samples,
                payload.len(),
                needed_bytes
            );
        }
        Ok(payload[..needed_bytes]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect())
    }
}
