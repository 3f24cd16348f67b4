//! Audio sample abstraction, kept generic so the ring buffer isn't hardwired to one
//! wire representation even though the shipped default (see [`crate::capability::PcmStreamProperties`])
//! is 16-bit PCM.

use num_traits::{Num, One, PrimInt, ToPrimitive};

/// A single audio sample. Defines the value representing silence so loss-fill and
/// underrun padding don't need to know the concrete sample type.
pub trait AudioSample: Num + Copy + Send + Sync + PartialOrd + ToPrimitive {
    /// Returns the value representing silence for this sample type.
    fn silence() -> Self;
}

impl AudioSample for f32 {
    fn silence() -> Self {
        0.0
    }
}

impl AudioSample for f64 {
    fn silence() -> Self {
        0.0
    }
}

macro_rules! impl_audio_sample_int {
    ($($t:ty),*) => {
        $(
            impl AudioSample for $t {
                fn silence() -> Self {
                    (Self::min_value() + Self::max_value()) / (Self::one() + Self::one())
                }
            }
        )*
    }
}

impl_audio_sample_int!(u8, i8, u16, i16, u32, i32, u64, i64, usize, isize);
