//! Runtime-mutable settings for an [`crate::stream::InboundStream`].
//!
//! A `Settings` value is read by the producer and timer threads on their next operation;
//! changes made through [`crate::stream::InboundStream::set_settings`] (or one of the
//! granular setters) take effect on the next tick, never mid-operation.

/// Which estimator `DepthPolicy` prefers when growing `desired_frames`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorMode {
    /// F: max observed inter-arrival gap, in frames.
    MaxGap,
    /// P: `NUM_STDDEVS_FOR_DESIRED_JITTER` standard deviations of inter-arrival gaps, in frames.
    StdDev,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Trim threshold: the ring is kept no deeper than `desired_frames + max_frames_over_desired`.
    pub max_frames_over_desired: u32,
    /// If false, `desired_frames` is pinned to `static_desired_jitter_buffer_frames`.
    pub dynamic_jitter_buffers: bool,
    /// Pinned target depth used when `dynamic_jitter_buffers` is false.
    pub static_desired_jitter_buffer_frames: u32,
    /// Which estimator (F or P) feeds the growth branch of `DepthPolicy`.
    pub estimator_mode: EstimatorMode,
    /// Starves within the too-many-starves window needed to trigger growth.
    pub window_starve_threshold: u32,
    /// Window, in seconds, feeding both estimators when in too-many-starves mode.
    pub window_seconds_for_desired_calc_on_too_many_starves: u64,
    /// Window, in seconds, feeding the shrink estimator.
    pub window_seconds_for_desired_reduction: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_frames_over_desired: 10,
            dynamic_jitter_buffers: true,
            static_desired_jitter_buffer_frames: 1,
            estimator_mode: EstimatorMode::MaxGap,
            window_starve_threshold: 3,
            window_seconds_for_desired_calc_on_too_many_starves: 50,
            window_seconds_for_desired_reduction: 10,
        }
    }
}

impl Settings {
    pub fn set_max_frames_over_desired(&mut self, value: u32) {
        self.max_frames_over_desired = value;
    }

    pub fn set_dynamic_jitter_buffers(&mut self, value: bool) {
        self.dynamic_jitter_buffers = value;
    }

    pub fn set_static_desired_jitter_buffer_frames(&mut self, value: u32) {
        self.static_desired_jitter_buffer_frames = value;
    }

    pub fn set_use_std_dev(&mut self, use_std_dev: bool) {
        self.estimator_mode = if use_std_dev {
            EstimatorMode::StdDev
        } else {
            EstimatorMode::MaxGap
        };
    }

    pub fn set_window_starve_threshold(&mut self, value: u32) {
        self.window_starve_threshold = value;
    }

    pub fn set_window_seconds_for_desired_calc_on_too_many_starves(&mut self, value: u64) {
        self.window_seconds_for_desired_calc_on_too_many_starves = value;
    }

    pub fn set_window_seconds_for_desired_reduction(&mut self, value: u64) {
        self.window_seconds_for_desired_reduction = value;
    }
}
