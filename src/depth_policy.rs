//! Combines estimator output, starve history, and static/dynamic mode into a single
//! `desired_frames` number.
//!
//! Kept as a pure, stateless set of functions over explicit inputs rather than a struct with
//! its own fields — `InboundStream` is the only thing that owns state here, matching the
//! teacher's preference (see `jitter_buffer.rs`'s free-standing `adjust_target_latency`-style
//! helpers) for small, testable functions over another layer of shared mutable state.

use crate::constants::DESIRED_JITTER_BUFFER_FRAMES_PADDING;
use crate::settings::Settings;

fn clamp_frames(value: u32, frame_capacity: u32, max_frames_over_desired: u32) -> u32 {
    let ceiling = frame_capacity.saturating_sub(max_frames_over_desired);
    value.min(ceiling)
}

/// Rule 1 alone: what `desired_frames` must be when buffers are pinned to static mode.
pub fn static_desired_frames(settings: &Settings, frame_capacity: u32) -> u32 {
    clamp_frames(
        settings.static_desired_jitter_buffer_frames,
        frame_capacity,
        settings.max_frames_over_desired,
    )
}

/// Growth-only recompute, invoked from `parseData`'s starve-handling branch (SPEC §4.4 step
/// 3): may raise `desired_frames` if the too-many-starves window is active, never lowers it.
pub fn recompute_on_growth(
    settings: &Settings,
    frame_capacity: u32,
    current_desired: u32,
    too_many_starves_active: bool,
    candidate_frames: u32,
) -> u32 {
    if !settings.dynamic_jitter_buffers {
        return static_desired_frames(settings, frame_capacity);
    }

    let mut desired = current_desired;
    if too_many_starves_active {
        let target = candidate_frames + DESIRED_JITTER_BUFFER_FRAMES_PADDING;
        desired = desired.max(target);
    }
    clamp_frames(desired, frame_capacity, settings.max_frames_over_desired)
}

/// Full recompute, invoked from the per-second tick (SPEC §4.5 / §4.8): applies growth if
/// still in too-many-starves mode, otherwise considers the shrink candidate from the
/// reduction-window estimator.
pub fn recompute_on_tick(
    settings: &Settings,
    frame_capacity: u32,
    current_desired: u32,
    too_many_starves_active: bool,
    candidate_frames: u32,
    shrink_candidate_frames: u32,
) -> u32 {
    if !settings.dynamic_jitter_buffers {
        return static_desired_frames(settings, frame_capacity);
    }

    let mut desired = current_desired;
    if too_many_starves_active {
        let target = candidate_frames + DESIRED_JITTER_BUFFER_FRAMES_PADDING;
        desired = desired.max(target);
    } else if shrink_candidate_frames < desired {
        desired = shrink_candidate_frames;
    }
    clamp_frames(desired, frame_capacity, settings.max_frames_over_desired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EstimatorMode;

    fn settings(dynamic: bool) -> Settings {
        Settings {
            dynamic_jitter_buffers: dynamic,
            ..Settings::default()
        }
    }

    #[test]
    fn static_mode_pins_to_configured_value_regardless_of_candidate() {
        let mut s = settings(false);
        s.static_desired_jitter_buffer_frames = 4;
        let desired = recompute_on_tick(&s, 100, 20, true, 50, 1);
        assert_eq!(desired, 4);
    }

    #[test]
    fn too_many_starves_raises_desired_past_candidate_plus_padding() {
        let s = settings(true);
        let desired = recompute_on_growth(&s, 100, 2, true, 5);
        assert_eq!(desired, 6); // 5 + PADDING(1)
    }

    #[test]
    fn growth_never_lowers_desired_frames() {
        let s = settings(true);
        let desired = recompute_on_growth(&s, 100, 10, true, 2);
        assert_eq!(desired, 10);
    }

    #[test]
    fn growth_leaves_desired_unchanged_without_too_many_starves() {
        let s = settings(true);
        let desired = recompute_on_growth(&s, 100, 3, false, 50);
        assert_eq!(desired, 3);
    }

    #[test]
    fn tick_shrinks_to_reduction_candidate_when_not_starving() {
        let s = settings(true);
        let desired = recompute_on_tick(&s, 100, 10, false, 50, 2);
        assert_eq!(desired, 2);
    }

    #[test]
    fn tick_does_not_shrink_while_too_many_starves_active() {
        let s = settings(true);
        let desired = recompute_on_tick(&s, 100, 10, true, 3, 1);
        assert_eq!(desired, 10.max(3 + 1));
    }

    #[test]
    fn result_is_always_clamped_to_capacity_minus_max_over_desired() {
        let s = settings(true);
        let desired = recompute_on_growth(&s, 20, 5, true, 100);
        assert_eq!(desired, 20 - s.max_frames_over_desired);
    }

    #[test]
    fn estimator_mode_is_just_a_selector_the_caller_applies_before_calling_in() {
        // DepthPolicy itself is estimator-agnostic: the caller picks F or P up front.
        let s = Settings {
            estimator_mode: EstimatorMode::StdDev,
            ..settings(true)
        };
        let desired = recompute_on_growth(&s, 100, 0, true, 7);
        assert_eq!(desired, 8);
    }
}
