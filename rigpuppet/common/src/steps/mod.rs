pub mod expression;
pub mod eyelid;
pub mod gaze;
pub mod head;
pub mod pose;

pub use expression::{ExpressionSmoother, ExpressionStep, FAST_RESPONSE_FACTOR};
pub use eyelid::{EyelidRetargeter, EyelidState, EyelidStep, LOWER_EYELID_RATIO, MAX_EYELID_ANGLE};
pub use gaze::{EyeAngles, Gaze, GazeRetargeter, GazeStep, MAX_GAZE_ANGLE};
pub use head::{HeadRetargeter, HeadStep, NECK_SHARE};
pub use pose::{ArmTarget, PoseRetargeter, PoseStep, ABDUCTION_GAIN, ELBOW_BEND_GAIN};

use glam::Vec3;

/// Side of the avatar's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];
}

/// Limits a smoothing factor to [0, 1]. NaN holds the current value.
#[inline]
pub(crate) fn clamp_factor(factor: f32) -> f32 {
    if factor.is_nan() {
        0.0
    } else {
        factor.clamp(0.0, 1.0)
    }
}

/// One exponential-moving-average step of `current` toward `target`.
#[inline]
pub(crate) fn approach(current: &mut f32, target: f32, factor: f32) {
    *current += (target - *current) * clamp_factor(factor);
}

#[inline]
pub(crate) fn approach_vec3(current: &mut Vec3, target: Vec3, factor: f32) {
    *current += (target - *current) * clamp_factor(factor);
}

/// Non-finite amplitudes read as 0; finite ones are optionally clamped to [0, 1].
#[inline]
pub(crate) fn sanitize_amplitude(value: f32, clamp: bool) -> f32 {
    if !value.is_finite() {
        0.0
    } else if clamp {
        value.clamp(0.0, 1.0)
    } else {
        value
    }
}
