use super::{approach, sanitize_amplitude, Side};
use crate::retarget_trait::{FrameInput, RetargetStep};
use crate::retargeter::{Bindings, RetargetConfig};
use crate::skeleton::SkeletonBinding;
use api::{BoneRotations, CanonicalChannel, ExpressionFrame, Joint, Rig};
use anyhow::Result;

/// Largest eye rotation a fully saturated look channel produces, in radians.
pub const MAX_GAZE_ANGLE: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EyeAngles {
    /// Positive looks down
    pub pitch: f32,
    /// Positive looks toward the subject's right
    pub yaw: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Gaze {
    pub left: EyeAngles,
    pub right: EyeAngles,
}

impl Gaze {
    pub fn eye(&self, side: Side) -> EyeAngles {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeRetargeter {
    pub factor: f32,
    pub clamp: bool,
    /// Negate yaw, the same way the head step does for a mirrored feed
    pub mirror: bool,
}

impl GazeRetargeter {
    pub fn new(factor: f32, clamp: bool) -> Self {
        Self {
            factor,
            clamp,
            mirror: false,
        }
    }

    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Converts the eight look channels into per-eye angles.
    pub fn compute_gaze(&self, frame: &ExpressionFrame) -> Gaze {
        use CanonicalChannel::*;
        let amp = |c: CanonicalChannel| sanitize_amplitude(frame.amplitude(c), self.clamp);
        let yaw_sign = if self.mirror { -1.0 } else { 1.0 };

        Gaze {
            left: EyeAngles {
                pitch: (amp(EyeLookDownLeft) - amp(EyeLookUpLeft)) * MAX_GAZE_ANGLE,
                yaw: yaw_sign * (amp(EyeLookInLeft) - amp(EyeLookOutLeft)) * MAX_GAZE_ANGLE,
            },
            right: EyeAngles {
                pitch: (amp(EyeLookDownRight) - amp(EyeLookUpRight)) * MAX_GAZE_ANGLE,
                yaw: yaw_sign * (amp(EyeLookOutRight) - amp(EyeLookInRight)) * MAX_GAZE_ANGLE,
            },
        }
    }

    /// Smooths both bound eye bones toward `gaze`.
    pub fn apply_gaze(
        &self,
        gaze: &Gaze,
        bones: &SkeletonBinding,
        skeleton: &mut impl BoneRotations,
    ) {
        for side in Side::BOTH {
            self.apply_eye(side, gaze.eye(side), bones, skeleton);
        }
    }

    pub fn apply_eye(
        &self,
        side: Side,
        angles: EyeAngles,
        bones: &SkeletonBinding,
        skeleton: &mut impl BoneRotations,
    ) {
        let joint = match side {
            Side::Left => Joint::LeftEye,
            Side::Right => Joint::RightEye,
        };
        let Some(rotation) = bones.id(joint).and_then(|id| skeleton.rotation_mut(id)) else {
            return;
        };
        approach(&mut rotation.x, angles.pitch, self.factor);
        approach(&mut rotation.y, angles.yaw, self.factor);
    }
}

pub struct GazeStep {
    retargeter: GazeRetargeter,
}

impl GazeStep {
    pub fn new(config: &RetargetConfig) -> Self {
        Self {
            retargeter: GazeRetargeter::new(config.gaze_factor, config.clamp_amplitudes)
                .with_mirror(config.mirror_input),
        }
    }
}

impl RetargetStep for GazeStep {
    fn initialize(&mut self, config: &RetargetConfig) -> Result<()> {
        *self = Self::new(config);
        Ok(())
    }

    fn apply(&mut self, input: &FrameInput<'_>, bindings: &Bindings, rig: &mut Rig) {
        let gaze = self.retargeter.compute_gaze(input.expression);
        for side in Side::BOTH {
            if bindings.drives_eye_bone(side) {
                self.retargeter
                    .apply_eye(side, gaze.eye(side), &bindings.skeleton, rig);
            }
        }
    }

    fn name(&self) -> &str {
        "Gaze"
    }

    fn priority(&self) -> i32 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaw_is_consistent_across_eyes() {
        // Looking toward the subject's right: left eye turns in, right eye turns out.
        let frame = ExpressionFrame::new()
            .with(CanonicalChannel::EyeLookInLeft, 1.0)
            .with(CanonicalChannel::EyeLookOutRight, 1.0);
        let gaze = GazeRetargeter::new(1.0, true).compute_gaze(&frame);
        assert_eq!(gaze.left.yaw, MAX_GAZE_ANGLE);
        assert_eq!(gaze.right.yaw, MAX_GAZE_ANGLE);
        assert_eq!(gaze.left.pitch, 0.0);
    }

    #[test]
    fn test_pitch_down_is_positive() {
        let frame = ExpressionFrame::new()
            .with(CanonicalChannel::EyeLookDownLeft, 0.5)
            .with(CanonicalChannel::EyeLookUpRight, 1.0);
        let gaze = GazeRetargeter::new(1.0, true).compute_gaze(&frame);
        assert_eq!(gaze.left.pitch, 0.25);
        assert_eq!(gaze.right.pitch, -0.5);
    }

    #[test]
    fn test_mirroring_flips_yaw_only() {
        let frame = ExpressionFrame::new()
            .with(CanonicalChannel::EyeLookInLeft, 1.0)
            .with(CanonicalChannel::EyeLookOutRight, 1.0)
            .with(CanonicalChannel::EyeLookDownLeft, 0.5);
        let gaze = GazeRetargeter::new(1.0, true)
            .with_mirror(true)
            .compute_gaze(&frame);
        assert_eq!(gaze.left.yaw, -MAX_GAZE_ANGLE);
        assert_eq!(gaze.right.yaw, -MAX_GAZE_ANGLE);
        assert_eq!(gaze.left.pitch, 0.25);
    }

    #[test]
    fn test_neutral_frame_is_centered() {
        let gaze = GazeRetargeter::new(1.0, true).compute_gaze(&ExpressionFrame::new());
        assert_eq!(gaze, Gaze::default());
    }
}
