use super::{approach, sanitize_amplitude, Side};
use crate::retarget_trait::{FrameInput, RetargetStep};
use crate::retargeter::{Bindings, RetargetConfig};
use crate::skeleton::SkeletonBinding;
use api::{BoneRotations, CanonicalChannel, ExpressionFrame, Joint, Rig};
use anyhow::Result;

/// Upper eyelid rotation at a full blink, in radians.
pub const MAX_EYELID_ANGLE: f32 = 0.4;
/// Lower lid travel relative to the upper lid.
pub const LOWER_EYELID_RATIO: f32 = 0.3;

/// Blink amplitude per eye.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EyelidState {
    pub left: f32,
    pub right: f32,
}

impl EyelidState {
    pub fn from_frame(frame: &ExpressionFrame, clamp: bool) -> Self {
        Self {
            left: sanitize_amplitude(frame.amplitude(CanonicalChannel::EyeBlinkLeft), clamp),
            right: sanitize_amplitude(frame.amplitude(CanonicalChannel::EyeBlinkRight), clamp),
        }
    }

    pub fn blink(&self, side: Side) -> f32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyelidRetargeter {
    pub factor: f32,
}

impl EyelidRetargeter {
    pub fn new(factor: f32) -> Self {
        Self { factor }
    }

    /// Upper and lower lid rotation (x) targets for a blink amplitude.
    pub fn targets(blink: f32) -> (f32, f32) {
        let upper = blink * MAX_EYELID_ANGLE;
        (upper, -upper * LOWER_EYELID_RATIO)
    }

    pub fn apply_blink(
        &self,
        state: &EyelidState,
        bones: &SkeletonBinding,
        skeleton: &mut impl BoneRotations,
    ) {
        for side in Side::BOTH {
            self.apply_side(side, state.blink(side), bones, skeleton);
        }
    }

    pub fn apply_side(
        &self,
        side: Side,
        blink: f32,
        bones: &SkeletonBinding,
        skeleton: &mut impl BoneRotations,
    ) {
        let (upper_joint, lower_joint) = match side {
            Side::Left => (Joint::LeftUpperEyelid, Joint::LeftLowerEyelid),
            Side::Right => (Joint::RightUpperEyelid, Joint::RightLowerEyelid),
        };
        let (upper, lower) = Self::targets(blink);

        for (joint, target) in [(upper_joint, upper), (lower_joint, lower)] {
            if let Some(rotation) = bones.id(joint).and_then(|id| skeleton.rotation_mut(id)) {
                approach(&mut rotation.x, target, self.factor);
            }
        }
    }
}

pub struct EyelidStep {
    retargeter: EyelidRetargeter,
    clamp: bool,
}

impl EyelidStep {
    pub fn new(config: &RetargetConfig) -> Self {
        Self {
            retargeter: EyelidRetargeter::new(config.eyelid_factor),
            clamp: config.clamp_amplitudes,
        }
    }
}

impl RetargetStep for EyelidStep {
    fn initialize(&mut self, config: &RetargetConfig) -> Result<()> {
        *self = Self::new(config);
        Ok(())
    }

    fn apply(&mut self, input: &FrameInput<'_>, bindings: &Bindings, rig: &mut Rig) {
        let state = EyelidState::from_frame(input.expression, self.clamp);
        for side in Side::BOTH {
            if bindings.drives_eyelid_bones(side) {
                self.retargeter
                    .apply_side(side, state.blink(side), &bindings.skeleton, rig);
            }
        }
    }

    fn name(&self) -> &str {
        "Eyelid"
    }

    fn priority(&self) -> i32 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_lid_moves_opposite_and_less() {
        let (upper, lower) = EyelidRetargeter::targets(1.0);
        assert_eq!(upper, 0.4);
        assert!(lower < 0.0);
        assert!((lower + 0.12).abs() < 1e-6);
    }

    #[test]
    fn test_state_sanitizes_blink() {
        let frame = ExpressionFrame::new()
            .with(CanonicalChannel::EyeBlinkLeft, f32::INFINITY)
            .with(CanonicalChannel::EyeBlinkRight, 1.5);
        let state = EyelidState::from_frame(&frame, true);
        assert_eq!(state, EyelidState { left: 0.0, right: 1.0 });
    }
}
