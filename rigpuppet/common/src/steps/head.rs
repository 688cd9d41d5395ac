use super::approach_vec3;
use crate::retarget_trait::{FrameInput, RetargetStep};
use crate::retargeter::{Bindings, RetargetConfig};
use crate::skeleton::SkeletonBinding;
use api::{BoneRotations, HeadRotation, Joint, Rig};
use anyhow::Result;
use glam::Vec3;

/// Part of the head rotation carried by the neck when both bones are bound.
pub const NECK_SHARE: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadRetargeter {
    pub factor: f32,
    pub mirror: bool,
}

impl HeadRetargeter {
    pub fn new(factor: f32, mirror: bool) -> Self {
        Self { factor, mirror }
    }

    /// Euler XYZ target for the full head turn, in avatar orientation.
    pub fn target(&self, head: &HeadRotation) -> Option<Vec3> {
        let mut target = Vec3::new(head.pitch, head.yaw, head.roll);
        if !target.is_finite() {
            return None;
        }
        if self.mirror {
            target.y = -target.y;
            target.z = -target.z;
        }
        Some(target)
    }

    /// Splits the rotation between neck and head. A bone that is not bound
    /// passes its share to the other.
    pub fn apply_head(
        &self,
        head: &HeadRotation,
        bones: &SkeletonBinding,
        skeleton: &mut impl BoneRotations,
    ) {
        let Some(target) = self.target(head) else {
            return;
        };
        let neck = bones.id(Joint::Neck);
        let head_bone = bones.id(Joint::Head);

        let (neck_share, head_share) = match (neck, head_bone) {
            (Some(_), Some(_)) => (NECK_SHARE, 1.0 - NECK_SHARE),
            _ => (1.0, 1.0),
        };

        for (id, share) in [(neck, neck_share), (head_bone, head_share)] {
            if let Some(rotation) = id.and_then(|id| skeleton.rotation_mut(id)) {
                approach_vec3(rotation, target * share, self.factor);
            }
        }
    }
}

pub struct HeadStep {
    retargeter: HeadRetargeter,
}

impl HeadStep {
    pub fn new(config: &RetargetConfig) -> Self {
        Self {
            retargeter: HeadRetargeter::new(config.head_factor, config.mirror_input),
        }
    }
}

impl RetargetStep for HeadStep {
    fn initialize(&mut self, config: &RetargetConfig) -> Result<()> {
        *self = Self::new(config);
        Ok(())
    }

    // Frames without a head estimate hold the current pose.
    fn apply(&mut self, input: &FrameInput<'_>, bindings: &Bindings, rig: &mut Rig) {
        if let Some(head) = input.expression.head.as_ref() {
            self.retargeter.apply_head(head, &bindings.skeleton, rig);
        }
    }

    fn name(&self) -> &str {
        "Head"
    }

    fn priority(&self) -> i32 {
        20
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirroring_flips_yaw_and_roll() {
        let head = HeadRotation {
            pitch: 0.1,
            yaw: 0.2,
            roll: 0.3,
        };
        let target = HeadRetargeter::new(1.0, true).target(&head).unwrap();
        assert_eq!(target, Vec3::new(0.1, -0.2, -0.3));
        let target = HeadRetargeter::new(1.0, false).target(&head).unwrap();
        assert_eq!(target, Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_non_finite_rotation_is_ignored() {
        let head = HeadRotation {
            pitch: f32::NAN,
            yaw: 0.0,
            roll: 0.0,
        };
        assert!(HeadRetargeter::new(1.0, true).target(&head).is_none());
    }
}
