use std::f32::consts::PI;

use super::{approach, approach_vec3, Side};
use crate::retarget_trait::{FrameInput, RetargetStep};
use crate::retargeter::{Bindings, RetargetConfig};
use crate::skeleton::SkeletonBinding;
use api::{BoneRotations, Joint, LandmarkFrame, PoseLandmark, Rig};
use anyhow::Result;
use glam::Vec3;

pub const ABDUCTION_GAIN: f32 = 1.1;
pub const ELBOW_BEND_GAIN: f32 = 0.7;

/// Per-arm rotation targets derived from landmarks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmTarget {
    /// Upper-arm raise, before the side sign is applied
    pub abduction: f32,
    /// Elbow flexion, `None` when the wrist is not visible
    pub bend: Option<f32>,
}

impl ArmTarget {
    fn sign(side: Side) -> f32 {
        match side {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    pub fn upper_arm_rotation(&self, side: Side) -> Vec3 {
        Vec3::new(0.0, 0.0, Self::sign(side) * self.abduction)
    }

    pub fn forearm_yaw(&self, side: Side) -> Option<f32> {
        self.bend.map(|bend| -Self::sign(side) * bend)
    }
}

struct ArmLandmarks {
    shoulder: PoseLandmark,
    elbow: PoseLandmark,
    wrist: PoseLandmark,
    upper_arm: Joint,
    forearm: Joint,
}

fn arm(side: Side) -> ArmLandmarks {
    match side {
        Side::Left => ArmLandmarks {
            shoulder: PoseLandmark::LeftShoulder,
            elbow: PoseLandmark::LeftElbow,
            wrist: PoseLandmark::LeftWrist,
            upper_arm: Joint::LeftArm,
            forearm: Joint::LeftForeArm,
        },
        Side::Right => ArmLandmarks {
            shoulder: PoseLandmark::RightShoulder,
            elbow: PoseLandmark::RightElbow,
            wrist: PoseLandmark::RightWrist,
            upper_arm: Joint::RightArm,
            forearm: Joint::RightForeArm,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseRetargeter {
    pub factor: f32,
    pub min_visibility: f32,
    /// Input comes from a selfie view and must be flipped onto the avatar
    pub mirror: bool,
}

impl PoseRetargeter {
    pub fn new(factor: f32, min_visibility: f32, mirror: bool) -> Self {
        Self {
            factor,
            min_visibility,
            mirror,
        }
    }

    /// Targets for the avatar's `side` arm from landmarks already in avatar
    /// orientation. `None` when the shoulder or elbow is not visible.
    pub fn arm_target(&self, landmarks: &LandmarkFrame, side: Side) -> Option<ArmTarget> {
        let arm = arm(side);
        let shoulder = landmarks.visible_position(arm.shoulder, self.min_visibility)?;
        let elbow = landmarks.visible_position(arm.elbow, self.min_visibility)?;

        // Image space: y grows downward.
        let up = -(elbow.y - shoulder.y);
        let horizontal = (elbow.x - shoulder.x).abs();
        let abduction = up.atan2(horizontal) * ABDUCTION_GAIN;

        let bend = landmarks
            .visible_position(arm.wrist, self.min_visibility)
            .map(|wrist| {
                let angle = (shoulder - elbow).angle_between(wrist - elbow);
                ((PI - angle) * ELBOW_BEND_GAIN).max(0.0)
            })
            .filter(|bend| bend.is_finite());

        Some(ArmTarget { abduction, bend }).filter(|t| t.abduction.is_finite())
    }

    /// Drives both arms. Does nothing unless both shoulders are visible;
    /// an arm whose elbow is missing holds its current rotation.
    pub fn apply_pose(
        &self,
        landmarks: &LandmarkFrame,
        bones: &SkeletonBinding,
        skeleton: &mut impl BoneRotations,
    ) {
        let mirrored;
        let landmarks = if self.mirror {
            mirrored = landmarks.mirrored();
            &mirrored
        } else {
            landmarks
        };

        let shoulders_visible = [PoseLandmark::LeftShoulder, PoseLandmark::RightShoulder]
            .into_iter()
            .all(|s| landmarks.visible_position(s, self.min_visibility).is_some());
        if !shoulders_visible {
            return;
        }

        for side in Side::BOTH {
            let Some(target) = self.arm_target(landmarks, side) else {
                continue;
            };
            let arm = arm(side);

            if let Some(rotation) = bones.id(arm.upper_arm).and_then(|id| skeleton.rotation_mut(id)) {
                approach_vec3(rotation, target.upper_arm_rotation(side), self.factor);
            }

            if let (Some(yaw), Some(rotation)) = (
                target.forearm_yaw(side),
                bones.id(arm.forearm).and_then(|id| skeleton.rotation_mut(id)),
            ) {
                approach(&mut rotation.y, yaw, self.factor);
            }
        }
    }
}

pub struct PoseStep {
    retargeter: PoseRetargeter,
}

impl PoseStep {
    pub fn new(config: &RetargetConfig) -> Self {
        Self {
            retargeter: PoseRetargeter::new(
                config.pose_factor,
                config.min_landmark_visibility,
                config.mirror_input,
            ),
        }
    }
}

impl RetargetStep for PoseStep {
    fn initialize(&mut self, config: &RetargetConfig) -> Result<()> {
        *self = Self::new(config);
        Ok(())
    }

    fn apply(&mut self, input: &FrameInput<'_>, bindings: &Bindings, rig: &mut Rig) {
        if let Some(landmarks) = input.landmarks {
            self.retargeter.apply_pose(landmarks, &bindings.skeleton, rig);
        }
    }

    fn name(&self) -> &str {
        "Pose"
    }

    fn priority(&self) -> i32 {
        20
    }
}
