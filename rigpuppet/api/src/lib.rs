mod landmarks;
mod rig;

pub use landmarks::{Landmark, LandmarkFrame, PoseLandmark};
pub use rig::{
    Bone, BoneId, BoneRef, BoneRotations, MorphState, Rig, RigError, RigId, RigMorphCatalog,
    Skeleton, MAX_MORPH_SLOTS,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The 52 facial action channels emitted by the perceiver, in their fixed
/// enumeration order. Rigs that export numbered morph targets follow this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum CanonicalChannel {
    // Left eye
    EyeBlinkLeft = 0,
    EyeLookDownLeft,
    EyeLookInLeft,
    EyeLookOutLeft,
    EyeLookUpLeft,
    EyeSquintLeft,
    EyeWideLeft,

    // Right eye
    EyeBlinkRight,
    EyeLookDownRight,
    EyeLookInRight,
    EyeLookOutRight,
    EyeLookUpRight,
    EyeSquintRight,
    EyeWideRight,

    // Jaw
    JawForward,
    JawLeft,
    JawRight,
    JawOpen,

    // Mouth
    MouthClose,
    MouthFunnel,
    MouthPucker,
    MouthLeft,
    MouthRight,
    MouthSmileLeft,
    MouthSmileRight,
    MouthFrownLeft,
    MouthFrownRight,
    MouthDimpleLeft,
    MouthDimpleRight,
    MouthStretchLeft,
    MouthStretchRight,
    MouthRollLower,
    MouthRollUpper,
    MouthShrugLower,
    MouthShrugUpper,
    MouthPressLeft,
    MouthPressRight,
    MouthLowerDownLeft,
    MouthLowerDownRight,
    MouthUpperUpLeft,
    MouthUpperUpRight,

    // Brow
    BrowDownLeft,
    BrowDownRight,
    BrowInnerUp,
    BrowOuterUpLeft,
    BrowOuterUpRight,

    // Cheek / nose / tongue
    CheekPuff,
    CheekSquintLeft,
    CheekSquintRight,
    NoseSneerLeft,
    NoseSneerRight,
    TongueOut,
}

const CHANNEL_NAMES: [&str; CanonicalChannel::COUNT] = [
    "eyeBlinkLeft",
    "eyeLookDownLeft",
    "eyeLookInLeft",
    "eyeLookOutLeft",
    "eyeLookUpLeft",
    "eyeSquintLeft",
    "eyeWideLeft",
    "eyeBlinkRight",
    "eyeLookDownRight",
    "eyeLookInRight",
    "eyeLookOutRight",
    "eyeLookUpRight",
    "eyeSquintRight",
    "eyeWideRight",
    "jawForward",
    "jawLeft",
    "jawRight",
    "jawOpen",
    "mouthClose",
    "mouthFunnel",
    "mouthPucker",
    "mouthLeft",
    "mouthRight",
    "mouthSmileLeft",
    "mouthSmileRight",
    "mouthFrownLeft",
    "mouthFrownRight",
    "mouthDimpleLeft",
    "mouthDimpleRight",
    "mouthStretchLeft",
    "mouthStretchRight",
    "mouthRollLower",
    "mouthRollUpper",
    "mouthShrugLower",
    "mouthShrugUpper",
    "mouthPressLeft",
    "mouthPressRight",
    "mouthLowerDownLeft",
    "mouthLowerDownRight",
    "mouthUpperUpLeft",
    "mouthUpperUpRight",
    "browDownLeft",
    "browDownRight",
    "browInnerUp",
    "browOuterUpLeft",
    "browOuterUpRight",
    "cheekPuff",
    "cheekSquintLeft",
    "cheekSquintRight",
    "noseSneerLeft",
    "noseSneerRight",
    "tongueOut",
];

impl CanonicalChannel {
    pub const COUNT: usize = 52;

    pub const ALL: [CanonicalChannel; Self::COUNT] = {
        use CanonicalChannel::*;
        [
            EyeBlinkLeft,
            EyeLookDownLeft,
            EyeLookInLeft,
            EyeLookOutLeft,
            EyeLookUpLeft,
            EyeSquintLeft,
            EyeWideLeft,
            EyeBlinkRight,
            EyeLookDownRight,
            EyeLookInRight,
            EyeLookOutRight,
            EyeLookUpRight,
            EyeSquintRight,
            EyeWideRight,
            JawForward,
            JawLeft,
            JawRight,
            JawOpen,
            MouthClose,
            MouthFunnel,
            MouthPucker,
            MouthLeft,
            MouthRight,
            MouthSmileLeft,
            MouthSmileRight,
            MouthFrownLeft,
            MouthFrownRight,
            MouthDimpleLeft,
            MouthDimpleRight,
            MouthStretchLeft,
            MouthStretchRight,
            MouthRollLower,
            MouthRollUpper,
            MouthShrugLower,
            MouthShrugUpper,
            MouthPressLeft,
            MouthPressRight,
            MouthLowerDownLeft,
            MouthLowerDownRight,
            MouthUpperUpLeft,
            MouthUpperUpRight,
            BrowDownLeft,
            BrowDownRight,
            BrowInnerUp,
            BrowOuterUpLeft,
            BrowOuterUpRight,
            CheekPuff,
            CheekSquintLeft,
            CheekSquintRight,
            NoseSneerLeft,
            NoseSneerRight,
            TongueOut,
        ]
    };

    /// Canonical identifier as emitted by the perceiver (e.g. `eyeBlinkLeft`).
    pub fn name(self) -> &'static str {
        CHANNEL_NAMES[self as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Exact, case-sensitive lookup of a canonical identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        CHANNEL_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self::ALL[i])
    }

    /// Channels whose onset/offset must read crisp: blink, wide and squint.
    pub fn is_fast_response(self) -> bool {
        use CanonicalChannel::*;
        matches!(
            self,
            EyeBlinkLeft
                | EyeBlinkRight
                | EyeWideLeft
                | EyeWideRight
                | EyeSquintLeft
                | EyeSquintRight
        )
    }
}

impl TryFrom<usize> for CanonicalChannel {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::ALL.get(value).copied().ok_or(())
    }
}

impl std::fmt::Display for CanonicalChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Head orientation estimated by the perceiver, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadRotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// One tick of facial channel amplitudes. Values are not range-checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawExpressionFrame", into = "RawExpressionFrame")]
pub struct ExpressionFrame {
    amplitudes: [Option<f32>; CanonicalChannel::COUNT],
    pub head: Option<HeadRotation>,
}

impl Default for ExpressionFrame {
    fn default() -> Self {
        Self {
            amplitudes: [None; CanonicalChannel::COUNT],
            head: None,
        }
    }
}

impl ExpressionFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a frame from perceiver category names, skipping names outside
    /// the canonical vocabulary (such as `_neutral`).
    pub fn from_named<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut frame = Self::default();
        for (name, value) in values {
            if let Some(channel) = CanonicalChannel::from_name(name) {
                frame.set(channel, value);
            }
        }
        frame
    }

    pub fn set(&mut self, channel: CanonicalChannel, amplitude: f32) {
        self.amplitudes[channel as usize] = Some(amplitude);
    }

    pub fn with(mut self, channel: CanonicalChannel, amplitude: f32) -> Self {
        self.set(channel, amplitude);
        self
    }

    pub fn get(&self, channel: CanonicalChannel) -> Option<f32> {
        self.amplitudes[channel as usize]
    }

    /// Amplitude for `channel`, 0 when absent this frame.
    pub fn amplitude(&self, channel: CanonicalChannel) -> f32 {
        self.get(channel).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalChannel, f32)> + '_ {
        CanonicalChannel::ALL
            .iter()
            .filter_map(|c| self.get(*c).map(|v| (*c, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.iter().all(Option::is_none)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawExpressionFrame {
    #[serde(default)]
    blendshapes: HashMap<String, f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    head: Option<HeadRotation>,
}

impl From<RawExpressionFrame> for ExpressionFrame {
    fn from(raw: RawExpressionFrame) -> Self {
        let mut frame =
            ExpressionFrame::from_named(raw.blendshapes.iter().map(|(k, v)| (k.as_str(), *v)));
        frame.head = raw.head;
        frame
    }
}

impl From<ExpressionFrame> for RawExpressionFrame {
    fn from(frame: ExpressionFrame) -> Self {
        Self {
            blendshapes: frame
                .iter()
                .map(|(c, v)| (c.name().to_string(), v))
                .collect(),
            head: frame.head,
        }
    }
}

/// Canonical joints the retargeter knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(usize)]
pub enum Joint {
    Hips = 0,
    Spine,
    Neck,
    Head,
    LeftShoulder,
    LeftArm,
    LeftForeArm,
    LeftHand,
    RightShoulder,
    RightArm,
    RightForeArm,
    RightHand,
    LeftEye,
    RightEye,
    LeftUpperEyelid,
    LeftLowerEyelid,
    RightUpperEyelid,
    RightLowerEyelid,
}

impl Joint {
    pub const COUNT: usize = 18;

    pub const ALL: [Joint; Self::COUNT] = {
        use Joint::*;
        [
            Hips,
            Spine,
            Neck,
            Head,
            LeftShoulder,
            LeftArm,
            LeftForeArm,
            LeftHand,
            RightShoulder,
            RightArm,
            RightForeArm,
            RightHand,
            LeftEye,
            RightEye,
            LeftUpperEyelid,
            LeftLowerEyelid,
            RightUpperEyelid,
            RightLowerEyelid,
        ]
    };
}

/// Structured events describing how a rig was bound. Purely informational.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    ChannelCoverage {
        bound: usize,
        total: usize,
        numeric_fallback: bool,
        unmatched: Vec<CanonicalChannel>,
    },
    SkeletonCoverage {
        bound: usize,
        total: usize,
        missing: Vec<Joint>,
    },
    RigBound {
        rig: RigId,
        morph_slots: usize,
        bones: usize,
    },
}

/// Receiver for [`Diagnostic`] events, injected into the resolvers and the
/// retargeter. Implementations must not feed anything back into retargeting.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, event: &Diagnostic);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _event: &Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frame_is_empty() {
        let frame = ExpressionFrame::default();
        assert!(frame.is_empty());
        assert!(frame.head.is_none());
        assert_eq!(frame, ExpressionFrame::new());
        assert_eq!(frame.get(CanonicalChannel::TongueOut), None);
    }

    #[test]
    fn test_channel_order_matches_names() {
        for (i, channel) in CanonicalChannel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
            assert_eq!(CanonicalChannel::from_name(channel.name()), Some(*channel));
        }
        assert_eq!(CanonicalChannel::try_from(17), Ok(CanonicalChannel::JawOpen));
        assert!(CanonicalChannel::try_from(CanonicalChannel::COUNT).is_err());
    }

    #[test]
    fn test_joint_order_matches_discriminants() {
        for (i, joint) in Joint::ALL.iter().enumerate() {
            assert_eq!(*joint as usize, i);
        }
    }

    #[test]
    fn test_frame_from_named_skips_unknown() {
        let frame = ExpressionFrame::from_named([("_neutral", 1.0), ("jawOpen", 0.4)]);
        assert_eq!(frame.get(CanonicalChannel::JawOpen), Some(0.4));
        assert_eq!(frame.iter().count(), 1);
        assert_eq!(frame.amplitude(CanonicalChannel::EyeBlinkLeft), 0.0);
    }

    #[test]
    fn test_frame_deserialize() {
        let json = r#"{"blendshapes":{"eyeBlinkLeft":0.9,"bogus":1.0},"head":{"pitch":0.1,"yaw":0.2,"roll":0.0}}"#;
        let frame: ExpressionFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.get(CanonicalChannel::EyeBlinkLeft), Some(0.9));
        assert_eq!(frame.head.map(|h| h.yaw), Some(0.2));
        assert!(!frame.is_empty());
    }
}
