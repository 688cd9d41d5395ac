use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::alias::{AliasResolver, ChannelBinding};
use crate::log_sink::LogSink;
use crate::retarget_trait::{FrameInput, RetargetStep};
use crate::skeleton::{SkeletonBinding, SkeletonResolver};
use crate::steps::{ExpressionStep, EyelidStep, GazeStep, HeadStep, PoseStep, Side};
use api::{
    CanonicalChannel, Diagnostic, DiagnosticSink, ExpressionFrame, Joint, LandmarkFrame, Rig,
    RigId,
};

/// Which rigging wins when a rig drives the eyes through both bones and morph
/// targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EyePrecedence {
    /// Bound eye/eyelid bones take over; their look/blink morph channels are unbound.
    #[default]
    #[serde(alias = "bones", alias = "PreferBones")]
    Bones,
    /// Bound look/blink morph channels take over; the matching bones are left alone.
    #[serde(alias = "morphs", alias = "PreferMorphs")]
    Morphs,
    /// Drive both, even if that doubles the motion.
    #[serde(alias = "both")]
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetConfig {
    /// Smoothing factor for ordinary expression channels, in (0, 1]
    pub base_factor: f32,
    /// Smoothing factor for blink/wide/squint; never below `base_factor`
    pub fast_factor: f32,
    pub gaze_factor: f32,
    pub eyelid_factor: f32,
    pub pose_factor: f32,
    pub head_factor: f32,

    /// Clamp finite amplitudes into [0, 1] before use
    pub clamp_amplitudes: bool,
    pub min_landmark_visibility: f32,
    /// The camera image is mirrored (selfie view)
    pub mirror_input: bool,

    #[serde(alias = "eye_mode")]
    pub eye_precedence: EyePrecedence,
}

impl Default for RetargetConfig {
    fn default() -> Self {
        Self {
            base_factor: 0.5,
            fast_factor: crate::steps::FAST_RESPONSE_FACTOR,
            gaze_factor: 0.25,
            eyelid_factor: 0.6,
            pose_factor: 0.3,
            head_factor: 0.4,
            clamp_amplitudes: true,
            min_landmark_visibility: 0.5,
            mirror_input: true,
            eye_precedence: EyePrecedence::default(),
        }
    }
}

impl RetargetConfig {
    /// Replaces out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        let fields: [(&str, &mut f32, f32); 6] = [
            ("base_factor", &mut self.base_factor, defaults.base_factor),
            ("fast_factor", &mut self.fast_factor, defaults.fast_factor),
            ("gaze_factor", &mut self.gaze_factor, defaults.gaze_factor),
            ("eyelid_factor", &mut self.eyelid_factor, defaults.eyelid_factor),
            ("pose_factor", &mut self.pose_factor, defaults.pose_factor),
            ("head_factor", &mut self.head_factor, defaults.head_factor),
        ];
        for (name, value, default) in fields {
            if !(*value > 0.0 && *value <= 1.0) {
                warn!("{} = {} is outside (0, 1], using {}", name, value, default);
                *value = default;
            }
        }

        if self.fast_factor < self.base_factor {
            debug!(
                "fast_factor {} raised to base_factor {}",
                self.fast_factor, self.base_factor
            );
            self.fast_factor = self.base_factor;
        }

        if !(0.0..=1.0).contains(&self.min_landmark_visibility) {
            warn!(
                "min_landmark_visibility = {} is outside [0, 1], using {}",
                self.min_landmark_visibility, defaults.min_landmark_visibility
            );
            self.min_landmark_visibility = defaults.min_landmark_visibility;
        }

        self
    }
}

/// Channel and skeleton bindings for one rig instance.
#[derive(Debug, Clone)]
pub struct Bindings {
    rig: RigId,
    pub channels: ChannelBinding,
    pub skeleton: SkeletonBinding,
    eye_bones: [bool; 2],
    eyelid_bones: [bool; 2],
}

fn eye_channels(side: Side) -> ([CanonicalChannel; 4], CanonicalChannel) {
    use CanonicalChannel::*;
    match side {
        Side::Left => (
            [EyeLookDownLeft, EyeLookInLeft, EyeLookOutLeft, EyeLookUpLeft],
            EyeBlinkLeft,
        ),
        Side::Right => (
            [EyeLookDownRight, EyeLookInRight, EyeLookOutRight, EyeLookUpRight],
            EyeBlinkRight,
        ),
    }
}

fn eye_joints(side: Side) -> (Joint, Joint) {
    match side {
        Side::Left => (Joint::LeftEye, Joint::LeftUpperEyelid),
        Side::Right => (Joint::RightEye, Joint::RightUpperEyelid),
    }
}

impl Bindings {
    pub fn build(rig: &Rig, precedence: EyePrecedence, sink: &dyn DiagnosticSink) -> Self {
        let mut channels = AliasResolver::new().resolve_with_sink(rig.morphs(), sink);
        let skeleton = SkeletonResolver::resolve_skeleton_with_sink(rig.skeleton(), sink);
        let mut eye_bones = [true; 2];
        let mut eyelid_bones = [true; 2];

        for side in Side::BOTH {
            let (looks, blink) = eye_channels(side);
            let (eye, upper_lid) = eye_joints(side);
            match precedence {
                EyePrecedence::Bones => {
                    if skeleton.is_bound(eye) {
                        looks.iter().for_each(|c| channels.unbind(*c));
                    }
                    if skeleton.is_bound(upper_lid) {
                        channels.unbind(blink);
                    }
                }
                EyePrecedence::Morphs => {
                    eye_bones[side as usize] = !looks.iter().any(|c| channels.is_bound(*c));
                    eyelid_bones[side as usize] = !channels.is_bound(blink);
                }
                EyePrecedence::Both => {}
            }
        }

        Self {
            rig: rig.id(),
            channels,
            skeleton,
            eye_bones,
            eyelid_bones,
        }
    }

    pub fn rig(&self) -> RigId {
        self.rig
    }

    pub fn drives_eye_bone(&self, side: Side) -> bool {
        self.eye_bones[side as usize]
    }

    pub fn drives_eyelid_bones(&self, side: Side) -> bool {
        self.eyelid_bones[side as usize]
    }
}

/// Per-rig-session retargeting: owns the bindings for the active rig and
/// runs every step once per tick.
pub struct Retargeter {
    pub config: RetargetConfig,
    steps: Vec<Box<dyn RetargetStep>>,
    bindings: Option<Bindings>,
    sink: Box<dyn DiagnosticSink>,
}

impl Retargeter {
    pub fn new(config: RetargetConfig) -> Self {
        let config = config.sanitized();
        let mut steps: Vec<Box<dyn RetargetStep>> = vec![
            Box::new(ExpressionStep::new(&config)),
            Box::new(GazeStep::new(&config)),
            Box::new(EyelidStep::new(&config)),
            Box::new(HeadStep::new(&config)),
            Box::new(PoseStep::new(&config)),
        ];
        steps.sort_by_key(|s| s.priority());

        Self {
            config,
            steps,
            bindings: None,
            sink: Box::new(LogSink),
        }
    }

    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Applies a new config to every step. Bindings are kept unless the eye
    /// precedence changed, in which case the next tick rebinds.
    pub fn reconfigure(&mut self, config: RetargetConfig) -> anyhow::Result<()> {
        let config = config.sanitized();
        for step in self.steps.iter_mut() {
            step.initialize(&config)?;
        }
        if config.eye_precedence != self.config.eye_precedence {
            self.invalidate();
        }
        self.config = config;
        Ok(())
    }

    pub fn add_step(&mut self, mut step: Box<dyn RetargetStep>) -> anyhow::Result<()> {
        step.initialize(&self.config)?;
        debug!("Adding retarget step {}", step.name());
        self.steps.push(step);
        self.steps.sort_by_key(|s| s.priority());
        Ok(())
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn bindings(&self) -> Option<&Bindings> {
        self.bindings.as_ref()
    }

    /// Drops the current bindings; the next [`Retargeter::step`] rebuilds them.
    pub fn invalidate(&mut self) {
        self.bindings = None;
    }

    /// Rebuilds both bindings for `rig` and resets its morph state to rest.
    pub fn bind(&mut self, rig: &mut Rig) -> &Bindings {
        self.bindings = None;
        let bindings = Bindings::build(rig, self.config.eye_precedence, self.sink.as_ref());
        rig.morph_state_mut().reset();

        self.sink.report(&Diagnostic::RigBound {
            rig: rig.id(),
            morph_slots: rig.morph_state().len(),
            bones: rig.skeleton().len(),
        });

        self.bindings.insert(bindings)
    }

    /// Runs one tick. Rebinds first when `rig` is not the rig the current
    /// bindings were built for.
    pub fn step(
        &mut self,
        rig: &mut Rig,
        expression: &ExpressionFrame,
        landmarks: Option<&LandmarkFrame>,
    ) {
        if self.bindings.as_ref().map(Bindings::rig) != Some(rig.id()) {
            self.bind(rig);
        }
        let Some(bindings) = self.bindings.as_ref() else {
            return;
        };

        let input = FrameInput {
            expression,
            landmarks,
        };
        for step in self.steps.iter_mut() {
            step.apply(&input, bindings, rig);
        }
    }
}

impl Default for Retargeter {
    fn default() -> Self {
        Self::new(RetargetConfig::default())
    }
}
