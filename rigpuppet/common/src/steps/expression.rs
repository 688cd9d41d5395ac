use super::{approach, sanitize_amplitude};
use crate::alias::ChannelBinding;
use crate::retarget_trait::{FrameInput, RetargetStep};
use crate::retargeter::{Bindings, RetargetConfig};
use api::{CanonicalChannel, ExpressionFrame, MorphState, Rig};
use anyhow::Result;

/// Default smoothing factor for blink, wide and squint channels.
pub const FAST_RESPONSE_FACTOR: f32 = 0.85;

/// Exponential smoothing of bound channels into the rig's morph weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpressionSmoother {
    pub fast_factor: f32,
    pub clamp: bool,
}

impl Default for ExpressionSmoother {
    fn default() -> Self {
        Self {
            fast_factor: FAST_RESPONSE_FACTOR,
            clamp: true,
        }
    }
}

impl ExpressionSmoother {
    pub fn new(fast_factor: f32, clamp: bool) -> Self {
        Self { fast_factor, clamp }
    }

    pub fn effective_factor(&self, channel: CanonicalChannel, base_factor: f32) -> f32 {
        if channel.is_fast_response() {
            self.fast_factor.max(base_factor)
        } else {
            base_factor
        }
    }

    /// Moves every bound slot toward this frame's amplitude. Channels absent
    /// from the frame decay toward 0; unbound channels and slots outside
    /// `state` are ignored. Factors are limited to [0, 1], so a weight never
    /// passes its target.
    pub fn step(
        &self,
        frame: &ExpressionFrame,
        binding: &ChannelBinding,
        state: &mut MorphState,
        base_factor: f32,
    ) {
        for (channel, slot) in binding.iter() {
            let Some(weight) = state.get_mut(slot) else {
                continue;
            };
            let target = sanitize_amplitude(frame.amplitude(channel), self.clamp);
            approach(weight, target, self.effective_factor(channel, base_factor));
        }
    }
}

pub struct ExpressionStep {
    smoother: ExpressionSmoother,
    base_factor: f32,
}

impl ExpressionStep {
    pub fn new(config: &RetargetConfig) -> Self {
        Self {
            smoother: ExpressionSmoother::new(config.fast_factor, config.clamp_amplitudes),
            base_factor: config.base_factor,
        }
    }
}

impl RetargetStep for ExpressionStep {
    fn initialize(&mut self, config: &RetargetConfig) -> Result<()> {
        *self = Self::new(config);
        Ok(())
    }

    fn apply(&mut self, input: &FrameInput<'_>, bindings: &Bindings, rig: &mut Rig) {
        self.smoother.step(
            input.expression,
            &bindings.channels,
            rig.morph_state_mut(),
            self.base_factor,
        );
    }

    fn name(&self) -> &str {
        "Expression"
    }
}
