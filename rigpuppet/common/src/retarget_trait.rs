use crate::retargeter::{Bindings, RetargetConfig};
use api::{ExpressionFrame, LandmarkFrame, Rig};
use anyhow::Result;

/// Everything the perceiver produced for one tick.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub expression: &'a ExpressionFrame,
    pub landmarks: Option<&'a LandmarkFrame>,
}

pub trait RetargetStep: Send + Sync {
    /// Pick up factors and switches from the current config
    fn initialize(&mut self, config: &RetargetConfig) -> Result<()>;

    /// Write this tick's contribution into the rig in-place. Must not block
    /// or allocate.
    fn apply(&mut self, input: &FrameInput<'_>, bindings: &Bindings, rig: &mut Rig);

    /// Unique identifier for this step (e.g., "Expression", "Pose")
    fn name(&self) -> &str;

    /// Steps run in ascending priority
    fn priority(&self) -> i32 {
        0
    }
}
