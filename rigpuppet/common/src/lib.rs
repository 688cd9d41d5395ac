pub use api::{
    Bone, BoneId, BoneRef, BoneRotations, CanonicalChannel, Diagnostic, DiagnosticSink,
    ExpressionFrame, HeadRotation, Joint, Landmark, LandmarkFrame, MorphState, NullSink,
    PoseLandmark, Rig, RigError, RigId, RigMorphCatalog, Skeleton,
};

pub mod alias;
mod config_store;
mod log_sink;
pub mod retarget_trait;
mod retargeter;
pub mod skeleton;
pub mod steps;

pub use alias::{AliasResolver, ChannelBinding};
pub use config_store::{ConfigStore, CONFIG_FILENAME};
pub use log_sink::LogSink;
pub use retarget_trait::{FrameInput, RetargetStep};
pub use retargeter::{Bindings, EyePrecedence, RetargetConfig, Retargeter};
pub use skeleton::{SkeletonBinding, SkeletonResolver};
pub use steps::Side;
