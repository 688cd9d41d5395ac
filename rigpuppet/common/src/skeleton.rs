//! Binding of canonical joints onto a rig's bone hierarchy by name patterns.

use api::{BoneId, BoneRef, Diagnostic, DiagnosticSink, Joint, NullSink, Skeleton};

struct JointPattern {
    joint: Joint,
    include: &'static [&'static str],
    exclude: &'static [&'static str],
}

// Lowercase substrings covering Mixamo, VRM, Unreal, Rigify, Character
// Creator and plain "LeftUpperArm" style names. Earlier patterns win.
const JOINT_PATTERNS: &[JointPattern] = &[
    JointPattern {
        joint: Joint::Hips,
        include: &["hips", "pelvis"],
        exclude: &[],
    },
    JointPattern {
        joint: Joint::Spine,
        include: &["spine"],
        exclude: &[],
    },
    JointPattern {
        joint: Joint::Neck,
        include: &["neck"],
        exclude: &[],
    },
    JointPattern {
        joint: Joint::Head,
        include: &["head"],
        exclude: &["top", "end", "nub"],
    },
    JointPattern {
        joint: Joint::LeftShoulder,
        include: &[
            "leftshoulder",
            "l_shoulder",
            "shoulder_l",
            "shoulder.l",
            "clavicle_l",
            "l_clavicle",
            "clavicle.l",
        ],
        exclude: &[],
    },
    JointPattern {
        joint: Joint::RightShoulder,
        include: &[
            "rightshoulder",
            "r_shoulder",
            "shoulder_r",
            "shoulder.r",
            "clavicle_r",
            "r_clavicle",
            "clavicle.r",
        ],
        exclude: &[],
    },
    JointPattern {
        joint: Joint::LeftArm,
        include: &[
            "leftupperarm",
            "leftarm",
            "l_upperarm",
            "upperarm_l",
            "upper_arm.l",
            "upper_arm_l",
            "upperarm.l",
        ],
        exclude: &["twist"],
    },
    JointPattern {
        joint: Joint::RightArm,
        include: &[
            "rightupperarm",
            "rightarm",
            "r_upperarm",
            "upperarm_r",
            "upper_arm.r",
            "upper_arm_r",
            "upperarm.r",
        ],
        exclude: &["twist"],
    },
    JointPattern {
        joint: Joint::LeftForeArm,
        include: &[
            "leftforearm",
            "leftlowerarm",
            "l_forearm",
            "l_lowerarm",
            "lowerarm_l",
            "forearm_l",
            "forearm.l",
            "lower_arm.l",
        ],
        exclude: &["twist"],
    },
    JointPattern {
        joint: Joint::RightForeArm,
        include: &[
            "rightforearm",
            "rightlowerarm",
            "r_forearm",
            "r_lowerarm",
            "lowerarm_r",
            "forearm_r",
            "forearm.r",
            "lower_arm.r",
        ],
        exclude: &["twist"],
    },
    JointPattern {
        joint: Joint::LeftHand,
        include: &["lefthand", "l_hand", "hand_l", "hand.l"],
        exclude: &[],
    },
    JointPattern {
        joint: Joint::RightHand,
        include: &["righthand", "r_hand", "hand_r", "hand.r"],
        exclude: &[],
    },
    JointPattern {
        joint: Joint::LeftEye,
        include: &[
            "lefteye",
            "eyeleft",
            "eye_left",
            "l_faceeye",
            "l_eye",
            "eye_l",
            "eye.l",
        ],
        exclude: &["lid", "brow", "lash", "look"],
    },
    JointPattern {
        joint: Joint::RightEye,
        include: &[
            "righteye",
            "eyeright",
            "eye_right",
            "r_faceeye",
            "r_eye",
            "eye_r",
            "eye.r",
        ],
        exclude: &["lid", "brow", "lash", "look"],
    },
    JointPattern {
        joint: Joint::LeftUpperEyelid,
        include: &[
            "lefteyelidupper",
            "lefteyelid_upper",
            "eyelid_upper_l",
            "eyelidupper_l",
            "upper_eyelid_l",
            "uppereyelid_l",
            "l_uppereyelid",
            "l_eyelid_upper",
            "upperlid_l",
            "l_upperlid",
            "lid_upper_l",
            "upperlid.l",
            "lid.t.l",
        ],
        exclude: &[],
    },
    JointPattern {
        joint: Joint::LeftLowerEyelid,
        include: &[
            "lefteyelidlower",
            "lefteyelid_lower",
            "eyelid_lower_l",
            "eyelidlower_l",
            "lower_eyelid_l",
            "lowereyelid_l",
            "l_lowereyelid",
            "l_eyelid_lower",
            "lowerlid_l",
            "l_lowerlid",
            "lid_lower_l",
            "lowerlid.l",
            "lid.b.l",
        ],
        exclude: &[],
    },
    JointPattern {
        joint: Joint::RightUpperEyelid,
        include: &[
            "righteyelidupper",
            "righteyelid_upper",
            "eyelid_upper_r",
            "eyelidupper_r",
            "upper_eyelid_r",
            "uppereyelid_r",
            "r_uppereyelid",
            "r_eyelid_upper",
            "upperlid_r",
            "r_upperlid",
            "lid_upper_r",
            "upperlid.r",
            "lid.t.r",
        ],
        exclude: &[],
    },
    JointPattern {
        joint: Joint::RightLowerEyelid,
        include: &[
            "righteyelidlower",
            "righteyelid_lower",
            "eyelid_lower_r",
            "eyelidlower_r",
            "lower_eyelid_r",
            "lowereyelid_r",
            "r_lowereyelid",
            "r_eyelid_lower",
            "lowerlid_r",
            "r_lowerlid",
            "lid_lower_r",
            "lowerlid.r",
            "lid.b.r",
        ],
        exclude: &[],
    },
];

/// Bone per canonical joint for one rig. Joints without a match are `None`
/// and every step that needs them is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkeletonBinding {
    bones: [Option<BoneRef>; Joint::COUNT],
}

impl SkeletonBinding {
    pub fn get(&self, joint: Joint) -> Option<&BoneRef> {
        self.bones[joint as usize].as_ref()
    }

    pub fn id(&self, joint: Joint) -> Option<BoneId> {
        self.get(joint).map(|b| b.id)
    }

    pub fn is_bound(&self, joint: Joint) -> bool {
        self.bones[joint as usize].is_some()
    }

    pub fn len(&self) -> usize {
        self.bones.iter().filter(|b| b.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn missing(&self) -> Vec<Joint> {
        Joint::ALL
            .iter()
            .copied()
            .filter(|j| !self.is_bound(*j))
            .collect()
    }
}

pub struct SkeletonResolver;

impl SkeletonResolver {
    /// Resolves joints over bones given in traversal order. The bone name
    /// doubles as its lookup path.
    pub fn resolve<'a, I>(bones: I) -> SkeletonBinding
    where
        I: IntoIterator<Item = (BoneId, &'a str)>,
    {
        let refs: Vec<BoneRef> = bones
            .into_iter()
            .map(|(id, name)| BoneRef {
                id,
                name: name.to_string(),
                path: name.to_string(),
            })
            .collect();
        Self::bind(&refs)
    }

    pub fn resolve_skeleton(skeleton: &Skeleton) -> SkeletonBinding {
        Self::resolve_skeleton_with_sink(skeleton, &NullSink)
    }

    pub fn resolve_skeleton_with_sink(
        skeleton: &Skeleton,
        sink: &dyn DiagnosticSink,
    ) -> SkeletonBinding {
        let refs: Vec<BoneRef> = skeleton
            .traversal_order()
            .into_iter()
            .filter_map(|id| skeleton.bone_ref(id))
            .collect();
        let binding = Self::bind(&refs);

        sink.report(&Diagnostic::SkeletonCoverage {
            bound: binding.len(),
            total: Joint::COUNT,
            missing: binding.missing(),
        });

        binding
    }

    fn bind(refs: &[BoneRef]) -> SkeletonBinding {
        let lowered: Vec<String> = refs.iter().map(|r| r.name.to_lowercase()).collect();
        let mut binding = SkeletonBinding::default();

        for pattern in JOINT_PATTERNS {
            let hit = pattern.include.iter().find_map(|needle| {
                lowered.iter().position(|name| {
                    name.contains(needle) && !pattern.exclude.iter().any(|x| name.contains(x))
                })
            });
            binding.bones[pattern.joint as usize] = hit.map(|i| refs[i].clone());
        }

        binding
    }
}
