use api::{Bone, BoneId, Joint, Skeleton};
use common::SkeletonResolver;

/// Builds a skeleton from `(name, parent index)` pairs.
fn skeleton(bones: &[(&str, Option<usize>)]) -> Skeleton {
    Skeleton::new(
        bones
            .iter()
            .map(|(name, parent)| Bone::new(*name, parent.map(BoneId)))
            .collect(),
    )
    .unwrap()
}

#[test]
fn test_mixamo_rig() {
    let skeleton = skeleton(&[
        ("mixamorig:Hips", None),
        ("mixamorig:Spine", Some(0)),
        ("mixamorig:Spine1", Some(1)),
        ("mixamorig:Neck", Some(2)),
        ("mixamorig:Head", Some(3)),
        ("mixamorig:HeadTop_End", Some(4)),
        ("mixamorig:LeftEye", Some(4)),
        ("mixamorig:RightEye", Some(4)),
        ("mixamorig:LeftShoulder", Some(2)),
        ("mixamorig:LeftArm", Some(8)),
        ("mixamorig:LeftForeArm", Some(9)),
        ("mixamorig:LeftHand", Some(10)),
        ("mixamorig:RightShoulder", Some(2)),
        ("mixamorig:RightArm", Some(12)),
        ("mixamorig:RightForeArm", Some(13)),
        ("mixamorig:RightHand", Some(14)),
    ]);
    let binding = SkeletonResolver::resolve_skeleton(&skeleton);

    let name = |joint| binding.get(joint).map(|b| b.name.as_str());
    assert_eq!(name(Joint::Hips), Some("mixamorig:Hips"));
    assert_eq!(name(Joint::Spine), Some("mixamorig:Spine"));
    assert_eq!(name(Joint::Head), Some("mixamorig:Head"));
    assert_eq!(name(Joint::LeftArm), Some("mixamorig:LeftArm"));
    assert_eq!(name(Joint::LeftForeArm), Some("mixamorig:LeftForeArm"));
    assert_eq!(name(Joint::RightForeArm), Some("mixamorig:RightForeArm"));
    assert_eq!(name(Joint::RightEye), Some("mixamorig:RightEye"));

    assert_eq!(
        binding.missing(),
        vec![
            Joint::LeftUpperEyelid,
            Joint::LeftLowerEyelid,
            Joint::RightUpperEyelid,
            Joint::RightLowerEyelid,
        ]
    );
}

#[test]
fn test_vrm_rig_with_eyelids() {
    let skeleton = skeleton(&[
        ("J_Bip_C_Hips", None),
        ("J_Bip_C_Spine", Some(0)),
        ("J_Bip_C_Neck", Some(1)),
        ("J_Bip_C_Head", Some(2)),
        ("J_Adj_L_FaceEye", Some(3)),
        ("J_Adj_R_FaceEye", Some(3)),
        ("Eyelid_Upper_L", Some(3)),
        ("Eyelid_Lower_L", Some(3)),
        ("J_Bip_L_UpperArm", Some(1)),
        ("J_Bip_L_LowerArm", Some(8)),
    ]);
    let binding = SkeletonResolver::resolve_skeleton(&skeleton);

    assert_eq!(binding.id(Joint::LeftEye), Some(BoneId(4)));
    assert_eq!(binding.id(Joint::RightEye), Some(BoneId(5)));
    assert_eq!(binding.id(Joint::LeftUpperEyelid), Some(BoneId(6)));
    assert_eq!(binding.id(Joint::LeftLowerEyelid), Some(BoneId(7)));
    assert_eq!(binding.id(Joint::LeftArm), Some(BoneId(8)));
    assert_eq!(binding.id(Joint::LeftForeArm), Some(BoneId(9)));
    assert!(binding.id(Joint::RightUpperEyelid).is_none());
}

#[test]
fn test_depth_first_order_decides_ties() {
    // Both candidates match "neck"; the one reached first depth-first wins,
    // regardless of where it sits in the bone list.
    let skeleton = skeleton(&[
        ("Root", None),
        ("Spine", Some(0)),
        ("Hair", Some(0)),
        ("NeckTwist", Some(2)),
        ("Neck", Some(1)),
    ]);
    let binding = SkeletonResolver::resolve_skeleton(&skeleton);
    let neck = binding.get(Joint::Neck).unwrap();
    assert_eq!(neck.name, "Neck");
    assert_eq!(neck.path, "Root/Spine/Neck");
}

#[test]
fn test_twist_bones_are_not_arms() {
    let skeleton = skeleton(&[
        ("upperarm_twist_01_l", None),
        ("upperarm_l", None),
        ("lowerarm_twist_01_l", None),
        ("lowerarm_l", None),
    ]);
    let binding = SkeletonResolver::resolve_skeleton(&skeleton);
    assert_eq!(binding.get(Joint::LeftArm).unwrap().name, "upperarm_l");
    assert_eq!(binding.get(Joint::LeftForeArm).unwrap().name, "lowerarm_l");
}

#[test]
fn test_unrecognised_rig_binds_nothing() {
    let skeleton = skeleton(&[("Bone", None), ("Bone.001", Some(0))]);
    let binding = SkeletonResolver::resolve_skeleton(&skeleton);
    assert!(binding.is_empty());
    assert_eq!(binding.missing().len(), Joint::COUNT);
}
