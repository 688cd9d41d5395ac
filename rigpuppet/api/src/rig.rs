use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RigError {
    #[error("bone {bone} ({name:?}) references missing parent {parent}")]
    MissingParent {
        bone: usize,
        name: String,
        parent: usize,
    },
    #[error("bone {bone} ({name:?}) is part of a parent cycle")]
    ParentCycle { bone: usize, name: String },
    #[error("morph target {name:?} is listed more than once")]
    DuplicateMorph { name: String },
    #[error("morph target {name:?} uses slot {slot}, the limit is {max}")]
    SlotOutOfRange { name: String, slot: usize, max: usize },
}

/// Highest morph slot index a catalog may use, plus one.
pub const MAX_MORPH_SLOTS: usize = 4096;

/// Identity of one loaded rig instance. Two loads of the same asset get
/// different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RigId(u64);

static NEXT_RIG_ID: AtomicU64 = AtomicU64::new(1);

impl RigId {
    fn next() -> Self {
        Self(NEXT_RIG_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for RigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rig#{}", self.0)
    }
}

/// Morph target names exposed by a rig, each with its slot index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RigMorphCatalog {
    entries: Vec<(String, usize)>,
}

impl RigMorphCatalog {
    /// Builds a catalog from `(name, slot)` pairs, keeping their order.
    pub fn new<I, S>(entries: I) -> Result<Self, RigError>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut out: Vec<(String, usize)> = Vec::new();
        for (name, slot) in entries {
            let name = name.into();
            if out.iter().any(|(n, _)| *n == name) {
                return Err(RigError::DuplicateMorph { name });
            }
            if slot >= MAX_MORPH_SLOTS {
                return Err(RigError::SlotOutOfRange {
                    name,
                    slot,
                    max: MAX_MORPH_SLOTS,
                });
            }
            out.push((name, slot));
        }
        Ok(Self { entries: out })
    }

    /// Catalog whose slots follow the order of `names`.
    pub fn from_names<I, S>(names: I) -> Result<Self, RigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().enumerate().map(|(i, n)| (n, i)))
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| *slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of slots the morph state needs to cover every entry.
    pub fn slot_count(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, slot)| slot.saturating_add(1))
            .max()
            .unwrap_or(0)
    }
}

/// Per-slot morph amplitudes, mutated in place every frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphState {
    weights: Vec<f32>,
}

impl MorphState {
    pub fn new(slots: usize) -> Self {
        Self {
            weights: vec![0.0; slots],
        }
    }

    pub fn get(&self, slot: usize) -> Option<f32> {
        self.weights.get(slot).copied()
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut f32> {
        self.weights.get_mut(slot)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn reset(&mut self) {
        self.weights.iter_mut().for_each(|w| *w = 0.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoneId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    #[serde(default)]
    pub parent: Option<BoneId>,
    /// Local Euler rotation (XYZ order) in radians.
    #[serde(default)]
    pub rotation: Vec3,
}

impl Bone {
    pub fn new(name: impl Into<String>, parent: Option<BoneId>) -> Self {
        Self {
            name: name.into(),
            parent,
            rotation: Vec3::ZERO,
        }
    }

    pub fn local_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }
}

/// Non-owning handle to a bone, resolved once when a rig is bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoneRef {
    pub id: BoneId,
    pub name: String,
    /// Slash-separated names from the root down to this bone.
    pub path: String,
}

/// Bone hierarchy owned by a rig.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    bones: Vec<Bone>,
    children: Vec<Vec<BoneId>>,
    roots: Vec<BoneId>,
}

impl Skeleton {
    pub fn new(bones: Vec<Bone>) -> Result<Self, RigError> {
        let mut children = vec![Vec::new(); bones.len()];
        let mut roots = Vec::new();

        for (i, bone) in bones.iter().enumerate() {
            match bone.parent {
                Some(BoneId(p)) if p >= bones.len() => {
                    return Err(RigError::MissingParent {
                        bone: i,
                        name: bone.name.clone(),
                        parent: p,
                    });
                }
                Some(BoneId(p)) => children[p].push(BoneId(i)),
                None => roots.push(BoneId(i)),
            }
        }

        let skeleton = Self {
            bones,
            children,
            roots,
        };

        // Every bone must be reachable from a root, otherwise it sits on a cycle.
        let mut seen = vec![false; skeleton.bones.len()];
        skeleton.walk(|id, _, _| seen[id.0] = true);
        if let Some(i) = seen.iter().position(|s| !s) {
            return Err(RigError::ParentCycle {
                bone: i,
                name: skeleton.bones[i].name.clone(),
            });
        }

        Ok(skeleton)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.0)
    }

    pub fn rotation(&self, id: BoneId) -> Option<Vec3> {
        self.bones.get(id.0).map(|b| b.rotation)
    }

    pub fn rotation_mut(&mut self, id: BoneId) -> Option<&mut Vec3> {
        self.bones.get_mut(id.0).map(|b| &mut b.rotation)
    }

    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.bones.iter().position(|b| b.name == name).map(BoneId)
    }

    /// Depth-first, parent-before-children visit. Siblings keep their
    /// declaration order.
    pub fn walk<F>(&self, mut visitor: F)
    where
        F: FnMut(BoneId, &Bone, usize),
    {
        let mut stack: Vec<(BoneId, usize)> = self.roots.iter().rev().map(|r| (*r, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            visitor(id, &self.bones[id.0], depth);
            stack.extend(self.children[id.0].iter().rev().map(|c| (*c, depth + 1)));
        }
    }

    pub fn traversal_order(&self) -> Vec<BoneId> {
        let mut order = Vec::with_capacity(self.bones.len());
        self.walk(|id, _, _| order.push(id));
        order
    }

    pub fn path(&self, id: BoneId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let bone = self.bones.get(c.0)?;
            names.push(bone.name.as_str());
            current = bone.parent;
        }
        names.reverse();
        Some(names.join("/"))
    }

    pub fn bone_ref(&self, id: BoneId) -> Option<BoneRef> {
        Some(BoneRef {
            id,
            name: self.bone(id)?.name.clone(),
            path: self.path(id)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (BoneId, &Bone)> {
        self.bones.iter().enumerate().map(|(i, b)| (BoneId(i), b))
    }
}

/// Write access to bone rotations that leaves the hierarchy untouched.
pub trait BoneRotations {
    fn rotation_mut(&mut self, id: BoneId) -> Option<&mut Vec3>;
}

impl BoneRotations for Skeleton {
    fn rotation_mut(&mut self, id: BoneId) -> Option<&mut Vec3> {
        Skeleton::rotation_mut(self, id)
    }
}

/// A loaded character: morph catalog, bone hierarchy and the morph amplitudes
/// the retargeter drives.
///
/// The hierarchy and catalog can only change through [`Rig::replace_skeleton`]
/// and [`Rig::replace_morphs`], both of which give the rig a new [`RigId`].
#[derive(Debug, Clone)]
pub struct Rig {
    id: RigId,
    name: String,
    morphs: RigMorphCatalog,
    skeleton: Skeleton,
    morph_state: MorphState,
}

impl Rig {
    pub fn new(name: impl Into<String>, morphs: RigMorphCatalog, skeleton: Skeleton) -> Self {
        let morph_state = MorphState::new(morphs.slot_count());
        Self {
            id: RigId::next(),
            name: name.into(),
            morphs,
            skeleton,
            morph_state,
        }
    }

    pub fn id(&self) -> RigId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn morphs(&self) -> &RigMorphCatalog {
        &self.morphs
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn morph_state(&self) -> &MorphState {
        &self.morph_state
    }

    /// Slots are looked up by index, so a swapped state can only drop
    /// writes. It cannot redirect them to other morph targets.
    pub fn morph_state_mut(&mut self) -> &mut MorphState {
        &mut self.morph_state
    }

    pub fn replace_skeleton(&mut self, skeleton: Skeleton) {
        self.skeleton = skeleton;
        self.id = RigId::next();
    }

    /// Swaps the catalog and zeroes every morph.
    pub fn replace_morphs(&mut self, morphs: RigMorphCatalog) {
        self.morph_state = MorphState::new(morphs.slot_count());
        self.morphs = morphs;
        self.id = RigId::next();
    }

    /// Current amplitude of the morph target called `name`.
    pub fn morph_weight(&self, name: &str) -> Option<f32> {
        self.morphs.get(name).and_then(|s| self.morph_state.get(s))
    }

    pub fn bone_rotation(&self, name: &str) -> Option<Vec3> {
        self.skeleton
            .find(name)
            .and_then(|id| self.skeleton.rotation(id))
    }
}

impl BoneRotations for Rig {
    fn rotation_mut(&mut self, id: BoneId) -> Option<&mut Vec3> {
        self.skeleton.rotation_mut(id)
    }
}
