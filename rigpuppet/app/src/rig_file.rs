//! JSON description of a rig: morph target names and a named bone hierarchy.

use anyhow::{bail, Context, Result};
use api::{Bone, BoneId, Rig, RigMorphCatalog, Skeleton};
use glam::Vec3;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MorphEntry {
    /// Slot follows the entry's position in the list
    Name(String),
    Slot { name: String, slot: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub rotation: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub morphs: Vec<MorphEntry>,
    /// Parents may appear before or after their children
    #[serde(default)]
    pub bones: Vec<BoneEntry>,
}

impl RigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open rig file {:?}", path))?;
        let mut rig: RigFile = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse rig file {:?}", path))?;
        if rig.name.is_empty() {
            rig.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("rig")
                .to_string();
        }
        Ok(rig)
    }

    pub fn catalog(&self) -> Result<RigMorphCatalog> {
        let entries = self.morphs.iter().enumerate().map(|(i, entry)| match entry {
            MorphEntry::Name(name) => (name.clone(), i),
            MorphEntry::Slot { name, slot } => (name.clone(), *slot),
        });
        RigMorphCatalog::new(entries).context("Invalid morph list")
    }

    pub fn skeleton(&self) -> Result<Skeleton> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, bone) in self.bones.iter().enumerate() {
            if index.insert(bone.name.as_str(), i).is_some() {
                bail!("Duplicate bone name {:?}", bone.name);
            }
        }

        let bones = self
            .bones
            .iter()
            .map(|entry| {
                let parent = match entry.parent.as_deref() {
                    Some(parent) => match index.get(parent) {
                        Some(i) => Some(BoneId(*i)),
                        None => bail!("Bone {:?} has unknown parent {:?}", entry.name, parent),
                    },
                    None => None,
                };
                let mut bone = Bone::new(entry.name.clone(), parent);
                bone.rotation = entry.rotation;
                Ok(bone)
            })
            .collect::<Result<Vec<_>>>()?;

        Skeleton::new(bones).context("Invalid bone hierarchy")
    }

    pub fn into_rig(self) -> Result<Rig> {
        let rig = Rig::new(self.name.clone(), self.catalog()?, self.skeleton()?);
        info!(
            "Loaded rig {:?}: {} morphs, {} bones",
            rig.name(),
            rig.morphs().len(),
            rig.skeleton().len()
        );
        Ok(rig)
    }
}
