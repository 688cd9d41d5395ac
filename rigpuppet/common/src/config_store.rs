use crate::RetargetConfig;
use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "config.json";

/// Retarget config backed by a JSON file.
pub struct ConfigStore {
    pub config: RetargetConfig,
    storage_path: PathBuf,
}

impl ConfigStore {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            config: RetargetConfig::default(),
            storage_path: storage_path.into(),
        }
    }

    pub fn in_dir(storage_dir: &Path) -> Self {
        Self::new(storage_dir.join(CONFIG_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config dir: {:?}", parent))?;
            }
        }
        let file = File::create(&self.storage_path)
            .with_context(|| format!("Failed to create config file {:?}", self.storage_path))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.config)
            .context("Failed to serialize config")?;
        info!("Saved config to {:?}", self.storage_path);
        Ok(())
    }

    /// Loads the file, or writes the defaults there when it does not exist.
    pub fn load(&mut self) -> Result<&RetargetConfig> {
        if !self.storage_path.exists() {
            info!(
                "Config not found. Creating default at {:?}",
                self.storage_path
            );
            self.config = RetargetConfig::default();
            self.save()?;
            return Ok(&self.config);
        }

        info!("Loading config from {:?}", self.storage_path);
        let file = File::open(&self.storage_path)
            .with_context(|| format!("Failed to open config file {:?}", self.storage_path))?;
        let config: RetargetConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file {:?}", self.storage_path))?;

        self.config = config.sanitized();
        Ok(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EyePrecedence;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rigpuppet_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file_creates_defaults() {
        let dir = scratch_dir("config_default");
        let mut store = ConfigStore::in_dir(&dir);
        assert_eq!(*store.load().unwrap(), RetargetConfig::default());
        assert!(store.path().exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_partial_file_is_sanitized() {
        let dir = scratch_dir("config_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILENAME);
        std::fs::write(&path, r#"{ "base_factor": 4.0, "eye_mode": "morphs" }"#).unwrap();

        let mut store = ConfigStore::new(&path);
        let config = store.load().unwrap();
        assert_eq!(config.base_factor, 0.5);
        assert_eq!(config.eye_precedence, EyePrecedence::Morphs);
        assert_eq!(config.gaze_factor, 0.25);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
