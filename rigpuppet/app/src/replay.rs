//! Replays recorded perceiver output, one JSON object per line, through a
//! [`Retargeter`] and reports where the rig ended up.

use anyhow::{Context, Result};
use api::{ExpressionFrame, HeadRotation, LandmarkFrame, Rig};
use common::Retargeter;
use glam::Vec3;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One line of a recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    #[serde(default)]
    pub blendshapes: HashMap<String, f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<HeadRotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<LandmarkFrame>,
}

impl RecordedFrame {
    pub fn expression(&self) -> ExpressionFrame {
        let mut frame =
            ExpressionFrame::from_named(self.blendshapes.iter().map(|(k, v)| (k.as_str(), *v)));
        frame.head = self.head;
        frame
    }
}

/// Parses a recording. Blank lines and `#` comments are skipped.
pub fn read_frames<R: BufRead>(reader: R) -> Result<Vec<RecordedFrame>> {
    let mut frames = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", i + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let frame: RecordedFrame = serde_json::from_str(trimmed)
            .with_context(|| format!("Invalid frame on line {}", i + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

pub fn load_frames(path: &Path) -> Result<Vec<RecordedFrame>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open recording {:?}", path))?;
    read_frames(BufReader::new(file))
}

/// Final rig state after a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub rig: String,
    pub frames: usize,
    pub morphs: BTreeMap<String, f32>,
    /// Only bones that moved away from their rest rotation
    pub bones: BTreeMap<String, Vec3>,
}

pub fn replay(retargeter: &mut Retargeter, rig: &mut Rig, frames: &[RecordedFrame]) -> ReplaySummary {
    let rest: Vec<Vec3> = rig.skeleton().iter().map(|(_, b)| b.rotation).collect();

    for (i, frame) in frames.iter().enumerate() {
        let expression = frame.expression();
        if expression.is_empty() && expression.head.is_none() && frame.landmarks.is_none() {
            debug!("Frame {} carries no tracking data", i);
        }
        retargeter.step(rig, &expression, frame.landmarks.as_ref());
    }
    if frames.is_empty() {
        warn!("Recording has no frames");
    }

    let morphs = rig
        .morphs()
        .iter()
        .filter_map(|(name, slot)| rig.morph_state().get(slot).map(|w| (name.to_string(), w)))
        .collect();
    let bones = rig
        .skeleton()
        .iter()
        .zip(rest)
        .filter(|((_, bone), rest)| bone.rotation != *rest)
        .map(|((_, bone), _)| (bone.name.clone(), bone.rotation))
        .collect();

    ReplaySummary {
        rig: rig.name().to_string(),
        frames: frames.len(),
        morphs,
        bones,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{CanonicalChannel, PoseLandmark};

    #[test]
    fn test_reads_frames_and_skips_blank_lines() {
        let input = concat!(
            "# recorded at 30fps\n",
            "{\"blendshapes\": {\"jawOpen\": 0.5, \"_neutral\": 0.1}}\n",
            "\n",
            "{\"head\": {\"pitch\": 0.1, \"yaw\": 0.0, \"roll\": 0.0},",
            " \"landmarks\": {\"11\": {\"position\": [0.6, 0.4, 0.0], \"visibility\": 0.9}}}\n",
        );
        let frames = read_frames(input.as_bytes()).unwrap();
        assert_eq!(frames.len(), 2);

        let first = frames[0].expression();
        assert_eq!(first.get(CanonicalChannel::JawOpen), Some(0.5));
        assert_eq!(first.iter().count(), 1);

        let second = &frames[1];
        assert!(second.expression().is_empty());
        assert_eq!(second.head.unwrap().pitch, 0.1);
        let shoulder = second
            .landmarks
            .as_ref()
            .unwrap()
            .get(PoseLandmark::LeftShoulder)
            .unwrap();
        assert_eq!(shoulder.visibility, Some(0.9));
    }

    #[test]
    fn test_reports_bad_line_number() {
        let input = "{}\n{not json}\n";
        let err = read_frames(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
