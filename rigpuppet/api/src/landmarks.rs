use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body landmark indices of the 33-point pose topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    pub const COUNT: usize = 33;

    /// The same anatomical point on the other side of the body.
    pub fn opposite(self) -> Self {
        use PoseLandmark::*;
        match self {
            LeftEyeInner => RightEyeInner,
            LeftEye => RightEye,
            LeftEyeOuter => RightEyeOuter,
            RightEyeInner => LeftEyeInner,
            RightEye => LeftEye,
            RightEyeOuter => LeftEyeOuter,
            LeftEar => RightEar,
            RightEar => LeftEar,
            MouthLeft => MouthRight,
            MouthRight => MouthLeft,
            LeftShoulder => RightShoulder,
            RightShoulder => LeftShoulder,
            LeftElbow => RightElbow,
            RightElbow => LeftElbow,
            LeftWrist => RightWrist,
            RightWrist => LeftWrist,
            LeftPinky => RightPinky,
            RightPinky => LeftPinky,
            LeftIndex => RightIndex,
            RightIndex => LeftIndex,
            LeftThumb => RightThumb,
            RightThumb => LeftThumb,
            LeftHip => RightHip,
            RightHip => LeftHip,
            LeftKnee => RightKnee,
            RightKnee => LeftKnee,
            LeftAnkle => RightAnkle,
            RightAnkle => LeftAnkle,
            LeftHeel => RightHeel,
            RightHeel => LeftHeel,
            LeftFootIndex => RightFootIndex,
            RightFootIndex => LeftFootIndex,
            Nose => Nose,
        }
    }
}

/// Estimated position of one landmark in normalized camera space
/// (x to the right, y down, z toward the camera).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub position: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            visibility: None,
        }
    }

    pub fn with_visibility(position: Vec3, visibility: f32) -> Self {
        Self {
            position,
            visibility: Some(visibility),
        }
    }

    /// A landmark without a visibility estimate counts as visible.
    pub fn is_visible(&self, min_visibility: f32) -> bool {
        self.visibility.map_or(true, |v| v >= min_visibility)
    }
}

/// Sparse set of body landmarks for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<usize, Landmark>", into = "HashMap<usize, Landmark>")]
pub struct LandmarkFrame {
    points: [Option<Landmark>; PoseLandmark::COUNT],
}

impl Default for LandmarkFrame {
    fn default() -> Self {
        Self {
            points: [None; PoseLandmark::COUNT],
        }
    }
}

impl LandmarkFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, index: PoseLandmark, landmark: Landmark) {
        self.points[index as usize] = Some(landmark);
    }

    pub fn with(mut self, index: PoseLandmark, position: Vec3) -> Self {
        self.set(index, Landmark::new(position));
        self
    }

    pub fn remove(&mut self, index: PoseLandmark) -> Option<Landmark> {
        self.points[index as usize].take()
    }

    pub fn get(&self, index: PoseLandmark) -> Option<&Landmark> {
        self.points[index as usize].as_ref()
    }

    /// Position of `index` if present and at least `min_visibility` visible.
    pub fn visible_position(&self, index: PoseLandmark, min_visibility: f32) -> Option<Vec3> {
        self.get(index)
            .filter(|l| l.is_visible(min_visibility))
            .map(|l| l.position)
    }

    /// Horizontally mirrored copy: x is negated and left/right labels swap.
    pub fn mirrored(&self) -> Self {
        let mut out = Self::default();
        for (i, slot) in self.points.iter().enumerate() {
            if let Some(landmark) = slot {
                let index = index_to_landmark(i).opposite();
                let mut moved = *landmark;
                moved.position.x = -moved.position.x;
                out.points[index as usize] = Some(moved);
            }
        }
        out
    }
}

fn index_to_landmark(i: usize) -> PoseLandmark {
    // PoseLandmark is contiguous from 0, and callers only pass array indices
    // below COUNT.
    const ALL: [PoseLandmark; PoseLandmark::COUNT] = {
        use PoseLandmark::*;
        [
            Nose,
            LeftEyeInner,
            LeftEye,
            LeftEyeOuter,
            RightEyeInner,
            RightEye,
            RightEyeOuter,
            LeftEar,
            RightEar,
            MouthLeft,
            MouthRight,
            LeftShoulder,
            RightShoulder,
            LeftElbow,
            RightElbow,
            LeftWrist,
            RightWrist,
            LeftPinky,
            RightPinky,
            LeftIndex,
            RightIndex,
            LeftThumb,
            RightThumb,
            LeftHip,
            RightHip,
            LeftKnee,
            RightKnee,
            LeftAnkle,
            RightAnkle,
            LeftHeel,
            RightHeel,
            LeftFootIndex,
            RightFootIndex,
        ]
    };
    ALL[i]
}

impl From<HashMap<usize, Landmark>> for LandmarkFrame {
    fn from(map: HashMap<usize, Landmark>) -> Self {
        let mut frame = Self::default();
        for (index, landmark) in map {
            if index < PoseLandmark::COUNT {
                frame.points[index] = Some(landmark);
            } else {
                log::warn!("Dropping landmark with out-of-range index {}", index);
            }
        }
        frame
    }
}

impl From<LandmarkFrame> for HashMap<usize, Landmark> {
    fn from(frame: LandmarkFrame) -> Self {
        frame
            .points
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.map(|l| (i, l)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frame_has_no_points() {
        let frame = LandmarkFrame::default();
        assert!(frame.get(PoseLandmark::Nose).is_none());
        assert!(frame.get(PoseLandmark::RightFootIndex).is_none());
        assert_eq!(frame, LandmarkFrame::new());
    }

    #[test]
    fn test_mirrored_swaps_labels_and_negates_x() {
        let frame = LandmarkFrame::new().with(PoseLandmark::LeftElbow, Vec3::new(0.3, 0.5, -0.1));
        let mirrored = frame.mirrored();
        assert!(mirrored.get(PoseLandmark::LeftElbow).is_none());
        let moved = mirrored.get(PoseLandmark::RightElbow).unwrap();
        assert_eq!(moved.position, Vec3::new(-0.3, 0.5, -0.1));
    }

    #[test]
    fn test_visibility_threshold() {
        let mut frame = LandmarkFrame::new();
        frame.set(
            PoseLandmark::Nose,
            Landmark::with_visibility(Vec3::ZERO, 0.2),
        );
        assert!(frame.visible_position(PoseLandmark::Nose, 0.5).is_none());
        assert!(frame.visible_position(PoseLandmark::Nose, 0.1).is_some());
    }

    #[test]
    fn test_deserialize_sparse_indices() {
        let json = r#"{"11":{"position":[0.1,0.2,0.0],"visibility":0.9},"99":{"position":[0,0,0]}}"#;
        let frame: LandmarkFrame = serde_json::from_str(json).unwrap();
        let shoulder = frame.get(PoseLandmark::LeftShoulder).unwrap();
        assert_eq!(shoulder.position, Vec3::new(0.1, 0.2, 0.0));
        assert_eq!(shoulder.visibility, Some(0.9));
    }
}
