use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// BlazePose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
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

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    const ALL: [LandmarkIndex; Self::COUNT] = {
        use LandmarkIndex::*;
        [
            Nose, LeftEyeInner, LeftEye, LeftEyeOuter, RightEyeInner, RightEye, RightEyeOuter,
            LeftEar, RightEar, MouthLeft, MouthRight, LeftShoulder, RightShoulder, LeftElbow,
            RightElbow, LeftWrist, RightWrist, LeftPinky, RightPinky, LeftIndex, RightIndex,
            LeftThumb, RightThumb, LeftHip, RightHip, LeftKnee, RightKnee, LeftAnkle, RightAnkle,
            LeftHeel, RightHeel, LeftFootIndex, RightFootIndex,
        ]
    };

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// カウンタが参照する 8 関節（左脚 → 右脚、近位 → 遠位）
///
/// 肩はヒップセグメントの始点として使う。
pub const TRACKED_JOINTS: [LandmarkIndex; 8] = [
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::LeftHip,
    LandmarkIndex::LeftKnee,
    LandmarkIndex::LeftAnkle,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::RightHip,
    LandmarkIndex::RightKnee,
    LandmarkIndex::RightAnkle,
];

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// 可視度 (0.0〜1.0)。推論側が出さない場合は None
    #[serde(default)]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: Option<f32>) -> Self {
        Self { x, y, z, visibility }
    }

    /// 可視度（欠損は 0.0 扱い）
    pub fn visibility_or_zero(&self) -> f32 {
        self.visibility.unwrap_or(0.0)
    }

    /// 可視度が閾値を超えるか
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility_or_zero() > threshold
    }

    pub fn position(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// 一人分のランドマーク列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub landmarks: Vec<Landmark>,
}

impl Pose {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn get(&self, index: LandmarkIndex) -> Option<&Landmark> {
        self.landmarks.get(index as usize)
    }

    /// 追跡 8 関節を取り出す。欠けていれば None
    pub fn tracked_joints(&self) -> Option<[Landmark; 8]> {
        let mut joints = [Landmark::default(); 8];
        for (slot, index) in joints.iter_mut().zip(TRACKED_JOINTS) {
            *slot = *self.get(index)?;
        }
        Some(joints)
    }
}

/// 1フレーム分の推論結果（検出人数 0 人以上）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    #[serde(default)]
    pub poses: Vec<Pose>,
}

impl PoseFrame {
    pub fn new(poses: Vec<Pose>) -> Self {
        Self { poses }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// 先頭の人物の追跡関節。複数人は扱わない
    pub fn tracked_joints(&self) -> Option<[Landmark; 8]> {
        self.poses.first()?.tracked_joints()
    }
}
