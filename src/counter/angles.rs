use nalgebra::Vector3;

use crate::error::Result;
use crate::geometry::coordinates_to_angle;
use crate::pose::Landmark;

/// 隣接セグメント対の角度行（度、0方向に切り捨て済み）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AngleRow {
    pub gamma: i32,
    pub beta: i32,
    pub alpha: i32,
    /// 切り捨て前の (gamma, beta, alpha) のノルム
    pub norm: i32,
}

impl AngleRow {
    pub fn new(gamma: i32, beta: i32, alpha: i32, norm: i32) -> Self {
        Self { gamma, beta, alpha, norm }
    }

    pub fn from_array(values: [i32; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    /// `[gamma, beta, alpha, norm]`
    pub fn values(&self) -> [i32; 4] {
        [self.gamma, self.beta, self.alpha, self.norm]
    }
}

/// 1フレームの 4 角度行
///
/// 固定順: [左 胴体/大腿, 左 大腿/下腿, 右 胴体/大腿, 右 大腿/下腿]
pub type JointAngles = [AngleRow; 4];

/// 8 関節（肩・腰・膝・足首 × 左右）から 4 角度行を計算する
pub fn extract_joint_angles(joints: &[Landmark; 8]) -> Result<JointAngles> {
    let p: [Vector3<f32>; 8] = std::array::from_fn(|i| joints[i].position());

    let segment_pairs = [
        (p[1] - p[0], p[2] - p[1]),
        (p[2] - p[1], p[3] - p[2]),
        (p[5] - p[4], p[6] - p[5]),
        (p[6] - p[5], p[7] - p[6]),
    ];

    let mut rows = [AngleRow::default(); 4];
    for (row, (a, b)) in rows.iter_mut().zip(segment_pairs.iter()) {
        *row = AngleRow::from_array(coordinates_to_angle(a, b)?);
    }
    Ok(rows)
}
