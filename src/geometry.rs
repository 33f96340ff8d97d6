//! ベクトル・回転行列ユーティリティ
//!
//! 2本の関節セグメント間の回転を Rodrigues の式で求め、XYZ オイラー角に分解する。

use nalgebra::{Matrix3, Vector3};

use crate::error::{GeometryError, Result};

/// 平行判定に使う外積ノルムの下限
const PARALLEL_EPSILON: f32 = 1e-6;

/// 単位ベクトル化
pub fn normalize(v: &Vector3<f32>) -> Result<Vector3<f32>> {
    if !v.iter().all(|c| c.is_finite()) {
        return Err(GeometryError::NonFinite);
    }
    let norm = v.norm();
    if norm == 0.0 {
        return Err(GeometryError::ZeroLength);
    }
    Ok(*v / norm)
}

/// unit(a) を unit(b) に写す回転行列
///
/// R = I + [v]x + [v]x^2 * (1 - c) / s^2  (v = a x b, s = |v|, c = a . b)
///
/// 平行なセグメントは単位行列を返す。反平行は回転軸が定まらないためエラー。
pub fn rotation_matrix(a: &Vector3<f32>, b: &Vector3<f32>) -> Result<Matrix3<f32>> {
    let ua = normalize(a)?;
    let ub = normalize(b)?;

    let v = ua.cross(&ub);
    let s = v.norm();
    let c = ua.dot(&ub);

    if s < PARALLEL_EPSILON {
        return if c > 0.0 {
            Ok(Matrix3::identity())
        } else {
            Err(GeometryError::AntiParallel)
        };
    }

    let vx = v.cross_matrix();
    let vx2 = vx * vx;
    Ok(Matrix3::identity() + vx + vx2 * ((1.0 - c) / (s * s)))
}

/// 回転行列を XYZ オイラー角に分解する
///
/// 戻り値は `[gamma, beta, alpha]`（度）。
pub fn decompose_rxyz(r: &Matrix3<f32>) -> [f32; 3] {
    let r20 = r[(2, 0)];
    // 丸め誤差で |r20| が 1 をわずかに超えると asin が NaN になる
    let beta = -r20.clamp(-1.0, 1.0).asin();

    let (alpha, gamma) = if r20.abs() < 1.0 {
        (r[(1, 0)].atan2(r[(0, 0)]), r[(2, 1)].atan2(r[(2, 2)]))
    } else {
        // ジンバルロック
        ((-r[(0, 1)]).atan2(r[(1, 1)]), 0.0)
    };

    [gamma.to_degrees(), beta.to_degrees(), alpha.to_degrees()]
}

/// 2セグメント間の角度行 `[gamma, beta, alpha, norm]`
///
/// 各角度とノルムは個別に0方向へ切り捨てる。ノルムは切り捨て前の角度から計算する。
pub fn coordinates_to_angle(a: &Vector3<f32>, b: &Vector3<f32>) -> Result<[i32; 4]> {
    let r = rotation_matrix(a, b)?;
    let angles = decompose_rxyz(&r);
    let norm = angles.iter().map(|x| x * x).sum::<f32>().sqrt();
    Ok([
        angles[0] as i32,
        angles[1] as i32,
        angles[2] as i32,
        norm as i32,
    ])
}
