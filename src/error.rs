//! 幾何計算の数値エラー

use thiserror::Error;

/// フレーム単位で回復可能な数値エラー
///
/// 発生したフレームは角度計算をスキップし、カウンタの状態は変更しない。
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("zero-length segment vector")]
    ZeroLength,

    #[error("anti-parallel segments: rotation axis is undefined")]
    AntiParallel,

    #[error("non-finite coordinate in segment vector")]
    NonFinite,
}

pub type Result<T> = std::result::Result<T, GeometryError>;
