use anyhow::{bail, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub counter: CounterConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CounterConfig {
    /// 処理周波数（フレーム）。在席ウィンドウと角度履歴の容量
    #[serde(default = "default_frequency")]
    pub frequency: usize,
    /// 関節が「見えている」とみなす可視度（この値より大きいこと）
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f32,
    /// ヒップ進捗の正規化幅（度）
    #[serde(default = "default_hip_divisor")]
    pub hip_divisor: f32,
    /// 膝進捗の正規化幅（度）
    #[serde(default = "default_knee_divisor")]
    pub knee_divisor: f32,
    /// 進捗バーを有効化するライブ進捗
    #[serde(default = "default_arm_threshold")]
    pub arm_threshold: f32,
    /// |progress| がこれ未満なら開始直後とみなす
    #[serde(default = "default_rest_epsilon")]
    pub rest_epsilon: f32,
    /// |progress - 1| がこれ未満で1回完了
    #[serde(default = "default_completion_epsilon")]
    pub completion_epsilon: f32,
    /// ベースライン最小値の初期値（どの角度よりも大きい値）
    #[serde(default = "default_baseline_sentinel")]
    pub baseline_sentinel: f32,
}

fn default_frequency() -> usize { 24 }
fn default_visibility_threshold() -> f32 { 0.5 }
fn default_hip_divisor() -> f32 { 25.0 }
fn default_knee_divisor() -> f32 { 55.0 }
fn default_arm_threshold() -> f32 { 0.35 }
fn default_rest_epsilon() -> f32 { 0.01 }
fn default_completion_epsilon() -> f32 { 0.009 }
fn default_baseline_sentinel() -> f32 { 360.0 }

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            visibility_threshold: default_visibility_threshold(),
            hip_divisor: default_hip_divisor(),
            knee_divisor: default_knee_divisor(),
            arm_threshold: default_arm_threshold(),
            rest_epsilon: default_rest_epsilon(),
            completion_epsilon: default_completion_epsilon(),
            baseline_sentinel: default_baseline_sentinel(),
        }
    }
}

impl CounterConfig {
    /// 平滑化ウィンドウ W = F / 4（最低 1）
    pub fn window(&self) -> usize {
        (self.frequency / 4).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frequency == 0 {
            bail!("counter.frequency must be positive");
        }
        if !(self.hip_divisor > 0.0 && self.knee_divisor > 0.0) {
            bail!(
                "counter divisors must be positive (hip={}, knee={})",
                self.hip_divisor,
                self.knee_divisor
            );
        }
        for (name, value) in [
            ("visibility_threshold", self.visibility_threshold),
            ("arm_threshold", self.arm_threshold),
            ("rest_epsilon", self.rest_epsilon),
            ("completion_epsilon", self.completion_epsilon),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                bail!("counter.{} must be in (0, 1], got {}", name, value);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HostConfig {
    /// ホスト側でレップ完了とみなす progress
    #[serde(default = "default_completion_threshold")]
    pub completion_threshold: f32,
}

fn default_completion_threshold() -> f32 { 0.99 }

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            completion_threshold: default_completion_threshold(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SimilarityConfig {
    /// テンプレート類似度をフレーム出力に含める
    #[serde(default)]
    pub enabled: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.counter.validate()?;
        Ok(config)
    }

    /// 読めなければデフォルト設定
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("config {} not loaded ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
