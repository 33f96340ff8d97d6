use std::fmt;

use anyhow::Result;

use crate::config::Config;
use crate::pose::{Landmark, PoseFrame};

use super::angles::extract_joint_angles;
use super::presence::PresenceFilter;
use super::similarity::TemplateScorer;
use super::worker::LungeWorker;

/// フレームの処理結果の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// 在席判定なし。進捗 0 を報告
    NoHuman,
    /// 角度計算とカウンタ更新を行った
    Tracked,
    /// 在席中だが、このフレームの関節が使えなかった（状態は維持）
    Skipped,
}

/// UI 向けフィードバック
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feedback {
    NoPerson,
    InProgress(f32),
    RepComplete(u32),
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::NoPerson => write!(f, "no person detected"),
            Feedback::InProgress(progress) => write!(f, "{}", progress),
            Feedback::RepComplete(count) => write!(f, "rep {} complete", count),
        }
    }
}

/// 1フレームごとにホストへ渡す値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutput {
    pub status: FrameStatus,
    pub live_progress: f32,
    pub progress: f32,
    pub count: u32,
    pub hip_progress: f32,
    /// 動いている脚（0: 左, 1: 右）
    pub leg: Option<usize>,
    /// テンプレート類似度（有効時のみ）
    pub similarity: Option<i32>,
    pub feedback: Feedback,
}

/// トラッキングセッション
///
/// ホストが1回作成し、時系列順にフレームを渡す。
pub struct LungeSession {
    visibility_threshold: f32,
    presence: PresenceFilter,
    worker: LungeWorker,
    scorer: Option<TemplateScorer>,
}

impl LungeSession {
    pub fn new() -> Self {
        Self::with_worker(&Config::default(), LungeWorker::new())
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let worker = LungeWorker::from_config(&config.counter)?;
        Ok(Self::with_worker(config, worker))
    }

    fn with_worker(config: &Config, worker: LungeWorker) -> Self {
        let counter = &config.counter;
        Self {
            visibility_threshold: counter.visibility_threshold,
            presence: PresenceFilter::new(counter.frequency),
            worker,
            scorer: config
                .similarity
                .enabled
                .then(|| TemplateScorer::new(counter.frequency)),
        }
    }

    /// 1フレーム処理する
    pub fn update(&mut self, frame: &PoseFrame) -> FrameOutput {
        let joints = frame.tracked_joints();
        let visible = joints
            .as_ref()
            .is_some_and(|joints| self.all_visible(joints));

        if !self.presence.update(visible) {
            return FrameOutput {
                status: FrameStatus::NoHuman,
                live_progress: 0.0,
                progress: 0.0,
                count: self.worker.count(),
                hip_progress: 0.0,
                leg: None,
                similarity: None,
                feedback: Feedback::NoPerson,
            };
        }

        let Some(joints) = joints else {
            tracing::debug!("human present but frame has no pose; skipping");
            return self.output(FrameStatus::Skipped, false);
        };

        match extract_joint_angles(&joints) {
            Ok(angles) => {
                let completed = self.worker.update(angles);
                self.output(FrameStatus::Tracked, completed)
            }
            Err(e) => {
                tracing::debug!("skipping frame: {}", e);
                self.output(FrameStatus::Skipped, false)
            }
        }
    }

    fn all_visible(&self, joints: &[Landmark; 8]) -> bool {
        joints.iter().all(|j| j.is_visible(self.visibility_threshold))
    }

    fn output(&self, status: FrameStatus, completed: bool) -> FrameOutput {
        let live_progress = self.worker.live_progress();
        let feedback = if completed {
            Feedback::RepComplete(self.worker.count())
        } else {
            Feedback::InProgress(live_progress)
        };
        FrameOutput {
            status,
            live_progress,
            progress: self.worker.progress(),
            count: self.worker.count(),
            hip_progress: self.worker.hip_progress(),
            leg: self.worker.leg(),
            similarity: self
                .scorer
                .as_ref()
                .and_then(|scorer| scorer.cosine_similarity(&self.worker)),
            feedback,
        }
    }

    /// テンプレートとの DTW 距離（類似度が有効なときのみ）
    pub fn dtw_distance(&self) -> Option<f32> {
        self.scorer.as_ref()?.dtw_distance(&self.worker)
    }

    pub fn is_human_present(&self) -> bool {
        self.presence.is_present()
    }

    pub fn worker(&self) -> &LungeWorker {
        &self.worker
    }

    pub fn count(&self) -> u32 {
        self.worker.count()
    }
}

impl Default for LungeSession {
    fn default() -> Self {
        Self::new()
    }
}
