use anyhow::Result;

use crate::config::{Config, HostConfig};
use crate::pose::PoseFrame;

use super::driver::{FrameOutput, LungeSession};

/// ホスト（UI・テレメトリ）側のコールバック
pub trait RepCounterHost {
    fn increment_rep_count(&mut self);
    fn send_progress_update(&mut self, progress: f32);
    fn send_feedback_message(&mut self, message: &str);
}

/// セッションとホストをつなぐアダプタ
///
/// progress がしきい値を上に跨いだフレームでだけホストのカウンタを増やす。
pub struct ExerciseRepCounter<H: RepCounterHost> {
    session: LungeSession,
    host: H,
    completion_threshold: f32,
    above_threshold: bool,
}

impl<H: RepCounterHost> ExerciseRepCounter<H> {
    pub fn new(host: H) -> Self {
        Self::with_session(LungeSession::new(), &HostConfig::default(), host)
    }

    pub fn from_config(config: &Config, host: H) -> Result<Self> {
        let session = LungeSession::from_config(config)?;
        Ok(Self::with_session(session, &config.host, host))
    }

    pub fn with_session(session: LungeSession, config: &HostConfig, host: H) -> Self {
        Self {
            session,
            host,
            completion_threshold: config.completion_threshold,
            above_threshold: false,
        }
    }

    /// 推論結果1フレーム分を処理してホストへ通知する
    pub fn set_results(&mut self, frame: &PoseFrame) -> FrameOutput {
        let output = self.session.update(frame);
        self.observe_progress(output.progress);
        self.host.send_progress_update(output.progress);
        self.host.send_feedback_message(&output.feedback.to_string());
        output
    }

    fn observe_progress(&mut self, progress: f32) {
        let above = progress > self.completion_threshold;
        if above && !self.above_threshold {
            self.host.increment_rep_count();
        }
        self.above_threshold = above;
    }

    pub fn session(&self) -> &LungeSession {
        &self.session
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

/// 呼び出しを記録するだけのホスト
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    pub rep_count: u32,
    pub progress: Vec<f32>,
    pub messages: Vec<String>,
}

impl RepCounterHost for RecordingHost {
    fn increment_rep_count(&mut self) {
        self.rep_count += 1;
    }

    fn send_progress_update(&mut self, progress: f32) {
        self.progress.push(progress);
    }

    fn send_feedback_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
