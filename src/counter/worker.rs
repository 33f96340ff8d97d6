use std::collections::VecDeque;

use anyhow::Result;

use crate::config::CounterConfig;

use super::angles::JointAngles;

/// 膝・ヒップ指標の区間最小値（レップ開始時の基準）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub min_hip: f32,
    pub min_knee: f32,
}

impl Baseline {
    fn new(sentinel: f32) -> Self {
        Self {
            min_hip: sentinel,
            min_knee: sentinel,
        }
    }
}

/// ノルムが最大の行から動いている脚を決める（0: 左, 1: 右）
///
/// 同値なら先頭の行を優先する。
pub fn select_leg(angles: &JointAngles) -> usize {
    let mut best = 0;
    for (i, row) in angles.iter().enumerate().skip(1) {
        if row.norm > angles[best].norm {
            best = i;
        }
    }
    best / 2
}

/// 動いている脚の 2 行を先頭に並べ替える
pub fn order_by_leg(angles: &JointAngles, leg: usize) -> JointAngles {
    [
        angles[leg * 2],
        angles[leg * 2 + 1],
        angles[2 - leg * 2],
        angles[3 - leg * 2],
    ]
}

/// ランジのレップ計数ステートマシン
///
/// 毎フレーム:
/// 1. 脚選択と並べ替え、履歴へ追加
/// 2. 直近 W フレームの平均でヒップ・膝指標を作る
/// 3. 前フレームの progress が 1 付近に入った瞬間に1回完了
/// 4. 区間最小値を更新して膝進捗を正規化
/// 5. 開始直後にライブ進捗がしきい値を超えたら進捗バーを有効化
/// 6. 有効中は progress を単調増加させる
pub struct LungeWorker {
    frequency: usize,
    window: usize,
    hip_divisor: f32,
    knee_divisor: f32,
    arm_threshold: f32,
    rest_epsilon: f32,
    completion_epsilon: f32,
    baseline_sentinel: f32,

    history: VecDeque<JointAngles>,
    legs: VecDeque<usize>,

    progress: f32,
    live_progress: f32,
    hip_progress: f32,
    count: u32,
    armed: bool,
    baseline: Baseline,
    /// 前フレームで完了帯に入っていたか
    in_band: bool,
}

impl LungeWorker {
    pub fn new() -> Self {
        Self::build(&CounterConfig::default())
    }

    /// 設定を検証してから作る。除数 0 などは NaN の進捗になるため拒否する
    pub fn from_config(config: &CounterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &CounterConfig) -> Self {
        let frequency = config.frequency.max(1);
        Self {
            frequency,
            window: config.window(),
            hip_divisor: config.hip_divisor,
            knee_divisor: config.knee_divisor,
            arm_threshold: config.arm_threshold,
            rest_epsilon: config.rest_epsilon,
            completion_epsilon: config.completion_epsilon,
            baseline_sentinel: config.baseline_sentinel,
            history: VecDeque::with_capacity(frequency + 1),
            legs: VecDeque::with_capacity(frequency + 1),
            progress: 0.0,
            live_progress: 0.0,
            hip_progress: 0.0,
            count: 0,
            armed: false,
            baseline: Baseline::new(config.baseline_sentinel),
            in_band: false,
        }
    }

    /// 1フレーム分の角度行で状態を進める。このフレームでレップが完了したら true
    pub fn update(&mut self, angles: JointAngles) -> bool {
        let leg = select_leg(&angles);
        if self.legs.back().is_some_and(|&prev| prev != leg) {
            tracing::debug!(leg, "working leg changed");
        }
        Self::push_bounded(&mut self.legs, leg, self.frequency);
        Self::push_bounded(&mut self.history, order_by_leg(&angles, leg), self.frequency);

        let (hip, knee) = self.hip_knee();

        // 完了判定はこのフレームの基準更新より前、前フレームの progress で行う
        let completed = self.check_completion();

        self.baseline.min_hip = self.baseline.min_hip.min(hip);
        self.baseline.min_knee = self.baseline.min_knee.min(knee);
        self.hip_progress = ((hip - self.baseline.min_hip) / self.hip_divisor).clamp(0.0, 1.0);
        self.live_progress =
            ((knee - self.baseline.min_knee) / self.knee_divisor).clamp(0.0, 1.0);

        if self.progress.abs() < self.rest_epsilon && self.live_progress >= self.arm_threshold {
            self.armed = true;
        }
        if self.armed && self.live_progress > self.progress {
            self.progress = self.live_progress;
        }

        completed
    }

    fn check_completion(&mut self) -> bool {
        let in_band = (self.progress - 1.0).abs() < self.completion_epsilon;
        let rising = in_band && !self.in_band;
        self.in_band = in_band;
        if !rising {
            return false;
        }

        self.count += 1;
        self.progress = 0.0;
        self.baseline = Baseline::new(self.baseline_sentinel);
        self.armed = false;
        tracing::info!(count = self.count, "lunge repetition completed");
        true
    }

    /// 直近 W フレームの (ヒップ行, 膝行) の全成分平均
    fn hip_knee(&self) -> (f32, f32) {
        (self.row_mean(0), self.row_mean(1))
    }

    fn row_mean(&self, row: usize) -> f32 {
        let values: Vec<i32> = self
            .history
            .iter()
            .rev()
            .take(self.window)
            .flat_map(|frame| frame[row].values())
            .collect();
        if values.is_empty() {
            return 0.0;
        }
        let sum: f64 = values.iter().map(|&v| v as f64).sum();
        (sum / values.len() as f64) as f32
    }

    fn push_bounded<T>(queue: &mut VecDeque<T>, value: T, capacity: usize) {
        queue.push_back(value);
        if queue.len() > capacity {
            queue.pop_front();
        }
    }

    /// 完了判定用の progress（有効化後は単調増加、完了で 0）
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// 膝指標から求めたその瞬間の進捗
    pub fn live_progress(&self) -> f32 {
        self.live_progress
    }

    /// ヒップ指標の進捗。計算のみで判定には使わない
    pub fn hip_progress(&self) -> f32 {
        self.hip_progress
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    /// 直近フレームで選ばれた脚
    pub fn leg(&self) -> Option<usize> {
        self.legs.back().copied()
    }

    pub fn frequency(&self) -> usize {
        self.frequency
    }

    /// 脚順に並べ替え済みの角度履歴（古い順）
    pub fn history(&self) -> &VecDeque<JointAngles> {
        &self.history
    }

    /// フレームごとの脚選択履歴（古い順）
    pub fn leg_votes(&self) -> &VecDeque<usize> {
        &self.legs
    }
}

impl Default for LungeWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::angles::AngleRow;

    /// 左脚のヒップ行・膝行を全成分 `hip` / `knee` にしたフレーム
    fn frame(hip: i32, knee: i32) -> JointAngles {
        [
            AngleRow::new(hip, hip, hip, hip),
            AngleRow::new(knee, knee, knee, knee),
            AngleRow::default(),
            AngleRow::default(),
        ]
    }

    /// 膝指標の軌跡: 静止 → 上昇 → 保持 → 下降 → 静止
    fn rep_trace(rest: i32, peak: i32, step: i32) -> Vec<i32> {
        let mut trace = vec![rest; 12];
        let mut v = rest;
        while v < peak {
            v = (v + step).min(peak);
            trace.push(v);
        }
        trace.extend(std::iter::repeat(peak).take(12));
        while v > rest {
            v = (v - step).max(rest);
            trace.push(v);
        }
        trace.extend(std::iter::repeat(rest).take(12));
        trace
    }

    #[test]
    fn test_select_leg_max_norm() {
        let angles = [
            AngleRow::new(0, 0, 0, 10),
            AngleRow::new(0, 0, 0, 20),
            AngleRow::new(0, 0, 0, 30),
            AngleRow::new(0, 0, 0, 5),
        ];
        assert_eq!(select_leg(&angles), 1);
    }

    #[test]
    fn test_select_leg_tie_prefers_first() {
        let angles = [
            AngleRow::new(0, 0, 0, 5),
            AngleRow::new(0, 0, 0, 40),
            AngleRow::new(0, 0, 0, 40),
            AngleRow::new(0, 0, 0, 5),
        ];
        assert_eq!(select_leg(&angles), 0);
        assert_eq!(select_leg(&[AngleRow::default(); 4]), 0);
    }

    #[test]
    fn test_order_by_leg() {
        let rows: JointAngles = std::array::from_fn(|i| AngleRow::new(i as i32, 0, 0, 0));
        let left = order_by_leg(&rows, 0);
        let right = order_by_leg(&rows, 1);
        assert_eq!(left.map(|r| r.gamma), [0, 1, 2, 3]);
        assert_eq!(right.map(|r| r.gamma), [2, 3, 0, 1]);
    }

    #[test]
    fn test_history_bounded() {
        let mut w = LungeWorker::new();
        for _ in 0..100 {
            w.update(frame(10, 10));
        }
        assert_eq!(w.history().len(), 24);
        assert_eq!(w.leg_votes().len(), 24);
    }

    #[test]
    fn test_static_input_has_no_progress() {
        let mut w = LungeWorker::new();
        for _ in 0..50 {
            w.update(frame(20, 40));
            assert_eq!(w.live_progress(), 0.0);
            assert_eq!(w.progress(), 0.0);
        }
        assert_eq!(w.count(), 0);
        assert_eq!(w.baseline(), Baseline { min_hip: 20.0, min_knee: 40.0 });
    }

    #[test]
    fn test_window_underflow_averages_available() {
        let mut w = LungeWorker::new();
        w.update(frame(0, 10));
        w.update(frame(0, 30));
        // 2フレームしかない → (10*4 + 30*4) / 8 = 20
        assert_eq!(w.row_mean(1), 20.0);
    }

    #[test]
    fn test_window_uses_last_w_frames() {
        let mut w = LungeWorker::new();
        for _ in 0..10 {
            w.update(frame(0, 100));
        }
        for _ in 0..6 {
            w.update(frame(0, 40));
        }
        assert_eq!(w.row_mean(1), 40.0);
    }

    #[test]
    fn test_not_armed_below_threshold() {
        let mut w = LungeWorker::new();
        for _ in 0..10 {
            w.update(frame(0, 10));
        }
        // 10 + 0.3*55 = 26.5 → 最大でもライブ進捗 0.3
        for _ in 0..10 {
            w.update(frame(0, 26));
        }
        assert!(w.live_progress() > 0.25);
        assert!(!w.is_armed());
        assert_eq!(w.progress(), 0.0);
    }

    #[test]
    fn test_single_rep() {
        let mut w = LungeWorker::new();
        let mut completions = 0;
        let mut prev_progress = 0.0;
        let mut prev_count = 0;
        for knee in rep_trace(10, 80, 3) {
            let done = w.update(frame(0, knee));
            if done {
                completions += 1;
            }
            assert!((0.0..=1.0).contains(&w.progress()));
            assert!((0.0..=1.0).contains(&w.live_progress()));
            if !w.is_armed() && !done {
                assert_eq!(w.progress(), 0.0);
            }
            if w.is_armed() && w.count() == prev_count {
                assert!(w.progress() >= prev_progress);
            }
            prev_progress = w.progress();
            prev_count = w.count();
        }
        assert_eq!(completions, 1);
        assert_eq!(w.count(), 1);
        assert_eq!(w.progress(), 0.0);
        assert!(!w.is_armed());
    }

    #[test]
    fn test_completion_resets_baseline() {
        let mut w = LungeWorker::new();
        for _ in 0..6 {
            w.update(frame(0, 10));
        }
        // 10 + 55 以上に上げて progress を 1 にする
        let mut reached = false;
        for _ in 0..12 {
            w.update(frame(0, 80));
            if w.progress() == 1.0 {
                reached = true;
                break;
            }
        }
        assert!(reached);
        assert_eq!(w.count(), 0);

        // 次のフレームで完了し、基準はこのフレームの指標から取り直す
        assert!(w.update(frame(0, 80)));
        assert_eq!(w.count(), 1);
        assert_eq!(w.progress(), 0.0);
        assert_eq!(w.live_progress(), 0.0);
        assert_eq!(w.baseline().min_knee, 80.0);
    }

    #[test]
    fn test_plateau_counts_once() {
        let mut w = LungeWorker::new();
        for _ in 0..6 {
            w.update(frame(0, 10));
        }
        for _ in 0..40 {
            w.update(frame(0, 90));
        }
        assert_eq!(w.count(), 1);
        assert_eq!(w.progress(), 0.0);
    }

    #[test]
    fn test_two_reps() {
        let mut w = LungeWorker::new();
        let mut trace = rep_trace(10, 80, 4);
        trace.extend(rep_trace(10, 80, 4));
        for knee in trace {
            w.update(frame(0, knee));
        }
        assert_eq!(w.count(), 2);
    }

    #[test]
    fn test_right_leg_working() {
        let mut w = LungeWorker::new();
        let right = |knee: i32| -> JointAngles {
            [
                AngleRow::default(),
                AngleRow::default(),
                AngleRow::new(0, 0, 0, 0),
                AngleRow::new(knee, knee, knee, knee),
            ]
        };
        for knee in rep_trace(10, 80, 3) {
            w.update(right(knee));
        }
        assert_eq!(w.leg(), Some(1));
        assert_eq!(w.count(), 1);
    }

    #[test]
    fn test_hip_progress_is_not_published() {
        let mut w = LungeWorker::new();
        for _ in 0..6 {
            w.update(frame(10, 10));
        }
        for _ in 0..6 {
            w.update(frame(60, 10));
        }
        assert_eq!(w.hip_progress(), 1.0);
        assert_eq!(w.live_progress(), 0.0);
        assert_eq!(w.progress(), 0.0);
    }

    #[test]
    fn test_from_config_rejects_zero_divisor() {
        let config = CounterConfig {
            knee_divisor: 0.0,
            ..CounterConfig::default()
        };
        assert!(LungeWorker::from_config(&config).is_err());

        let config = CounterConfig {
            hip_divisor: f32::NAN,
            ..CounterConfig::default()
        };
        assert!(LungeWorker::from_config(&config).is_err());
        assert!(LungeWorker::from_config(&CounterConfig::default()).is_ok());
    }
}
