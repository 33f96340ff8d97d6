//! 参照動作テンプレートとの類似度（診断用、カウントには影響しない）

use std::f32::consts::PI;

use super::angles::JointAngles;
use super::worker::{order_by_leg, LungeWorker};

/// 1周期の正弦波テンプレートと角度履歴を比較する
pub struct TemplateScorer {
    template: Vec<f32>,
}

impl TemplateScorer {
    pub fn new(frequency: usize) -> Self {
        let n = frequency.max(1);
        let template = (0..n)
            .map(|i| {
                let x = if n > 1 { 2.0 * PI * i as f32 / (n - 1) as f32 } else { 0.0 };
                x.sin()
            })
            .collect();
        Self { template }
    }

    pub fn template(&self) -> &[f32] {
        &self.template
    }

    /// コサイン類似度 (x100, 四捨五入)。履歴が満杯になるまで None
    pub fn cosine_similarity(&self, worker: &LungeWorker) -> Option<i32> {
        if worker.history().len() < self.template.len() {
            return None;
        }
        let series = joint_series(worker);

        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;
        for joint in &series {
            for (&a, &b) in joint.iter().zip(self.template.iter()) {
                dot += a * b;
                norm_a += a * a;
                norm_b += b * b;
            }
        }
        if norm_a == 0.0 || norm_b == 0.0 {
            return None;
        }
        let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());
        Some((cosine * 100.0).round() as i32)
    }

    /// 関節ごとの DTW 距離（経路長で正規化）の平均
    ///
    /// 系列は関節ごとに [0, 1] へ min-max 正規化し、テンプレートも [0, 1] に写して比較する。
    pub fn dtw_distance(&self, worker: &LungeWorker) -> Option<f32> {
        if worker.history().is_empty() {
            return None;
        }
        let template: Vec<f32> = self.template.iter().map(|v| (v + 1.0) / 2.0).collect();
        let series = joint_series(worker);
        let total: f32 = series
            .iter()
            .map(|joint| dtw(&min_max_normalize(joint), &template))
            .sum();
        Some(total / series.len() as f32)
    }
}

/// 多数決で決めた脚の順に並べ直した、関節ごとのノルム系列
fn joint_series(worker: &LungeWorker) -> [Vec<f32>; 4] {
    let leg = majority_leg(worker);
    let frames: Vec<JointAngles> = worker
        .history()
        .iter()
        .zip(worker.leg_votes().iter())
        // 並べ替えは自己逆写像なので、同じ脚でもう一度並べ替えると元の順に戻る
        .map(|(ordered, &frame_leg)| order_by_leg(&order_by_leg(ordered, frame_leg), leg))
        .collect();
    std::array::from_fn(|joint| frames.iter().map(|f| f[joint].norm as f32).collect())
}

/// 脚選択の多数決（同数なら左）
pub fn majority_leg(worker: &LungeWorker) -> usize {
    let right = worker.leg_votes().iter().filter(|&&leg| leg == 1).count();
    let left = worker.leg_votes().len() - right;
    if right > left {
        1
    } else {
        0
    }
}

fn min_max_normalize(series: &[f32]) -> Vec<f32> {
    let min = series.iter().copied().fold(f32::INFINITY, f32::min);
    let max = series.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if range <= 0.0 {
        return vec![0.0; series.len()];
    }
    series.iter().map(|v| (v - min) / range).collect()
}

/// 古典的 DTW。累積コストを最適経路の長さで割った値を返す
fn dtw(a: &[f32], b: &[f32]) -> f32 {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return 0.0;
    }
    let mut cost = vec![vec![f32::INFINITY; m + 1]; n + 1];
    let mut steps = vec![vec![0u32; m + 1]; n + 1];
    cost[0][0] = 0.0;

    for i in 1..=n {
        for j in 1..=m {
            let candidates = [(i - 1, j - 1), (i - 1, j), (i, j - 1)];
            let mut best = candidates[0];
            for &c in &candidates[1..] {
                if cost[c.0][c.1] < cost[best.0][best.1] {
                    best = c;
                }
            }
            cost[i][j] = (a[i - 1] - b[j - 1]).abs() + cost[best.0][best.1];
            steps[i][j] = steps[best.0][best.1] + 1;
        }
    }
    cost[n][m] / steps[n][m] as f32
}
