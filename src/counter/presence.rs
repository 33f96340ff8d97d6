use std::collections::VecDeque;

/// 可視フラグの直近ウィンドウから在席判定を行うヒステリシスフィルタ
///
/// - ウィンドウが満杯かつ全て可視 → 在席
/// - ウィンドウが全て不可視 → 不在
/// - それ以外は前回の判定を維持
pub struct PresenceFilter {
    window: VecDeque<bool>,
    capacity: usize,
    present: bool,
}

impl PresenceFilter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity + 1),
            capacity,
            present: false,
        }
    }

    /// 1フレーム分の可視フラグを入れて在席判定を返す
    pub fn update(&mut self, visible: bool) -> bool {
        self.window.push_back(visible);
        if self.window.len() > self.capacity {
            self.window.pop_front();
        }

        let was_present = self.present;
        if !self.present {
            self.present = self.window.len() == self.capacity && self.window.iter().all(|&v| v);
        } else if self.window.iter().all(|&v| !v) {
            self.present = false;
        }

        if self.present != was_present {
            tracing::debug!(present = self.present, "presence changed");
        }
        self.present
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.present = false;
    }
}
