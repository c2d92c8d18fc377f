use rand::Rng;
use std::collections::{HashMap, HashSet};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::MessageRef;

/// 每回合的一次性計時器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Warning,
    Expiry,
}

#[derive(Debug, Default)]
pub struct RoundTimers {
    pub warning: Option<JoinHandle<()>>,
    pub expiry: Option<JoinHandle<()>>,
}

impl RoundTimers {
    /// 提前結束時兩個計時器一起取消
    pub fn cancel(self) {
        if let Some(handle) = self.warning {
            handle.abort();
        }
        if let Some(handle) = self.expiry {
            handle.abort();
        }
    }

    /// 到期處理由 expiry 任務本身執行，只能取消提醒
    pub fn cancel_warning(self) {
        if let Some(handle) = self.warning {
            handle.abort();
        }
    }
}

#[derive(Debug)]
pub struct RoundState {
    pub round_id: u64,
    pub question_index: usize,
    pub message: MessageRef,
    pub expected_answer: String,
    pub image: Option<String>,
    pub started_at: Instant,
    pub timers: RoundTimers,
}

#[derive(Debug, Default)]
pub enum RoundPhase {
    #[default]
    Idle,
    /// 題目發送中，尚未取得訊息
    Starting { round_id: u64 },
    Active(RoundState),
    /// 公布答案的編輯仍在進行
    Ending { round_id: u64 },
}

impl RoundPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, RoundPhase::Idle)
    }

    pub fn active(&self) -> Option<&RoundState> {
        match self {
            RoundPhase::Active(round) => Some(round),
            _ => None,
        }
    }
}

/// 已出過的題目索引，全部用完後重新開始一輪
#[derive(Debug, Default, Clone)]
pub struct QuestionHistory {
    used: HashSet<usize>,
}

impl QuestionHistory {
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// 從尚未出過的題目中隨機抽一題；題庫為空時回傳 None
    pub fn draw<R: Rng>(&mut self, bank_size: usize, rng: &mut R) -> Option<usize> {
        if bank_size == 0 {
            return None;
        }

        // 題庫縮小時，舊索引不再有效
        self.used.retain(|&index| index < bank_size);

        let mut candidates: Vec<usize> = (0..bank_size)
            .filter(|index| !self.used.contains(index))
            .collect();
        if candidates.is_empty() {
            self.used.clear();
            candidates = (0..bank_size).collect();
        }

        let index = candidates[rng.random_range(0..candidates.len())];
        self.used.insert(index);
        Some(index)
    }

    /// 發題失敗時退回該題
    pub fn release(&mut self, index: usize) {
        self.used.remove(&index);
    }
}

#[derive(Debug, Default)]
pub struct GuildTrivia {
    pub phase: RoundPhase,
    pub history: QuestionHistory,
    pub last_started_at: Option<Instant>,
}

impl GuildTrivia {
    /// 距離上次開局是否已超過間隔；從未開局視為已到期
    pub fn is_due(&self, now: Instant, interval: std::time::Duration) -> bool {
        self.phase.is_idle()
            && self
                .last_started_at
                .is_none_or(|started| now.saturating_duration_since(started) >= interval)
    }

    /// 取出進行中的回合並標記為結束中，只有一個呼叫者能成功
    pub fn take_active(&mut self, round_id: Option<u64>) -> Option<RoundState> {
        match &self.phase {
            RoundPhase::Active(round) if round_id.is_none_or(|id| id == round.round_id) => {}
            _ => return None,
        }
        let RoundPhase::Active(round) = std::mem::take(&mut self.phase) else {
            return None;
        };
        self.phase = RoundPhase::Ending {
            round_id: round.round_id,
        };
        Some(round)
    }

    /// 結束流程完成；若狀態已被其他路徑改變則不動
    pub fn finish_ending(&mut self, round_id: u64) {
        if matches!(self.phase, RoundPhase::Ending { round_id: id } if id == round_id) {
            self.phase = RoundPhase::Idle;
        }
    }
}

/// 以伺服器 ID 為鍵的回合狀態表
#[derive(Debug, Default)]
pub struct RoundTable {
    guilds: HashMap<u64, GuildTrivia>,
}

impl RoundTable {
    pub fn get(&self, guild_id: u64) -> Option<&GuildTrivia> {
        self.guilds.get(&guild_id)
    }

    pub fn get_mut(&mut self, guild_id: u64) -> Option<&mut GuildTrivia> {
        self.guilds.get_mut(&guild_id)
    }

    pub fn entry(&mut self, guild_id: u64) -> &mut GuildTrivia {
        self.guilds.entry(guild_id).or_default()
    }

    pub fn active_round(&self, guild_id: u64) -> Option<&RoundState> {
        self.get(guild_id).and_then(|guild| guild.phase.active())
    }

    pub fn active_count(&self) -> usize {
        self.guilds
            .values()
            .filter(|guild| guild.phase.active().is_some())
            .count()
    }

    pub fn guild_ids(&self) -> Vec<u64> {
        self.guilds.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn round(round_id: u64) -> RoundState {
        RoundState {
            round_id,
            question_index: 0,
            message: MessageRef {
                channel_id: 1,
                message_id: 2,
            },
            expected_answer: "alpha".into(),
            image: None,
            started_at: Instant::now(),
            timers: RoundTimers::default(),
        }
    }

    #[test]
    fn test_draw_covers_bank_before_repeating() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut history = QuestionHistory::default();
        let bank_size = 5;

        let mut seen = HashSet::new();
        for _ in 0..bank_size {
            let index = history.draw(bank_size, &mut rng).unwrap();
            assert!(seen.insert(index), "index {} repeated before exhaustion", index);
        }
        assert_eq!(history.len(), bank_size);

        // 第 N+1 次抽題時重置
        let index = history.draw(bank_size, &mut rng).unwrap();
        assert!(index < bank_size);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_draw_empty_bank() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut history = QuestionHistory::default();
        assert_eq!(history.draw(0, &mut rng), None);
    }

    #[test]
    fn test_draw_drops_indices_outside_shrunk_bank() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut history = QuestionHistory::default();
        for _ in 0..4 {
            history.draw(4, &mut rng);
        }
        let index = history.draw(2, &mut rng).unwrap();
        assert!(index < 2);
        assert!(history.len() <= 2);
    }

    #[test]
    fn test_release_returns_question() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut history = QuestionHistory::default();
        let index = history.draw(1, &mut rng).unwrap();
        history.release(index);
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_take_active_only_once() {
        let mut guild = GuildTrivia {
            phase: RoundPhase::Active(round(9)),
            ..Default::default()
        };

        assert!(guild.take_active(Some(8)).is_none());
        assert!(guild.take_active(Some(9)).is_some());
        assert!(guild.take_active(None).is_none());
        assert!(matches!(guild.phase, RoundPhase::Ending { round_id: 9 }));

        guild.finish_ending(3);
        assert!(matches!(guild.phase, RoundPhase::Ending { .. }));
        guild.finish_ending(9);
        assert!(guild.phase.is_idle());
    }

    #[test]
    fn test_is_due() {
        let now = Instant::now();
        let interval = Duration::from_secs(60);
        let mut guild = GuildTrivia::default();
        assert!(guild.is_due(now, interval));

        guild.last_started_at = Some(now);
        assert!(!guild.is_due(now + Duration::from_secs(59), interval));
        assert!(guild.is_due(now + Duration::from_secs(60), interval));

        guild.phase = RoundPhase::Starting { round_id: 1 };
        assert!(!guild.is_due(now + Duration::from_secs(600), interval));
    }
}
