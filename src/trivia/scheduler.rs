use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};

use super::state::{RoundPhase, RoundState, RoundTable, RoundTimers, TimerKind};
use super::{GuildConfigStore, Transport, TriviaContent, TriviaError};
use crate::models::types::TriviaSettings;
use crate::utils::questions::QuestionBank;

/// 到期前多久送出提醒
pub const WARNING_LEAD: Duration = Duration::from_secs(30);

pub const WARNING_TEXT: &str = "快沒時間了！趕快送出你的答案！";

/// 進行中回合的唯讀摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub round_id: u64,
    pub question_index: usize,
    pub channel_id: u64,
    pub elapsed: Duration,
}

/// 自動問答排程器，擁有回合狀態表與所有回合計時器
pub struct TriviaScheduler {
    bank: Arc<QuestionBank>,
    config: Arc<dyn GuildConfigStore>,
    transport: Arc<dyn Transport>,
    sweep_interval: Duration,
    pub(super) table: Mutex<RoundTable>,
    next_round_id: AtomicU64,
    started: AtomicBool,
    suspended: AtomicBool,
}

impl TriviaScheduler {
    pub fn new(
        bank: Arc<QuestionBank>,
        config: Arc<dyn GuildConfigStore>,
        transport: Arc<dyn Transport>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            bank,
            config,
            transport,
            sweep_interval,
            table: Mutex::new(RoundTable::default()),
            next_round_id: AtomicU64::new(1),
            started: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
        }
    }

    pub(super) fn config(&self) -> &Arc<dyn GuildConfigStore> {
        &self.config
    }

    pub(super) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// 啟動定期巡查。重複呼叫不會多開迴圈。
    pub fn start(self: &Arc<Self>) -> Result<(), TriviaError> {
        if self.bank.is_empty() {
            log::error!("沒有可用的題目，自動問答不會啟動");
            return Err(TriviaError::QuestionBankEmpty);
        }

        if self.started.swap(true, Ordering::SeqCst) {
            log::debug!("自動問答排程已在執行");
            return Ok(());
        }

        log::info!(
            "啟動自動問答系統 ({} 題，每 {} 秒巡查一次)",
            self.bank.len(),
            self.sweep_interval.as_secs()
        );

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // 第一次 tick 立即完成
                ticker.tick().await;
                this.sweep().await;
            }
        });

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// 對每個已設定的伺服器檢查是否該開新回合
    pub async fn sweep(self: &Arc<Self>) {
        if self.is_suspended() {
            log::debug!("維護模式中，略過自動問答巡查");
            return;
        }

        let now = Instant::now();
        for (guild_id, settings) in self.config.configured_guilds().await {
            let due = {
                let table = self.table.lock().await;
                table
                    .get(guild_id)
                    .is_none_or(|guild| guild.is_due(now, settings.round_interval()))
            };
            if !due {
                continue;
            }

            if !self
                .transport
                .is_text_capable(guild_id, settings.channel_id)
                .await
            {
                log::warn!(
                    "伺服器 {} 的問答頻道 {} 不存在或不是文字頻道，略過",
                    guild_id,
                    settings.channel_id
                );
                continue;
            }

            if let Err(e) = self.start_round(guild_id, settings, now).await {
                log::error!("伺服器 {} 發送問答時發生錯誤: {}", guild_id, e);
            }
        }
    }

    /// 開始新回合；若該伺服器已有回合進行中則回傳 `Ok(None)`
    pub async fn start_round(
        self: &Arc<Self>,
        guild_id: u64,
        settings: TriviaSettings,
        now: Instant,
    ) -> Result<Option<u64>, TriviaError> {
        let (round_id, index) = {
            let mut table = self.table.lock().await;
            let guild = table.entry(guild_id);
            if !guild.phase.is_idle() {
                return Ok(None);
            }
            let Some(index) = guild.history.draw(self.bank.len(), &mut rand::rng()) else {
                return Err(TriviaError::QuestionBankEmpty);
            };
            let round_id = self.next_round_id.fetch_add(1, Ordering::SeqCst);
            guild.phase = RoundPhase::Starting { round_id };
            (round_id, index)
        };

        let Some(question) = self.bank.get(index) else {
            return Err(TriviaError::QuestionBankEmpty);
        };
        let time_limit = settings.answer_time_limit();
        let content = TriviaContent::Question {
            prompt: question.prompt.clone(),
            hint: question.hint.clone(),
            image: question.image.clone(),
            time_limit_minutes: settings.answer_time_limit_minutes(),
        };

        let posted = self
            .transport
            .post_message(settings.channel_id, &content)
            .await;

        let mut table = self.table.lock().await;
        let guild = table.entry(guild_id);
        let still_starting =
            matches!(guild.phase, RoundPhase::Starting { round_id: id } if id == round_id);

        let message = match posted {
            Ok(message) => message,
            Err(e) => {
                // 已被停止時，該題可能已被較新的回合抽走
                if still_starting {
                    guild.phase = RoundPhase::Idle;
                    guild.history.release(index);
                }
                return Err(e.into());
            }
        };

        if !still_starting {
            log::warn!("伺服器 {} 的回合在發題期間被停止", guild_id);
            return Ok(None);
        }

        let timers = self.schedule_timers(guild_id, round_id, time_limit);
        guild.phase = RoundPhase::Active(RoundState {
            round_id,
            question_index: index,
            message,
            expected_answer: question.answer.clone(),
            image: question.image.clone(),
            started_at: now,
            timers,
        });
        guild.last_started_at = Some(now);

        log::info!(
            "伺服器 {} 開始第 {} 回合 (題目 #{})",
            guild_id,
            round_id,
            index
        );
        Ok(Some(round_id))
    }

    fn schedule_timers(
        self: &Arc<Self>,
        guild_id: u64,
        round_id: u64,
        time_limit: Duration,
    ) -> RoundTimers {
        let warning = match time_limit.checked_sub(WARNING_LEAD) {
            Some(offset) if !offset.is_zero() => {
                Some(self.spawn_timer(guild_id, round_id, TimerKind::Warning, offset))
            }
            _ => {
                log::debug!("作答時限 {:?} 太短，不送出提醒", time_limit);
                None
            }
        };
        let expiry = self.spawn_timer(guild_id, round_id, TimerKind::Expiry, time_limit);

        RoundTimers {
            warning,
            expiry: Some(expiry),
        }
    }

    fn spawn_timer(
        self: &Arc<Self>,
        guild_id: u64,
        round_id: u64,
        kind: TimerKind,
        delay: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.on_timer(guild_id, round_id, kind).await;
        })
    }

    /// 計時器觸發時重新讀取狀態；回合已結束則什麼都不做
    pub(super) async fn on_timer(&self, guild_id: u64, round_id: u64, kind: TimerKind) {
        match kind {
            TimerKind::Warning => {
                let channel_id = {
                    let table = self.table.lock().await;
                    match table.active_round(guild_id) {
                        Some(round) if round.round_id == round_id => round.message.channel_id,
                        _ => return,
                    }
                };
                if let Err(e) = self.transport.send_message(channel_id, WARNING_TEXT).await {
                    log::warn!("伺服器 {} 送出問答提醒失敗: {}", guild_id, e);
                }
            }
            TimerKind::Expiry => {
                let round = {
                    let mut table = self.table.lock().await;
                    match table
                        .get_mut(guild_id)
                        .and_then(|guild| guild.take_active(Some(round_id)))
                    {
                        Some(round) => round,
                        None => return,
                    }
                };

                let RoundState {
                    message,
                    expected_answer,
                    image,
                    timers,
                    ..
                } = round;
                timers.cancel_warning();

                let content = TriviaContent::TimedOut {
                    answer: expected_answer,
                    image,
                };
                if let Err(e) = self.transport.edit_message(message, &content).await {
                    log::warn!("伺服器 {} 公布問答答案失敗: {}", guild_id, e);
                }

                self.finish_round(guild_id, round_id).await;
                log::info!("伺服器 {} 第 {} 回合時間到", guild_id, round_id);
            }
        }
    }

    pub(super) async fn finish_round(&self, guild_id: u64, round_id: u64) {
        let mut table = self.table.lock().await;
        if let Some(guild) = table.get_mut(guild_id) {
            guild.finish_ending(round_id);
        }
    }

    /// 停止某伺服器的回合與計時器；沒有回合時不做任何事
    pub async fn stop_guild_round(&self, guild_id: u64) -> bool {
        let mut table = self.table.lock().await;
        let Some(guild) = table.get_mut(guild_id) else {
            return false;
        };

        match std::mem::take(&mut guild.phase) {
            RoundPhase::Active(round) => {
                round.timers.cancel();
                log::info!("已停止伺服器 {} 進行中的問答", guild_id);
                true
            }
            RoundPhase::Starting { .. } => {
                log::info!("已取消伺服器 {} 發送中的問答", guild_id);
                true
            }
            // 公布答案的編輯完成後會自行回到 Idle
            phase @ RoundPhase::Ending { .. } => {
                guild.phase = phase;
                false
            }
            RoundPhase::Idle => false,
        }
    }

    /// 停止所有伺服器的回合，回傳停止的數量
    pub async fn stop_all_rounds(&self) -> usize {
        let guild_ids = self.table.lock().await.guild_ids();
        let mut stopped = 0;
        for guild_id in guild_ids {
            if self.stop_guild_round(guild_id).await {
                stopped += 1;
            }
        }
        stopped
    }

    pub async fn has_active_round(&self, guild_id: u64) -> bool {
        self.table.lock().await.active_round(guild_id).is_some()
    }

    pub async fn active_round_summary(&self, guild_id: u64) -> Option<RoundSummary> {
        let table = self.table.lock().await;
        table.active_round(guild_id).map(|round| RoundSummary {
            round_id: round.round_id,
            question_index: round.question_index,
            channel_id: round.message.channel_id,
            elapsed: Instant::now().saturating_duration_since(round.started_at),
        })
    }

    pub async fn active_round_count(&self) -> usize {
        self.table.lock().await.active_count()
    }

    /// 進入維護模式：停止巡查並結束所有回合
    pub async fn suspend(&self) -> usize {
        self.suspended.store(true, Ordering::SeqCst);
        self.stop_all_rounds().await
    }

    pub fn resume(&self) {
        self.suspended.store(false, Ordering::SeqCst);
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }
}
