use super::scheduler::TriviaScheduler;
use super::state::RoundState;
use super::{MessageRef, TriviaContent, normalize_answer};

pub const INCORRECT_TEXT: &str = "答錯了！再試一次。";

/// 來自聊天頻道的一則訊息
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub author_id: u64,
    pub is_bot: bool,
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub message_id: u64,
    pub text: String,
}

impl IncomingMessage {
    fn reference(&self) -> MessageRef {
        MessageRef {
            channel_id: self.channel_id,
            message_id: self.message_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 不在問答頻道、沒有進行中的回合，或是機器人訊息
    Ignored,
    Incorrect,
    Correct,
}

impl TriviaScheduler {
    /// 比對訊息是否為目前回合的答案，答對即結束回合
    pub async fn evaluate(&self, message: &IncomingMessage) -> Verdict {
        if message.is_bot {
            return Verdict::Ignored;
        }
        let Some(guild_id) = message.guild_id else {
            return Verdict::Ignored;
        };
        let Some(settings) = self.config().trivia_settings(guild_id).await else {
            return Verdict::Ignored;
        };
        if message.channel_id != settings.channel_id {
            return Verdict::Ignored;
        }

        let attempt = normalize_answer(&message.text);
        let round = {
            let mut table = self.table.lock().await;
            let Some(guild) = table.get_mut(guild_id) else {
                return Verdict::Ignored;
            };
            let is_match = match guild.phase.active() {
                Some(round) => normalize_answer(&round.expected_answer) == attempt,
                None => return Verdict::Ignored,
            };
            if is_match { guild.take_active(None) } else { None }
        };

        match round {
            Some(round) => {
                self.finalize_correct(guild_id, round, message).await;
                Verdict::Correct
            }
            None => {
                if let Err(e) = self
                    .transport()
                    .reply(message.reference(), INCORRECT_TEXT)
                    .await
                {
                    log::warn!("伺服器 {} 回覆答錯訊息失敗: {}", guild_id, e);
                }
                Verdict::Incorrect
            }
        }
    }

    async fn finalize_correct(&self, guild_id: u64, round: RoundState, message: &IncomingMessage) {
        let RoundState {
            round_id,
            message: posted,
            expected_answer,
            timers,
            ..
        } = round;
        timers.cancel();

        let content = TriviaContent::Solved {
            answer: expected_answer,
            winner_id: message.author_id,
        };
        if let Err(e) = self.transport().edit_message(posted, &content).await {
            log::warn!("伺服器 {} 更新問答訊息失敗: {}", guild_id, e);
        }

        let congrats = format!("恭喜 <@{}>！你答對了！🎉", message.author_id);
        if let Err(e) = self.transport().reply(message.reference(), &congrats).await {
            log::warn!("伺服器 {} 回覆答對訊息失敗: {}", guild_id, e);
        }

        self.finish_round(guild_id, round_id).await;
        log::info!(
            "伺服器 {} 第 {} 回合由 {} 答對",
            guild_id,
            round_id,
            message.author_id
        );
    }
}
