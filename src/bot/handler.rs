use serenity::all::{Context, EventHandler, Guild, Message, UnavailableGuild};
use serenity::async_trait;
use std::sync::Arc;

use crate::trivia::{IncomingMessage, TriviaScheduler, Verdict};
use crate::utils::webhook::{GuildEvent, WebhookNotifier};

/// 接收 gateway 事件並交給自動問答核心
pub struct BotHandler {
    pub trivia: Arc<TriviaScheduler>,
    pub webhook: WebhookNotifier,
}

impl BotHandler {
    pub fn new(trivia: Arc<TriviaScheduler>, webhook: WebhookNotifier) -> Self {
        Self { trivia, webhook }
    }
}

impl From<&Message> for IncomingMessage {
    fn from(message: &Message) -> Self {
        Self {
            author_id: message.author.id.get(),
            is_bot: message.author.bot,
            guild_id: message.guild_id.map(|id| id.get()),
            channel_id: message.channel_id.get(),
            message_id: message.id.get(),
            text: message.content.clone(),
        }
    }
}

#[async_trait]
impl EventHandler for BotHandler {
    async fn message(&self, _ctx: Context, new_message: Message) {
        if new_message.author.bot {
            return;
        }

        let incoming = IncomingMessage::from(&new_message);
        if self.trivia.evaluate(&incoming).await == Verdict::Correct {
            log::debug!("{} 在頻道 {} 答對", new_message.author.name, new_message.channel_id);
        }
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, is_new: Option<bool>) {
        if is_new != Some(true) {
            return;
        }

        log::info!("已加入伺服器: {} ({})", guild.name, guild.id);
        self.webhook
            .notify(GuildEvent::Joined, &guild.name, guild.id.get())
            .await;
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, full: Option<Guild>) {
        // unavailable 代表 Discord 端暫時故障，不是被移出
        if incomplete.unavailable {
            log::warn!("伺服器 {} 暫時無法使用", incomplete.id);
            return;
        }

        let guild_id = incomplete.id.get();
        self.trivia.stop_guild_round(guild_id).await;

        let guild_name = full
            .map(|guild| guild.name)
            .unwrap_or_else(|| "Unknown Server".to_string());
        log::info!("已離開伺服器: {} ({})", guild_name, guild_id);
        self.webhook
            .notify(GuildEvent::Left, &guild_name, guild_id)
            .await;
    }
}
