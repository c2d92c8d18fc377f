use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuildEvent {
    Joined,
    Left,
}

impl GuildEvent {
    fn env_name(self) -> &'static str {
        match self {
            GuildEvent::Joined => "WEBHOOK_JOIN_URL",
            GuildEvent::Left => "WEBHOOK_LEAVE_URL",
        }
    }
}

/// 機器人加入/離開伺服器時通知管理用的 webhook
#[derive(Debug, Clone, Default)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    join_url: Option<String>,
    leave_url: Option<String>,
}

impl WebhookNotifier {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            join_url: non_empty_var(GuildEvent::Joined.env_name()),
            leave_url: non_empty_var(GuildEvent::Left.env_name()),
        }
    }

    fn url_for(&self, event: GuildEvent) -> Option<&str> {
        match event {
            GuildEvent::Joined => self.join_url.as_deref(),
            GuildEvent::Left => self.leave_url.as_deref(),
        }
    }

    /// 送出通知；失敗只記錄不回傳
    pub async fn notify(&self, event: GuildEvent, guild_name: &str, guild_id: u64) {
        let Some(url) = self.url_for(event) else {
            log::warn!("{} 未設定，略過伺服器通知", event.env_name());
            return;
        };

        if let Err(e) = self.post(url, &build_payload(event, guild_name, guild_id)).await {
            log::error!("發送伺服器通知 webhook 失敗: {}", e);
        }
    }

    async fn post(&self, url: &str, payload: &Value) -> Result<(), WebhookError> {
        self.client
            .post(url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub fn build_payload(event: GuildEvent, guild_name: &str, guild_id: u64) -> Value {
    let (title, description) = match event {
        GuildEvent::Joined => ("機器人已加入！", format!("已加入 **{}**！", guild_name)),
        GuildEvent::Left => ("機器人已離開", format!("已離開 **{}**。", guild_name)),
    };

    json!({
        "embeds": [{
            "title": title,
            "description": description,
            "color": 0xFF4500,
            "fields": [
                { "name": "Server ID", "value": guild_id.to_string(), "inline": true },
                { "name": "Server Name", "value": guild_name, "inline": true },
            ],
        }]
    })
}
