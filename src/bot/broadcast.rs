use poise::ChoiceParameter;
use serenity::all::{
    Cache, ChannelId, ChannelType, Colour, Context, CreateEmbed, CreateEmbedFooter, CreateMessage,
    GuildId,
};

use crate::bot::transport::FOOTER;

/// 全伺服器公告的種類
#[derive(Clone, Copy, Debug, PartialEq, Eq, ChoiceParameter)]
pub enum UpdateStatus {
    #[name = "maintenance"]
    Maintenance,
    #[name = "backup"]
    Backup,
    #[name = "new_features"]
    NewFeatures,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    pub title: &'static str,
    pub description: String,
    pub colour: u32,
}

impl UpdateStatus {
    pub fn notice(self, features: &str) -> UpdateNotice {
        let (description, colour) = match self {
            UpdateStatus::Maintenance => (
                "機器人維護中，指令與自動問答暫停，恢復時會再通知。".to_string(),
                0xFF0000,
            ),
            UpdateStatus::Backup => ("機器人已恢復運作！".to_string(), 0x00FF00),
            UpdateStatus::NewFeatures => {
                let features = features.trim();
                let headline = "機器人帶著新功能回來了！";
                if features.is_empty() {
                    (headline.to_string(), 0xFFA500)
                } else {
                    (format!("{}\n\n{}", headline, features), 0xFFA500)
                }
            }
        };

        UpdateNotice {
            title: "Trivia Bot 更新",
            description,
            colour,
        }
    }
}

fn render_notice(notice: &UpdateNotice) -> CreateEmbed {
    CreateEmbed::default()
        .title(notice.title)
        .description(notice.description.clone())
        .colour(Colour::new(notice.colour))
        .footer(CreateEmbedFooter::new(FOOTER))
}

/// 伺服器中機器人可發言的文字頻道，依頻道排序
///
/// 快取裡沒有機器人自己的成員資料時不做權限過濾，交給實際發送失敗再換下一個頻道。
fn postable_channels(cache: &Cache, guild_id: GuildId) -> Vec<ChannelId> {
    let bot_id = cache.current_user().id;
    let Some(guild) = cache.guild(guild_id) else {
        return Vec::new();
    };
    let member = guild.members.get(&bot_id);

    let mut channels: Vec<_> = guild
        .channels
        .values()
        .filter(|channel| channel.kind == ChannelType::Text)
        .filter(|channel| {
            member.is_none_or(|member| guild.user_permissions_in(channel, member).send_messages())
        })
        .map(|channel| (channel.position, channel.id))
        .collect();
    channels.sort();
    channels.into_iter().map(|(_, id)| id).collect()
}

/// 對每個伺服器第一個可發言的文字頻道送出公告，回傳成功送達的伺服器數
pub async fn notify_all_guilds(ctx: &Context, status: UpdateStatus, features: &str) -> usize {
    let notice = status.notice(features);
    let guild_ids = ctx.cache.guilds();
    let mut delivered = 0;

    for guild_id in guild_ids {
        let channels = postable_channels(&ctx.cache, guild_id);
        let mut sent = false;
        for channel_id in channels {
            let message = CreateMessage::new().embed(render_notice(&notice));
            match channel_id.send_message(ctx, message).await {
                Ok(_) => {
                    sent = true;
                    break;
                }
                Err(e) => {
                    log::debug!("伺服器 {} 頻道 {} 無法發送公告: {}", guild_id, channel_id, e);
                }
            }
        }

        if sent {
            delivered += 1;
        } else {
            log::warn!("伺服器 {} 沒有可發送更新通知的頻道", guild_id);
        }
    }

    log::info!("更新通知 ({}) 已送達 {} 個伺服器", status.name(), delivered);
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maintenance_and_backup_notices() {
        let down = UpdateStatus::Maintenance.notice("ignored");
        assert_eq!(down.colour, 0xFF0000);
        assert!(down.description.contains("維護中"));
        assert!(!down.description.contains("ignored"));

        let back = UpdateStatus::Backup.notice("");
        assert_eq!(back.colour, 0x00FF00);
        assert!(back.description.contains("恢復運作"));
    }

    #[test]
    fn test_new_features_notice_includes_details() {
        let notice = UpdateStatus::NewFeatures.notice("  新增 /trivia-status  ");
        assert_eq!(notice.colour, 0xFFA500);
        assert!(notice.description.ends_with("\n\n新增 /trivia-status"));

        let bare = UpdateStatus::NewFeatures.notice("   ");
        assert_eq!(bare.description, "機器人帶著新功能回來了！");
    }

    #[test]
    fn test_status_choice_names() {
        assert_eq!(UpdateStatus::Maintenance.name(), "maintenance");
        assert_eq!(UpdateStatus::NewFeatures.name(), "new_features");
    }
}
