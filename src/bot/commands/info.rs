use crate::bot::transport::FOOTER;
use crate::bot::{Context, Error};
use poise::{CreateReply, serenity_prelude as serenity};

const ABOUT_TEXT: &str = "Trivia Bot 會在設定的頻道定時出題，第一個答對的人獲勝。";

fn developer_mentions(developers: &[u64]) -> String {
    if developers.is_empty() {
        return "未設定".to_string();
    }
    developers
        .iter()
        .map(|id| format!("<@{}>", id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn support_link(support_url: Option<&str>) -> String {
    match support_url {
        Some(url) if !url.trim().is_empty() => format!("[點此加入]({})", url.trim()),
        _ => "請聯絡伺服器管理員".to_string(),
    }
}

/// 關於本機器人
#[poise::command(slash_command)]
pub async fn about(ctx: Context<'_>) -> Result<(), Error> {
    let developers = {
        let config_manager = ctx.data().config.lock().await;
        config_manager.global.developers.clone()
    };

    let embed = serenity::CreateEmbed::default()
        .title("關於 Trivia Bot")
        .description(ABOUT_TEXT)
        .field("開發者", developer_mentions(&developers), true)
        .field("版本", env!("CARGO_PKG_VERSION"), true)
        .colour(serenity::Colour::new(0x00AAFF))
        .footer(serenity::CreateEmbedFooter::new(FOOTER));
    ctx.send(CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// 取得支援聯絡方式
#[poise::command(slash_command)]
pub async fn contact(ctx: Context<'_>) -> Result<(), Error> {
    let (developers, support_url) = {
        let config_manager = ctx.data().config.lock().await;
        (
            config_manager.global.developers.clone(),
            config_manager.global.support_url.clone(),
        )
    };

    let embed = serenity::CreateEmbed::default()
        .title("聯絡 Trivia Bot 支援")
        .description("需要協助嗎？歡迎聯絡我們！")
        .field("支援伺服器", support_link(support_url.as_deref()), true)
        .field("開發者", developer_mentions(&developers), true)
        .colour(serenity::Colour::new(0xFF4500))
        .footer(serenity::CreateEmbedFooter::new(FOOTER));
    ctx.send(CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
