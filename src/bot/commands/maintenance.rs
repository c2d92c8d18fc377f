use crate::bot::broadcast::{UpdateStatus, notify_all_guilds};
use crate::bot::{Context, Error, ensure_developer};
use poise::CreateReply;
use std::sync::atomic::Ordering;

/// 切換維護模式 (開發者限定)
#[poise::command(slash_command, default_member_permissions = "ADMINISTRATOR")]
pub async fn maintenance(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_developer(ctx).await? {
        return Ok(());
    }

    let data = ctx.data();
    let enabled = !data.maintenance.fetch_xor(true, Ordering::SeqCst);
    log::info!("維護模式設定為: {} (by {})", enabled, ctx.author().id);

    let (content, status) = if enabled {
        let stopped = data.trivia.suspend().await;
        log::info!("維護模式已停止 {} 個進行中的問答", stopped);
        (
            format!("維護模式已開啟，已停止 {} 個進行中的問答。", stopped),
            UpdateStatus::Maintenance,
        )
    } else {
        data.trivia.resume();
        // 題庫為空時 start 會回報錯誤，維護模式照樣關閉
        if let Err(e) = data.trivia.start() {
            log::warn!("恢復自動問答失敗: {}", e);
        }
        (
            "維護模式已關閉，自動問答恢復運作。".to_string(),
            UpdateStatus::Backup,
        )
    };

    let serenity_ctx = ctx.serenity_context().clone();
    tokio::spawn(async move {
        notify_all_guilds(&serenity_ctx, status, "").await;
    });

    ctx.send(CreateReply::default().content(content).ephemeral(true))
        .await?;
    Ok(())
}
