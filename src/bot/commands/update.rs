use crate::bot::broadcast::{UpdateStatus, notify_all_guilds};
use crate::bot::{Context, Error, ensure_developer};
use poise::{ChoiceParameter, CreateReply};

/// 對所有伺服器發送更新通知 (開發者限定)
#[poise::command(slash_command, default_member_permissions = "ADMINISTRATOR")]
pub async fn update(
    ctx: Context<'_>,
    #[description = "更新狀態"] status: UpdateStatus,
    #[description = "新功能說明 (new_features 使用)"] features: Option<String>,
) -> Result<(), Error> {
    if !ensure_developer(ctx).await? {
        return Ok(());
    }

    let features = features.unwrap_or_default();
    log::info!(
        "發送更新通知: {} {} (by {})",
        status.name(),
        features,
        ctx.author().id
    );

    let serenity_ctx = ctx.serenity_context().clone();
    let details = features.clone();
    tokio::spawn(async move {
        notify_all_guilds(&serenity_ctx, status, &details).await;
    });

    let content = if features.is_empty() {
        format!("已送出更新通知: {}", status.name())
    } else {
        format!("已送出更新通知: {}，內容: {}", status.name(), features)
    };
    ctx.send(CreateReply::default().content(content).ephemeral(true))
        .await?;
    Ok(())
}
