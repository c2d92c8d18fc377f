pub mod broadcast;
pub mod commands;
pub mod data;
pub mod handler;
pub mod transport;

pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, data::BotData, Error>;

pub fn commands() -> Vec<poise::Command<data::BotData, Error>> {
    vec![
        commands::trivia::set_trivia_channel(),
        commands::trivia::clear_trivia_channel(),
        commands::trivia::trivia_status(),
        commands::maintenance::maintenance(),
        commands::update::update(),
        commands::info::about(),
        commands::info::contact(),
        commands::help::help(),
    ]
}

/// 維護模式下只允許 /maintenance
pub async fn command_check(ctx: Context<'_>) -> Result<bool, Error> {
    if !ctx.data().is_maintenance() || ctx.command().name == "maintenance" {
        return Ok(true);
    }

    ctx.send(
        poise::CreateReply::default()
            .content("機器人目前維護中，請稍後再試。")
            .ephemeral(true),
    )
    .await?;
    Ok(false)
}

/// 呼叫者不是設定檔中的開發者時回覆並回傳 false
pub async fn ensure_developer(ctx: Context<'_>) -> Result<bool, Error> {
    let is_developer = {
        let config_manager = ctx.data().config.lock().await;
        config_manager.is_developer(ctx.author().id.get())
    };

    if !is_developer {
        ctx.send(
            poise::CreateReply::default()
                .content("您沒有權限執行此操作！")
                .ephemeral(true),
        )
        .await?;
    }
    Ok(is_developer)
}

/// 檢查未通過且沒有錯誤 (維護模式擋下) 屬於正常流程
fn check_failure_level(error: Option<&Error>) -> log::Level {
    match error {
        Some(_) => log::Level::Error,
        None => log::Level::Debug,
    }
}

pub async fn on_error(error: poise::FrameworkError<'_, data::BotData, Error>) {
    match error {
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            log::log!(
                check_failure_level(error.as_ref()),
                "指令 {} 未通過檢查: {:?}",
                ctx.command().name,
                error
            );
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            log::error!("指令執行錯誤: {}", error);
            if let Err(why) = ctx.say(format!("發生錯誤: {}", error)).await {
                log::error!("發送錯誤訊息失敗: {}", why);
            }
        }
        other => log::error!("指令執行錯誤: {}", other),
    }
}
