use crate::bot::{Context, Error};
use crate::models::types::{ANSWER_TIME_LIMIT_RANGE, ROUND_INTERVAL_RANGE, TriviaSettings};
use poise::{CreateReply, serenity_prelude as serenity};

/// 設定自動問答頻道、出題間隔與作答時限
#[poise::command(
    slash_command,
    rename = "set-trivia-channel",
    default_member_permissions = "MANAGE_CHANNELS"
)]
pub async fn set_trivia_channel(
    ctx: Context<'_>,
    #[description = "要發送問答的文字頻道"]
    #[channel_types("Text", "News")]
    channel: serenity::ChannelId,
    #[description = "每隔幾分鐘出一題 (1-300)"]
    #[min = 1]
    #[max = 300]
    duration: u32,
    #[description = "每題的作答時限，分鐘 (1-30)"]
    #[min = 1]
    #[max = 30]
    answer_time_limit: u32,
) -> Result<(), Error> {
    log::info!(
        "執行問答頻道設定指令: <#{}> {} 分鐘/{} 分鐘 for guild {:?}",
        channel,
        duration,
        answer_time_limit,
        ctx.guild_id()
    );

    let guild_id = match ctx.guild_id() {
        Some(id) => id.get(),
        None => {
            ctx.say("此指令只能在伺服器中使用").await?;
            return Ok(());
        }
    };

    let settings = TriviaSettings::new(
        channel.get(),
        u64::from(duration).clamp(*ROUND_INTERVAL_RANGE.start(), *ROUND_INTERVAL_RANGE.end()),
        u64::from(answer_time_limit).clamp(
            *ANSWER_TIME_LIMIT_RANGE.start(),
            *ANSWER_TIME_LIMIT_RANGE.end(),
        ),
    );

    let result = {
        let mut config_manager = ctx.data().config.lock().await;
        config_manager.set_trivia_settings(guild_id, settings)
    };

    match result {
        Ok(_) => {
            log::info!("伺服器 {} 問答設定已更新: {:?}", guild_id, settings);
            ctx.send(
                CreateReply::default()
                    .content(format!(
                        "問答頻道已設定為 <#{}>，每 {} 分鐘出一題，每題有 {} 分鐘可以作答。",
                        channel, settings.duration, settings.answer_time_limit
                    ))
                    .ephemeral(true),
            )
            .await?;
        }
        Err(e) => {
            log::error!("儲存問答設定失敗: {:?}", e);
            ctx.send(
                CreateReply::default()
                    .content("儲存問答設定時發生錯誤")
                    .ephemeral(true),
            )
            .await?;
            return Err(e.into());
        }
    }

    Ok(())
}

/// 關閉本伺服器的自動問答
#[poise::command(
    slash_command,
    rename = "clear-trivia-channel",
    default_member_permissions = "MANAGE_CHANNELS"
)]
pub async fn clear_trivia_channel(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = match ctx.guild_id() {
        Some(id) => id.get(),
        None => {
            ctx.say("此指令只能在伺服器中使用").await?;
            return Ok(());
        }
    };

    let removed = {
        let mut config_manager = ctx.data().config.lock().await;
        config_manager.clear_trivia_settings(guild_id)?
    };
    ctx.data().trivia.stop_guild_round(guild_id).await;

    let reply = if removed {
        log::info!("伺服器 {} 已關閉自動問答", guild_id);
        "已關閉本伺服器的自動問答"
    } else {
        "本伺服器尚未設定自動問答"
    };
    ctx.send(CreateReply::default().content(reply).ephemeral(true))
        .await?;

    Ok(())
}

/// 查看自動問答設定與目前回合
#[poise::command(slash_command, rename = "trivia-status")]
pub async fn trivia_status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = match ctx.guild_id() {
        Some(id) => id.get(),
        None => {
            ctx.say("此指令只能在伺服器中使用").await?;
            return Ok(());
        }
    };

    let settings = {
        let config_manager = ctx.data().config.lock().await;
        config_manager.get_guild_config(guild_id).trivia
    };
    let Some(settings) = settings else {
        ctx.say("本伺服器尚未設定自動問答，請使用 /set-trivia-channel")
            .await?;
        return Ok(());
    };

    let trivia = &ctx.data().trivia;
    let mut description = format!(
        "頻道: <#{}>\n出題間隔: {} 分鐘\n作答時限: {} 分鐘\n",
        settings.channel_id,
        settings.round_interval_minutes(),
        settings.answer_time_limit_minutes()
    );
    match trivia.active_round_summary(guild_id).await {
        Some(round) => description.push_str(&format!(
            "目前回合: #{} (題目 {})，已進行 {} 秒",
            round.round_id,
            round.question_index + 1,
            round.elapsed.as_secs()
        )),
        None => description.push_str("目前沒有進行中的回合"),
    }
    if !trivia.is_running() || trivia.is_suspended() {
        description.push_str("\n⚠️ 自動問答目前未運作");
    }

    let embed = serenity::CreateEmbed::default()
        .title("自動問答狀態")
        .description(description)
        .colour(serenity::Colour::BLURPLE);
    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}
