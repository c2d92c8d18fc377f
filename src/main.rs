mod bot;
mod models;
mod trivia;
mod utils;

use std::env;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::anyhow;
use poise::serenity_prelude as serenity;
use tokio::sync::Mutex;

use crate::bot::data::BotData;
use crate::bot::handler::BotHandler;
use crate::bot::transport::SerenityTransport;
use crate::trivia::TriviaScheduler;
use crate::utils::config::ConfigManager;
use crate::utils::questions::QuestionBank;
use crate::utils::webhook::WebhookNotifier;

#[tokio::main]
async fn main() -> Result<(), bot::Error> {
    dotenvy::dotenv().ok();

    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.json".to_string());
    let config_manager =
        ConfigManager::new(&config_path).map_err(|e| anyhow!("設定管理器初始化失敗: {}", e))?;

    if let Err(e) = utils::logger::BotLogger::init(config_manager.global.log_file.as_deref()) {
        eprintln!("日誌初始化失敗: {}", e);
    }

    let token =
        env::var("DISCORD_TOKEN").map_err(|_| anyhow!("預期 DISCORD_TOKEN 環境變數，但找不到!"))?;

    // 題庫載入失敗不影響其他功能，只是不會啟動自動問答
    let bank = match QuestionBank::load(&config_manager.global.question_bank_path) {
        Ok(bank) => {
            log::info!("已載入 {} 題問答", bank.len());
            bank
        }
        Err(e) => {
            log::error!(
                "載入題庫 {} 失敗: {}",
                config_manager.global.question_bank_path,
                e
            );
            QuestionBank::default()
        }
    };

    let sweep_interval = config_manager.global.sweep_interval();
    let shared_config = Arc::new(Mutex::new(config_manager));

    let http = Arc::new(serenity::Http::new(&token));
    let trivia = Arc::new(TriviaScheduler::new(
        Arc::new(bank),
        shared_config.clone(),
        Arc::new(SerenityTransport::new(http)),
        sweep_interval,
    ));
    let maintenance = Arc::new(AtomicBool::new(false));

    // MESSAGE_CONTENT 為特權 intent，需在 Developer Portal 開啟
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let setup_config = Arc::clone(&shared_config);
    let setup_trivia = Arc::clone(&trivia);
    let setup_maintenance = Arc::clone(&maintenance);
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: crate::bot::commands(),
            command_check: Some(|ctx| Box::pin(crate::bot::command_check(ctx))),
            pre_command: |ctx| {
                Box::pin(async move {
                    log::info!(
                        "指令 {} 由 {} 在伺服器 {:?} 執行",
                        ctx.command().name,
                        ctx.author().name,
                        ctx.guild_id()
                    );
                })
            },
            on_error: |error| Box::pin(crate::bot::on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let config = Arc::clone(&setup_config);
            let trivia = Arc::clone(&setup_trivia);
            let maintenance = Arc::clone(&setup_maintenance);
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                log::info!("{} 已經上線!", ready.user.name);

                if let Err(e) = trivia.start() {
                    log::error!("自動問答未啟動: {}", e);
                }

                Ok(BotData {
                    config,
                    trivia,
                    maintenance,
                })
            })
        })
        .build();

    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .event_handler(BotHandler::new(trivia, WebhookNotifier::from_env()))
        .await
        .map_err(|e| anyhow!("建立 Discord 客戶端失敗: {}", e))?;

    client
        .start()
        .await
        .map_err(|e| anyhow!("機器人啟動失敗: {}", e))?;

    Ok(())
}
