use crate::bot::{Context, Error};
use poise::ChoiceParameter;

#[derive(Clone, Copy, Debug, ChoiceParameter)]
pub enum HelpMode {
    #[name = "summary"]
    Summary,
    #[name = "detailed"]
    Detailed,
}

/// 顯示指令快速說明
#[poise::command(slash_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "顯示模式"] mode: Option<HelpMode>,
) -> Result<(), Error> {
    match mode.unwrap_or(HelpMode::Summary) {
        HelpMode::Summary => {
            ctx.say(
                "Trivia Bot 指令速覽:\n\
\n\
/set-trivia-channel <頻道> <間隔> <時限> — 設定自動問答。\n\
/clear-trivia-channel — 關閉本伺服器的自動問答。\n\
/trivia-status — 查看設定與目前回合。\n\
/maintenance — 切換維護模式 (開發者)。\n\
/update <狀態> [內容] — 對所有伺服器發送更新通知 (開發者)。\n\
/about、/contact — 機器人資訊與聯絡方式。\n\
/help [summary|detailed] — 顯示這份簡表或詳細版。",
            )
            .await?;
        }
        HelpMode::Detailed => {
            ctx.say(
                r#"
# Trivia Bot 說明

## 自動問答
- `/set-trivia-channel <頻道> <間隔> <時限>`：
  - 間隔：每隔幾分鐘出一題 (1-300)
  - 時限：每題可作答的分鐘數 (1-30)
- 直接在問答頻道輸入答案即可，不分大小寫。第一個答對的人獲勝。
- 時間結束前 30 秒會提醒一次；時間到會公布答案。
- 同一伺服器在所有題目都出過一次之前不會重複出題。
- `/clear-trivia-channel`：關閉自動問答並結束進行中的回合。
- `/trivia-status`：查看頻道、間隔、時限與目前回合。

## 管理 (開發者限定)
- `/maintenance`：開啟時停止所有回合並暫停出題，其他指令暫停使用；再次執行即恢復。切換時會通知所有伺服器。
- `/update <maintenance|backup|new_features> [內容]`：對所有伺服器發送更新通知。

## 其他
- `/about`：機器人簡介與版本。
- `/contact`：支援伺服器與開發者。
- `/help [summary|detailed]`：切換本說明的摘要或完整內容。
                "#,
            )
            .await?;
        }
    }

    Ok(())
}
