use std::sync::Arc;

use serenity::all::{
    Channel, ChannelId, ChannelType, Colour, CreateEmbed, CreateEmbedFooter, CreateMessage,
    EditMessage, Http, MessageId, MessageReference,
};
use serenity::async_trait;

use crate::trivia::{MessageRef, Transport, TransportError, TriviaContent};

pub const FOOTER: &str = "Powered by Trivia Bot";

impl From<serenity::Error> for TransportError {
    fn from(e: serenity::Error) -> Self {
        TransportError::Api(e.to_string())
    }
}

/// 以 Discord HTTP API 實作的訊息傳輸
pub struct SerenityTransport {
    http: Arc<Http>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

/// 嵌入訊息的說明文字
pub fn describe(content: &TriviaContent) -> String {
    match content {
        TriviaContent::Question {
            prompt,
            hint,
            time_limit_minutes,
            ..
        } => {
            let mut description = format!("**題目：** {}\n", prompt);
            if let Some(hint) = hint {
                description.push_str(&format!("**提示：** {}\n", hint));
            }
            description.push_str(&format!(
                "你有 {} 分鐘可以作答！直接在頻道輸入答案。",
                time_limit_minutes
            ));
            description
        }
        TriviaContent::TimedOut { answer, .. } => {
            format!("時間到！正確答案是：**{}**。", answer)
        }
        TriviaContent::Solved { answer, winner_id } => {
            format!("<@{}> 答對了！答案是 **{}**。做得好！", winner_id, answer)
        }
    }
}

pub fn render_embed(content: &TriviaContent) -> CreateEmbed {
    let (title, colour, image) = match content {
        TriviaContent::Question { image, .. } => ("問答時間！", 0x00AAFF, image.as_ref()),
        TriviaContent::TimedOut { image, .. } => ("問答結束！", 0xFF4500, image.as_ref()),
        TriviaContent::Solved { .. } => ("答對了！", 0x00FF00, None),
    };

    let embed = CreateEmbed::default()
        .title(title)
        .description(describe(content))
        .colour(Colour::new(colour))
        .footer(CreateEmbedFooter::new(FOOTER));
    match image {
        Some(url) => embed.image(url.clone()),
        None => embed,
    }
}

#[async_trait]
impl Transport for SerenityTransport {
    async fn post_message(
        &self,
        channel_id: u64,
        content: &TriviaContent,
    ) -> Result<MessageRef, TransportError> {
        let message = ChannelId::new(channel_id)
            .send_message(
                &self.http,
                CreateMessage::new().embed(render_embed(content)),
            )
            .await?;
        Ok(MessageRef {
            channel_id,
            message_id: message.id.get(),
        })
    }

    async fn edit_message(
        &self,
        message: MessageRef,
        content: &TriviaContent,
    ) -> Result<(), TransportError> {
        ChannelId::new(message.channel_id)
            .edit_message(
                &self.http,
                MessageId::new(message.message_id),
                EditMessage::new().embed(render_embed(content)),
            )
            .await?;
        Ok(())
    }

    async fn send_message(&self, channel_id: u64, text: &str) -> Result<(), TransportError> {
        ChannelId::new(channel_id)
            .say(&self.http, text)
            .await?;
        Ok(())
    }

    async fn reply(&self, message: MessageRef, text: &str) -> Result<(), TransportError> {
        let reference = MessageReference::from((
            ChannelId::new(message.channel_id),
            MessageId::new(message.message_id),
        ));
        ChannelId::new(message.channel_id)
            .send_message(
                &self.http,
                CreateMessage::new()
                    .content(text)
                    .reference_message(reference),
            )
            .await?;
        Ok(())
    }

    async fn is_text_capable(&self, guild_id: u64, channel_id: u64) -> bool {
        match ChannelId::new(channel_id)
            .to_channel(&self.http)
            .await
        {
            Ok(Channel::Guild(channel)) => {
                channel.guild_id.get() == guild_id
                    && matches!(
                        channel.kind,
                        ChannelType::Text | ChannelType::News
                    )
            }
            Ok(_) => false,
            Err(e) => {
                log::debug!("取得頻道 {} 失敗: {}", channel_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_question_with_hint() {
        let description = describe(&TriviaContent::Question {
            prompt: "What is 2+2?".into(),
            hint: Some("even".into()),
            image: None,
            time_limit_minutes: 2,
        });
        assert!(description.contains("What is 2+2?"));
        assert!(description.contains("**提示：** even"));
        assert!(description.contains("2 分鐘"));
    }

    #[test]
    fn test_describe_question_without_hint() {
        let description = describe(&TriviaContent::Question {
            prompt: "Capital of France?".into(),
            hint: None,
            image: None,
            time_limit_minutes: 5,
        });
        assert!(!description.contains("提示"));
    }

    #[test]
    fn test_describe_reveals() {
        let timed_out = describe(&TriviaContent::TimedOut {
            answer: "paris".into(),
            image: None,
        });
        assert!(timed_out.contains("**paris**"));

        let solved = describe(&TriviaContent::Solved {
            answer: "alpha".into(),
            winner_id: 55,
        });
        assert!(solved.contains("<@55>"));
        assert!(solved.contains("**alpha**"));
    }
}
