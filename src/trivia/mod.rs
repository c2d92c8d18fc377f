//! 自動問答 (auto-trivia) 核心。
//!
//! 每個伺服器各自依設定的間隔出題、收集第一個正確答案，並在作答時限到期前
//! 30 秒送出提醒、到期時公布答案。核心只透過下列介面與外界互動，不直接依賴
//! Discord：
//! - [`GuildConfigStore`]：讀取伺服器設定快照
//! - [`Transport`]：發送/編輯訊息
//!
//! 狀態與計時器由 [`scheduler::TriviaScheduler`] 擁有，答案比對在
//! [`evaluator`]。

use serenity::async_trait;
use thiserror::Error;

use crate::models::types::TriviaSettings;

pub mod evaluator;
pub mod scheduler;
pub mod state;

pub use evaluator::{IncomingMessage, Verdict};
pub use scheduler::TriviaScheduler;

#[derive(Debug, Error)]
pub enum TriviaError {
    #[error("題庫為空，自動問答不會啟動")]
    QuestionBankEmpty,
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Discord API error: {0}")]
    Api(String),
}

/// 已發出訊息的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel_id: u64,
    pub message_id: u64,
}

/// 核心決定要送出的內容；呈現方式由 [`Transport`] 實作決定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriviaContent {
    Question {
        prompt: String,
        hint: Option<String>,
        image: Option<String>,
        time_limit_minutes: u64,
    },
    /// 時間到，公布答案
    TimedOut {
        answer: String,
        image: Option<String>,
    },
    /// 有人答對
    Solved {
        answer: String,
        winner_id: u64,
    },
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_message(
        &self,
        channel_id: u64,
        content: &TriviaContent,
    ) -> Result<MessageRef, TransportError>;

    async fn edit_message(
        &self,
        message: MessageRef,
        content: &TriviaContent,
    ) -> Result<(), TransportError>;

    async fn send_message(&self, channel_id: u64, text: &str) -> Result<(), TransportError>;

    /// 回覆某則訊息 (答題回應)
    async fn reply(&self, message: MessageRef, text: &str) -> Result<(), TransportError>;

    async fn is_text_capable(&self, guild_id: u64, channel_id: u64) -> bool;
}

#[async_trait]
pub trait GuildConfigStore: Send + Sync {
    async fn trivia_settings(&self, guild_id: u64) -> Option<TriviaSettings>;

    /// 所有已設定自動問答的伺服器快照
    async fn configured_guilds(&self) -> Vec<(u64, TriviaSettings)>;
}

pub(crate) fn normalize_answer(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
pub(crate) mod testing {
    //! 測試用的記錄型 transport 與記憶體設定

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Post(u64, TriviaContent),
        Edit(MessageRef, TriviaContent),
        Send(u64, String),
        Reply(MessageRef, String),
    }

    #[derive(Default)]
    pub struct RecordingTransport {
        pub calls: Mutex<Vec<Call>>,
        pub fail_posts: AtomicBool,
        pub fail_edits: AtomicBool,
        pub unusable_channels: Mutex<Vec<u64>>,
        next_id: AtomicU64,
    }

    impl RecordingTransport {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn posts(&self) -> Vec<TriviaContent> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Post(_, content) => Some(content),
                    _ => None,
                })
                .collect()
        }

        pub fn edits(&self) -> Vec<TriviaContent> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Edit(_, content) => Some(content),
                    _ => None,
                })
                .collect()
        }

        pub fn sends(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Send(_, text) => Some(text),
                    _ => None,
                })
                .collect()
        }

        pub fn replies(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Reply(_, text) => Some(text),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn post_message(
            &self,
            channel_id: u64,
            content: &TriviaContent,
        ) -> Result<MessageRef, TransportError> {
            // 模擬網路 I/O 的暫停點
            tokio::task::yield_now().await;
            if self.fail_posts.load(Ordering::SeqCst)
                || self.unusable_channels.lock().unwrap().contains(&channel_id)
            {
                return Err(TransportError::Api("post rejected".into()));
            }
            self.calls
                .lock()
                .unwrap()
                .push(Call::Post(channel_id, content.clone()));
            Ok(MessageRef {
                channel_id,
                message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1000,
            })
        }

        async fn edit_message(
            &self,
            message: MessageRef,
            content: &TriviaContent,
        ) -> Result<(), TransportError> {
            tokio::task::yield_now().await;
            self.calls
                .lock()
                .unwrap()
                .push(Call::Edit(message, content.clone()));
            if self.fail_edits.load(Ordering::SeqCst) {
                return Err(TransportError::Api("unknown message".into()));
            }
            Ok(())
        }

        async fn send_message(&self, channel_id: u64, text: &str) -> Result<(), TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Send(channel_id, text.to_string()));
            Ok(())
        }

        async fn reply(&self, message: MessageRef, text: &str) -> Result<(), TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Reply(message, text.to_string()));
            Ok(())
        }

        async fn is_text_capable(&self, _guild_id: u64, channel_id: u64) -> bool {
            !self.unusable_channels.lock().unwrap().contains(&channel_id)
        }
    }

    #[derive(Default)]
    pub struct MemoryConfigStore {
        pub guilds: Mutex<HashMap<u64, TriviaSettings>>,
    }

    impl MemoryConfigStore {
        pub fn with(guild_id: u64, settings: TriviaSettings) -> Self {
            let store = Self::default();
            store.guilds.lock().unwrap().insert(guild_id, settings);
            store
        }

        pub fn remove(&self, guild_id: u64) {
            self.guilds.lock().unwrap().remove(&guild_id);
        }
    }

    #[async_trait]
    impl GuildConfigStore for MemoryConfigStore {
        async fn trivia_settings(&self, guild_id: u64) -> Option<TriviaSettings> {
            self.guilds.lock().unwrap().get(&guild_id).copied()
        }

        async fn configured_guilds(&self) -> Vec<(u64, TriviaSettings)> {
            let mut guilds: Vec<_> = self
                .guilds
                .lock()
                .unwrap()
                .iter()
                .map(|(id, settings)| (*id, *settings))
                .collect();
            guilds.sort_by_key(|(id, _)| *id);
            guilds
        }
    }
}
