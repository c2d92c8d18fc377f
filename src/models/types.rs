use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

pub const DEFAULT_ROUND_INTERVAL_MINUTES: u64 = 10;
pub const DEFAULT_ANSWER_TIME_LIMIT_MINUTES: u64 = 5;

/// 出題間隔的有效範圍 (分鐘)
pub const ROUND_INTERVAL_RANGE: RangeInclusive<u64> = 1..=300;
/// 作答時限的有效範圍 (分鐘)
pub const ANSWER_TIME_LIMIT_RANGE: RangeInclusive<u64> = 1..=30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub developers: Vec<u64>,
    #[serde(default = "default_question_bank_path")]
    pub question_bank_path: String,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64, // 秒
    #[serde(default = "default_log_file")]
    pub log_file: Option<String>,
    /// /contact 顯示的支援伺服器邀請連結
    #[serde(default)]
    pub support_url: Option<String>,
}

fn default_question_bank_path() -> String {
    "trivia-questions.json".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_log_file() -> Option<String> {
    Some("bot.log".to_string())
}

impl GlobalConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            developers: Vec::new(),
            question_bank_path: default_question_bank_path(),
            sweep_interval_secs: default_sweep_interval_secs(),
            log_file: default_log_file(),
            support_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildConfig {
    #[serde(default)]
    pub trivia: Option<TriviaSettings>,
}

/// 單一伺服器的自動問答設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaSettings {
    pub channel_id: u64,
    /// 出題間隔 (分鐘)
    #[serde(default)]
    pub duration: u64,
    /// 作答時限 (分鐘)
    #[serde(default)]
    pub answer_time_limit: u64,
}

impl TriviaSettings {
    pub fn new(channel_id: u64, duration: u64, answer_time_limit: u64) -> Self {
        Self {
            channel_id,
            duration,
            answer_time_limit,
        }
    }

    /// 出題間隔 (分鐘)；0 或超出範圍 (手動改壞的設定檔) 視為未設定
    pub fn round_interval_minutes(&self) -> u64 {
        within_or(
            self.duration,
            ROUND_INTERVAL_RANGE,
            DEFAULT_ROUND_INTERVAL_MINUTES,
        )
    }

    pub fn round_interval(&self) -> Duration {
        Duration::from_secs(self.round_interval_minutes() * 60)
    }

    pub fn answer_time_limit_minutes(&self) -> u64 {
        within_or(
            self.answer_time_limit,
            ANSWER_TIME_LIMIT_RANGE,
            DEFAULT_ANSWER_TIME_LIMIT_MINUTES,
        )
    }

    pub fn answer_time_limit(&self) -> Duration {
        Duration::from_secs(self.answer_time_limit_minutes() * 60)
    }
}

fn within_or(value: u64, range: RangeInclusive<u64>, fallback: u64) -> u64 {
    if range.contains(&value) {
        value
    } else {
        fallback
    }
}

/// 題庫中的一筆題目，以在題庫中的位置識別
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "question")]
    pub prompt: String,
    pub answer: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivia_settings_fall_back_on_zero() {
        let settings = TriviaSettings::new(1, 0, 0);
        assert_eq!(settings.round_interval(), Duration::from_secs(600));
        assert_eq!(settings.answer_time_limit(), Duration::from_secs(300));
        assert_eq!(settings.answer_time_limit_minutes(), 5);
    }

    #[test]
    fn test_trivia_settings_out_of_range_use_defaults() {
        let settings = TriviaSettings::new(1, u64::MAX / 2, 31);
        assert_eq!(settings.round_interval(), Duration::from_secs(600));
        assert_eq!(settings.answer_time_limit(), Duration::from_secs(300));

        let edge = TriviaSettings::new(1, 300, 30);
        assert_eq!(edge.round_interval_minutes(), 300);
        assert_eq!(edge.answer_time_limit_minutes(), 30);
    }

    #[test]
    fn test_trivia_settings_missing_fields() {
        let settings: TriviaSettings = serde_json::from_str(r#"{"channel_id": 42}"#).unwrap();
        assert_eq!(settings.channel_id, 42);
        assert_eq!(settings.round_interval(), Duration::from_secs(600));
    }

    #[test]
    fn test_question_record_uses_question_key() {
        let record: QuestionRecord =
            serde_json::from_str(r#"{"question": "2+2?", "answer": "4"}"#).unwrap();
        assert_eq!(record.prompt, "2+2?");
        assert!(record.hint.is_none());
        assert!(record.image.is_none());
    }

    #[test]
    fn test_sweep_interval_clamps_to_one_second() {
        let global = GlobalConfig {
            sweep_interval_secs: 0,
            ..GlobalConfig::default()
        };
        assert_eq!(global.sweep_interval(), Duration::from_secs(1));
    }
}
