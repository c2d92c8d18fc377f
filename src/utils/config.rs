use crate::models::types::{GlobalConfig, GuildConfig, TriviaSettings};
use crate::trivia::GuildConfigStore;
use serde::{Deserialize, Serialize};
use serenity::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct ConfigManager {
    pub global: GlobalConfig,
    pub guilds: HashMap<u64, GuildConfig>,
    config_path: String,
}

impl ConfigManager {
    pub fn new(config_path: &str) -> Result<Self, ConfigError> {
        let mut manager = Self {
            global: GlobalConfig::default(),
            guilds: HashMap::new(),
            config_path: config_path.to_string(),
        };

        manager.load_config()?;
        Ok(manager)
    }

    pub fn load_config(&mut self) -> Result<(), ConfigError> {
        if Path::new(&self.config_path).exists() {
            let content = fs::read_to_string(&self.config_path)?;
            let config_data: ConfigData = serde_json::from_str(&content)?;

            self.global = config_data.global.unwrap_or_default();
            self.guilds = config_data.guilds.unwrap_or_default();
        } else {
            self.save_config()?;
        }

        Ok(())
    }

    pub fn save_config(&self) -> Result<(), ConfigError> {
        let config_data = ConfigData {
            global: Some(self.global.clone()),
            guilds: Some(self.guilds.clone()),
        };

        let content = serde_json::to_string_pretty(&config_data)?;
        fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// 可使用 /maintenance、/update 的開發者
    pub fn is_developer(&self, user_id: u64) -> bool {
        self.global.developers.contains(&user_id)
    }

    pub fn get_guild_config(&self, guild_id: u64) -> GuildConfig {
        self.guilds.get(&guild_id).cloned().unwrap_or_default()
    }

    pub fn set_trivia_settings(
        &mut self,
        guild_id: u64,
        settings: TriviaSettings,
    ) -> Result<(), ConfigError> {
        self.guilds.entry(guild_id).or_default().trivia = Some(settings);
        self.save_config()
    }

    /// 移除伺服器的問答設定，回傳原本是否有設定
    pub fn clear_trivia_settings(&mut self, guild_id: u64) -> Result<bool, ConfigError> {
        let removed = self
            .guilds
            .get_mut(&guild_id)
            .and_then(|config| config.trivia.take())
            .is_some();
        if removed {
            self.save_config()?;
        }
        Ok(removed)
    }

    pub fn trivia_guilds(&self) -> Vec<(u64, TriviaSettings)> {
        let mut guilds: Vec<_> = self
            .guilds
            .iter()
            .filter_map(|(id, config)| config.trivia.map(|settings| (*id, settings)))
            .collect();
        guilds.sort_by_key(|(id, _)| *id);
        guilds
    }
}

#[async_trait]
impl GuildConfigStore for Mutex<ConfigManager> {
    async fn trivia_settings(&self, guild_id: u64) -> Option<TriviaSettings> {
        self.lock().await.get_guild_config(guild_id).trivia
    }

    async fn configured_guilds(&self) -> Vec<(u64, TriviaSettings)> {
        self.lock().await.trivia_guilds()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ConfigData {
    global: Option<GlobalConfig>,
    guilds: Option<HashMap<u64, GuildConfig>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        let path = std::env::temp_dir().join(format!("trivia-bot-{}-{}.json", name, std::process::id()));
        let _ = fs::remove_file(&path);
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_config_manager_creation_writes_defaults() {
        let path = temp_path("create");
        let config = ConfigManager::new(&path).expect("Failed to create ConfigManager in test");
        assert_eq!(config.global.sweep_interval_secs, 60);
        assert!(Path::new(&path).exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_trivia_settings_persist() {
        let path = temp_path("persist");
        let mut config = ConfigManager::new(&path).unwrap();
        config
            .set_trivia_settings(42, TriviaSettings::new(7, 15, 3))
            .unwrap();

        let reloaded = ConfigManager::new(&path).unwrap();
        assert_eq!(
            reloaded.get_guild_config(42).trivia,
            Some(TriviaSettings::new(7, 15, 3))
        );
        assert_eq!(reloaded.trivia_guilds().len(), 1);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_clear_trivia_settings() {
        let path = temp_path("clear");
        let mut config = ConfigManager::new(&path).unwrap();
        assert!(!config.clear_trivia_settings(1).unwrap());

        config
            .set_trivia_settings(1, TriviaSettings::new(2, 10, 5))
            .unwrap();
        assert!(config.clear_trivia_settings(1).unwrap());
        assert!(config.trivia_guilds().is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let path = temp_path("partial");
        fs::write(
            &path,
            r#"{"guilds": {"5": {"trivia": {"channel_id": 9}}}}"#,
        )
        .unwrap();

        let config = ConfigManager::new(&path).unwrap();
        assert_eq!(config.global.question_bank_path, "trivia-questions.json");
        let settings = config.get_guild_config(5).trivia.unwrap();
        assert_eq!(settings.channel_id, 9);
        assert_eq!(settings.duration, 0);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_developers_from_file() {
        let path = temp_path("developers");
        fs::write(&path, r#"{"global": {"developers": [11, 12]}}"#).unwrap();

        let config = ConfigManager::new(&path).unwrap();
        assert!(config.is_developer(11));
        assert!(!config.is_developer(13));
        assert!(config.global.support_url.is_none());
        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_store_reads_snapshot() {
        let path = temp_path("store");
        let mut config = ConfigManager::new(&path).unwrap();
        config
            .set_trivia_settings(3, TriviaSettings::new(4, 1, 1))
            .unwrap();

        let store = Mutex::new(config);
        assert_eq!(store.trivia_settings(3).await.unwrap().channel_id, 4);
        assert!(store.trivia_settings(4).await.is_none());
        assert_eq!(store.configured_guilds().await.len(), 1);
        let _ = fs::remove_file(&path);
    }
}
