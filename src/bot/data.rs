use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::trivia::TriviaScheduler;
use crate::utils::config::ConfigManager;

#[derive(Clone)]
pub struct BotData {
    pub config: Arc<Mutex<ConfigManager>>,
    pub trivia: Arc<TriviaScheduler>,
    pub maintenance: Arc<AtomicBool>,
}

impl BotData {
    pub fn is_maintenance(&self) -> bool {
        self.maintenance.load(Ordering::SeqCst)
    }
}
