use chrono::{SecondsFormat, Utc};
use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to set logger: {0}")]
    SetLogger(#[from] log::SetLoggerError),
}

/// 連續重複達此次數時輸出一次摘要
const SUPPRESS_THRESHOLD: u32 = 10;

static NOISY_PATTERNS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["do_heartbeat", "recv_event", "recv;"]));

#[derive(Debug)]
struct LoggerState {
    file: Option<File>,
    last_entry: Option<String>,
    repeat_count: u32,
}

pub struct BotLogger {
    level: LevelFilter,
    state: Mutex<LoggerState>,
}

impl BotLogger {
    pub fn new(log_file: Option<&str>, level: LevelFilter) -> Result<BotLogger, std::io::Error> {
        let file = match log_file {
            Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
            None => None,
        };

        Ok(BotLogger {
            level,
            state: Mutex::new(LoggerState {
                file,
                last_entry: None,
                repeat_count: 0,
            }),
        })
    }

    /// 安裝為全域 logger；等級讀自 `LOG_LEVEL`，預設 info
    pub fn init(log_file: Option<&str>) -> Result<(), LoggerError> {
        let level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|value| LevelFilter::from_str(value.trim()).ok())
            .unwrap_or(LevelFilter::Info);

        let logger = BotLogger::new(log_file, level)?;
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(level);
        Ok(())
    }

    fn write_line(state: &mut LoggerState, line: &str) {
        println!("{}", line);
        if let Some(file) = state.file.as_mut() {
            if let Err(e) = writeln!(file, "{}", line) {
                eprintln!("Failed to write log entry: {}", e);
            }
        }
    }

    fn emit_repeat_summary(state: &mut LoggerState) {
        if state.repeat_count > 0 {
            let summary = format!(
                "[{}] (previous message repeated {} times)",
                timestamp(),
                state.repeat_count
            );
            Self::write_line(state, &summary);
            state.repeat_count = 0;
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Log for BotLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = record.args().to_string();
        if NOISY_PATTERNS
            .iter()
            .any(|pattern| message.contains(pattern))
        {
            return;
        }

        // 比對重複時不含時間戳
        let entry = format!("[{}] {}", record.level(), message);
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        if state.last_entry.as_deref() == Some(entry.as_str()) {
            state.repeat_count = state.repeat_count.saturating_add(1);
            if state.repeat_count >= SUPPRESS_THRESHOLD {
                Self::emit_repeat_summary(&mut state);
            }
            return;
        }

        Self::emit_repeat_summary(&mut state);
        Self::write_line(&mut state, &format!("[{}] {}", timestamp(), entry));
        state.last_entry = Some(entry);
    }

    fn flush(&self) {
        if let Ok(mut state) = self.state.lock() {
            Self::emit_repeat_summary(&mut state);
            if let Some(file) = state.file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}
