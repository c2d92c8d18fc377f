use crate::models::types::QuestionRecord;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuestionBankError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("題庫陣列為空")]
    Empty,
    #[error("第 {0} 題缺少題目或答案")]
    InvalidRecord(usize),
}

/// 啟動時載入一次的唯讀題庫
#[derive(Debug, Default)]
pub struct QuestionBank {
    questions: Vec<QuestionRecord>,
}

impl QuestionBank {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuestionBankError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, QuestionBankError> {
        let questions: Vec<QuestionRecord> = serde_json::from_str(content)?;
        if questions.is_empty() {
            return Err(QuestionBankError::Empty);
        }
        if let Some(index) = questions
            .iter()
            .position(|q| q.prompt.trim().is_empty() || q.answer.trim().is_empty())
        {
            return Err(QuestionBankError::InvalidRecord(index));
        }
        Ok(Self { questions })
    }

    pub fn from_records(questions: Vec<QuestionRecord>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuestionRecord> {
        self.questions.get(index)
    }
}
