//! Repetico JSON 导出
//!
//! 直接使用原始答案文本，只把每个 `", "` 换成换行，不经过答案解析

use crate::error::ExportError;
use crate::models::Entry;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepeticoCard {
    pub question: String,
    pub answer: String,
}

impl From<&Entry> for RepeticoCard {
    fn from(entry: &Entry) -> Self {
        Self {
            question: entry.identifier.clone(),
            answer: entry.raw_answer.replace(", ", "\n"),
        }
    }
}

/// 两个空格缩进，非 ASCII 字符保持原样
pub fn render_json(entries: &[Entry]) -> Result<String, ExportError> {
    let cards: Vec<RepeticoCard> = entries.iter().map(RepeticoCard::from).collect();
    Ok(serde_json::to_string_pretty(&cards)?)
}

pub async fn write_json(entries: &[Entry], path: &Path) -> Result<(), ExportError> {
    let json = render_json(entries)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| ExportError::write_failed(path, e))
}
