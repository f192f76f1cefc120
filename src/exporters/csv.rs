//! CSV 导出（Repetico / Anki 导入用）
//!
//! 每条记录一行 `鱼名,摘要`，没有表头，也不做任何引号转义

use crate::error::ExportError;
use crate::models::Entry;
use crate::services::answer_parser;
use std::path::Path;

/// 生成整个 CSV 文本
pub fn render_csv(entries: &[Entry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&csv_line(entry));
        out.push('\n');
    }
    out
}

/// 单条记录对应的一行（不含换行符）
pub fn csv_line(entry: &Entry) -> String {
    format!(
        "{},{}",
        entry.identifier,
        answer_parser::summarize(&entry.raw_answer)
    )
}

pub async fn write_csv(entries: &[Entry], path: &Path) -> Result<(), ExportError> {
    tokio::fs::write(path, render_csv(entries))
        .await
        .map_err(|e| ExportError::write_failed(path, e))
}
