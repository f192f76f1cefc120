use crate::error::DatasetError;
use crate::models::entry::Entry;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// 从 JSON 文件加载数据集
///
/// 任何失败都是致命的：调用方必须在生成任何输出之前终止运行
pub async fn load_dataset(path: &Path) -> Result<Vec<Entry>, DatasetError> {
    let content = fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            DatasetError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            DatasetError::ReadFailed {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let entries: Vec<Entry> =
        serde_json::from_str(&content).map_err(|source| DatasetError::JsonParseFailed {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(
        "成功加载 {} 条记录: {}",
        entries.len(),
        path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(entries)
}
