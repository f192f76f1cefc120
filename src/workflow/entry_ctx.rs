//! 记录处理上下文
//!
//! 封装"我正在处理第几条记录"这一信息，只用于日志

use std::fmt::Display;

/// 一条记录在本次运行中的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// PDF 导出：第几批的第几个位置（都从 0 开始）
    Slot { batch_index: usize, slot_index: usize },
    /// 单独下载图片：第几条 / 共几条（从 1 开始）
    Sequence { index: usize, total: usize },
}

/// 记录处理上下文
#[derive(Debug, Clone)]
pub struct EntryCtx {
    pub identifier: String,
    pub position: Position,
}

impl EntryCtx {
    pub fn in_slot(identifier: impl Into<String>, batch_index: usize, slot_index: usize) -> Self {
        Self {
            identifier: identifier.into(),
            position: Position::Slot {
                batch_index,
                slot_index,
            },
        }
    }

    pub fn in_sequence(identifier: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            identifier: identifier.into(),
            position: Position::Sequence { index, total },
        }
    }
}

impl Display for EntryCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Position::Slot {
                batch_index,
                slot_index,
            } => write!(
                f,
                "[第 {} 页 卡片#{} {}]",
                batch_index * 2 + 1,
                slot_index + 1,
                self.identifier
            ),
            Position::Sequence { index, total } => {
                write!(f, "[{}/{} {}]", index, total, self.identifier)
            }
        }
    }
}
