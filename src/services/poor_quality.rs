//! 质量控制清单服务 - 业务能力层
//!
//! 只负责读写 `poor_quality_images.txt`，不关心哪一次运行替换了哪张图片

use crate::error::RegistryError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 待替换图片的鱼名集合，保持维护者写入的顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoorQualitySet {
    names: Vec<String>,
}

impl PoorQualitySet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for name in names {
            set.insert(name.into());
        }
        set
    }

    /// 重复的名字只保留第一次出现
    pub fn insert(&mut self, name: String) -> bool {
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// 移除给定的名字，返回实际移除的数量
    pub fn remove_all<S: AsRef<str>>(&mut self, replaced: &[S]) -> usize {
        let before = self.names.len();
        self.names
            .retain(|name| !replaced.iter().any(|r| r.as_ref() == name));
        before - self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// 质量控制清单的文件存储
pub struct PoorQualityRegistry {
    path: PathBuf,
}

impl PoorQualityRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取清单；文件不存在等同于空清单
    pub fn load(&self) -> Result<PoorQualitySet, RegistryError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("清单不存在，视为空: {}", self.path.display());
                return Ok(PoorQualitySet::default());
            }
            Err(source) => {
                return Err(RegistryError::ReadFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let set = PoorQualitySet::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        );
        debug!("清单中有 {} 个待替换条目", set.len());
        Ok(set)
    }

    /// 整体重写清单
    ///
    /// 先写入同目录下的临时文件再重命名，中途崩溃不会留下截断的清单
    pub fn save(&self, set: &PoorQualitySet) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RegistryError::write_failed(parent, e))?;
        }

        let mut content = String::new();
        for name in set.iter() {
            content.push_str(name);
            content.push('\n');
        }

        let tmp_path = self.path.with_extension("txt.tmp");
        std::fs::write(&tmp_path, content)
            .map_err(|e| RegistryError::write_failed(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|e| RegistryError::write_failed(&self.path, e))?;

        debug!("清单已保存 ({} 个条目)", set.len());
        Ok(())
    }
}
