//! 图片处理流程 - 流程层
//!
//! 核心职责：定义"一条记录的图片"的完整处理流程
//!
//! 1. 查质量控制清单，决定是否强制替换
//! 2. 调用图片获取服务
//! 3. 记录哪些清单中的图片被成功替换
//! 4. 运行结束时把这些名字从清单中移除并写回

use tracing::{error, info, warn};

use crate::error::RegistryError;
use crate::exporters::ImageProvider;
use crate::models::Entry;
use crate::services::cache_path;
use crate::services::{
    AcquisitionOutcome, ImageAcquisition, ImageFetcher, ImageSearch, PoorQualityRegistry,
    PoorQualitySet,
};
use crate::workflow::entry_ctx::EntryCtx;
use std::path::PathBuf;

/// 单条记录的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    /// 已有缓存，没有访问网络
    Cached,
    /// 下载了新图片
    Downloaded,
    /// 没有找到合格的图片，或者写入失败
    Failed,
}

/// 本次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImageStats {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ImageStats {
    fn record(&mut self, status: ImageStatus) {
        match status {
            ImageStatus::Cached => self.skipped += 1,
            ImageStatus::Downloaded => self.downloaded += 1,
            ImageStatus::Failed => self.failed += 1,
        }
    }
}

/// 运行结束时的汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSummary {
    pub stats: ImageStats,
    /// 从清单中移除的名字
    pub removed_from_registry: Vec<String>,
    /// 清单中剩余的数量
    pub remaining_in_registry: usize,
}

/// 图片处理流程
///
/// - 每次运行只读一次清单
/// - 清单中的记录总是强制替换
/// - 只持有清单快照，不直接碰网络
pub struct ImageFlow<S, F> {
    acquisition: ImageAcquisition<S, F>,
    images_dir: PathBuf,
    registry: PoorQualityRegistry,
    poor_quality: PoorQualitySet,
    force_all: bool,
    replaced: Vec<String>,
    stats: ImageStats,
}

impl<S: ImageSearch, F: ImageFetcher> ImageFlow<S, F> {
    /// 读取清单并创建流程
    pub fn new(
        acquisition: ImageAcquisition<S, F>,
        images_dir: impl Into<PathBuf>,
        registry: PoorQualityRegistry,
    ) -> Result<Self, RegistryError> {
        let poor_quality = registry.load()?;
        if !poor_quality.is_empty() {
            info!(
                "📋 质量控制清单中有 {} 张待替换的图片",
                poor_quality.len()
            );
        }

        Ok(Self {
            acquisition,
            images_dir: images_dir.into(),
            registry,
            poor_quality,
            force_all: false,
            replaced: Vec::new(),
            stats: ImageStats::default(),
        })
    }

    /// 对所有记录强制替换
    pub fn force_all(mut self, force: bool) -> Self {
        self.force_all = force;
        self
    }

    pub fn poor_quality(&self) -> &PoorQualitySet {
        &self.poor_quality
    }

    pub fn stats(&self) -> &ImageStats {
        &self.stats
    }

    /// 处理一条记录的图片
    pub async fn run(&mut self, entry: &Entry, ctx: &EntryCtx) -> ImageStatus {
        let path = cache_path::cache_path(&self.images_dir, &entry.identifier);
        let in_registry = self.poor_quality.contains(&entry.identifier);
        let force = in_registry || self.force_all;

        if in_registry {
            info!("{} 🔁 在质量控制清单中，尝试替换图片", ctx);
        }

        let status = match self
            .acquisition
            .ensure_image(&entry.identifier, &path, force)
            .await
        {
            Ok(AcquisitionOutcome::AlreadyCached) => ImageStatus::Cached,
            Ok(AcquisitionOutcome::Stored(_)) => {
                if force {
                    self.replaced.push(entry.identifier.clone());
                }
                ImageStatus::Downloaded
            }
            Ok(AcquisitionOutcome::Exhausted { attempts, rejections }) => {
                warn!(
                    "{} ⚠️ {} 次尝试均失败（{} 个候选被拒绝）",
                    ctx,
                    attempts,
                    rejections.len()
                );
                ImageStatus::Failed
            }
            Err(e) => {
                error!("{} ❌ 图片写入失败: {}", ctx, e);
                ImageStatus::Failed
            }
        };

        self.stats.record(status);
        status
    }

    /// 结束本次运行，把成功替换的名字从清单中移除
    ///
    /// 写回失败会返回错误，调用方应终止运行
    pub fn finish(self) -> Result<FlowSummary, RegistryError> {
        let mut remaining = self.poor_quality;
        let removed: Vec<String> = self
            .replaced
            .iter()
            .filter(|name| remaining.contains(name))
            .cloned()
            .collect();

        if !removed.is_empty() {
            remaining.remove_all(&removed);
            self.registry.save(&remaining)?;
            info!(
                "🧹 已从质量控制清单中移除 {} 个名字: {}",
                removed.len(),
                removed.join(", ")
            );
        }

        Ok(FlowSummary {
            stats: self.stats,
            removed_from_registry: removed,
            remaining_in_registry: remaining.len(),
        })
    }
}

impl<S: ImageSearch, F: ImageFetcher> ImageProvider for ImageFlow<S, F> {
    async fn image_for(
        &mut self,
        entry: &Entry,
        batch_index: usize,
        slot_index: usize,
    ) -> Option<PathBuf> {
        let ctx = EntryCtx::in_slot(&entry.identifier, batch_index, slot_index);
        self.run(entry, &ctx).await;

        // 替换失败时旧图片仍然可用
        let path = cache_path::cache_path(&self.images_dir, &entry.identifier);
        path.is_file().then_some(path)
    }
}
