//! 图片获取服务 - 业务能力层
//!
//! 保证缓存路径上有一张满足质量要求的图片：
//!
//! 1. 文件已存在且不强制替换 → 直接返回，不访问网络
//! 2. 已有文件解码失败 → 视为没有现有图片
//! 3. 最多尝试 `max_attempts` 次，每次搜索一批候选并随机打乱顺序，
//!    依次检查 解码 → 分辨率 → 完全重复 → 近似重复，第一张合格的写入缓存
//! 4. 一次尝试没有合格图片 → 等待 `base_delay * 尝试次数` 后重试
//! 5. 全部失败 → 缓存保持原样，返回 `Exhausted`，调用方继续处理下一条

use crate::config::AcquisitionPolicy;
use crate::error::{CandidateRejection, ImageError};
use crate::services::image_codec::{self, DecodedImage};
use crate::services::image_fetch::ImageFetcher;
use crate::services::image_search::ImageSearch;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// 写入缓存的图片
#[derive(Debug, Clone, PartialEq)]
pub struct CachedImage {
    pub entry_identifier: String,
    pub file_path: PathBuf,
    pub content_hash: String,
    pub width: u32,
    pub height: u32,
}

/// 被拒绝的候选图片
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedCandidate {
    /// 第几次尝试（从 1 开始）
    pub attempt: usize,
    pub url: String,
    pub reason: CandidateRejection,
}

/// 一次 `ensure_image` 的结果
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionOutcome {
    /// 缓存已存在，没有访问网络
    AlreadyCached,
    /// 新图片已写入缓存
    Stored(CachedImage),
    /// 所有尝试都没有合格的候选，缓存保持原样
    Exhausted {
        attempts: usize,
        rejections: Vec<RejectedCandidate>,
    },
}

impl AcquisitionOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, AcquisitionOutcome::Stored(_))
    }
}

/// 已有图片及其哈希
struct ExistingImage {
    image: DecodedImage,
    hash: String,
}

/// 图片获取引擎
pub struct ImageAcquisition<S, F> {
    search: S,
    fetcher: F,
    policy: AcquisitionPolicy,
    rng: StdRng,
}

impl<S: ImageSearch, F: ImageFetcher> ImageAcquisition<S, F> {
    pub fn new(search: S, fetcher: F, policy: AcquisitionPolicy) -> Self {
        Self {
            search,
            fetcher,
            policy,
            rng: StdRng::seed_from_u64(rand::random()),
        }
    }

    /// 固定随机种子，打乱顺序可复现
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// 保证 `cache_path` 上有可用图片
    ///
    /// 只有写缓存文件失败才返回错误；搜索和候选图片的问题都体现在结果里
    pub async fn ensure_image(
        &mut self,
        query: &str,
        cache_path: &Path,
        force_replace: bool,
    ) -> Result<AcquisitionOutcome, ImageError> {
        let exists = cache_path.is_file();
        if exists && !force_replace {
            return Ok(AcquisitionOutcome::AlreadyCached);
        }

        let existing = if exists {
            load_existing(query, cache_path)
        } else {
            None
        };

        let search_query = if self.policy.search_suffix.is_empty() {
            query.to_string()
        } else {
            format!("{} {}", query, self.policy.search_suffix)
        };

        let mut rejections = Vec::new();
        for attempt in 1..=self.policy.max_attempts {
            if let Some(image) = self
                .run_attempt(&search_query, existing.as_ref(), attempt, &mut rejections)
                .await
            {
                image_codec::save_jpeg(&image, cache_path)?;
                let cached = CachedImage {
                    entry_identifier: query.to_string(),
                    file_path: cache_path.to_path_buf(),
                    content_hash: image_codec::content_hash(&image),
                    width: image.width(),
                    height: image.height(),
                };
                info!(
                    "✅ {}: 新图片已保存 ({}x{}, 第 {} 次尝试)",
                    query, cached.width, cached.height, attempt
                );
                return Ok(AcquisitionOutcome::Stored(cached));
            }

            if attempt < self.policy.max_attempts {
                let delay = self.policy.base_delay * attempt as u32;
                warn!(
                    "{}: 第 {}/{} 次尝试没有合格图片，等待 {:?} 后重试",
                    query, attempt, self.policy.max_attempts, delay
                );
                sleep(delay).await;
            }
        }

        warn!(
            "⚠️ {}: {} 次尝试后仍未找到新图片，跳过",
            query, self.policy.max_attempts
        );
        Ok(AcquisitionOutcome::Exhausted {
            attempts: self.policy.max_attempts,
            rejections,
        })
    }

    /// 一次尝试：搜索、打乱、逐个检查，返回第一张合格的图片
    async fn run_attempt(
        &mut self,
        search_query: &str,
        existing: Option<&ExistingImage>,
        attempt: usize,
        rejections: &mut Vec<RejectedCandidate>,
    ) -> Option<DecodedImage> {
        let mut urls = match self
            .search
            .search_images(search_query, self.policy.max_results)
            .await
        {
            Ok(urls) => urls,
            Err(e) => {
                warn!(
                    "{}: 搜索失败 (尝试 {}/{}): {}",
                    search_query, attempt, self.policy.max_attempts, e
                );
                return None;
            }
        };

        if self.policy.shuffle_candidates {
            urls.shuffle(&mut self.rng);
        }

        for url in urls {
            let verdict = match self.fetcher.fetch_and_decode(&url).await {
                Ok(candidate) => judge_candidate(&candidate, existing, &self.policy).map(|_| candidate),
                Err(reason) => Err(reason),
            };

            match verdict {
                Ok(candidate) => return Some(candidate),
                Err(reason) => {
                    debug!("{}: 候选被拒绝 [{}]: {}", search_query, url, reason);
                    rejections.push(RejectedCandidate {
                        attempt,
                        url,
                        reason,
                    });
                }
            }
        }

        None
    }
}

/// 读取现有图片；损坏的文件按不存在处理
fn load_existing(query: &str, cache_path: &Path) -> Option<ExistingImage> {
    match image_codec::load(cache_path) {
        Some(image) => {
            let hash = image_codec::content_hash(&image);
            Some(ExistingImage { image, hash })
        }
        None => {
            warn!("{}: 现有图片无法解码，视为不存在: {}", query, cache_path.display());
            None
        }
    }
}

/// 质量门槛：分辨率 → 完全重复 → 近似重复
fn judge_candidate(
    candidate: &DecodedImage,
    existing: Option<&ExistingImage>,
    policy: &AcquisitionPolicy,
) -> Result<(), CandidateRejection> {
    if candidate.width() < policy.min_width || candidate.height() < policy.min_height {
        return Err(CandidateRejection::BelowMinimumResolution {
            width: candidate.width(),
            height: candidate.height(),
        });
    }

    let Some(existing) = existing else {
        return Ok(());
    };

    if image_codec::content_hash(candidate) == existing.hash {
        return Err(CandidateRejection::DuplicateContent);
    }

    let difference = image_codec::perceptual_difference(candidate, &existing.image);
    if difference < policy.similarity_threshold {
        return Err(CandidateRejection::NearDuplicateContent { difference });
    }

    Ok(())
}
