use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 数据集错误（致命）
    #[error("数据集错误: {0}")]
    Dataset(#[from] DatasetError),
    /// 质量控制清单错误
    #[error("质量控制清单错误: {0}")]
    Registry(#[from] RegistryError),
    /// 导出错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 图片缓存错误
    #[error("图片错误: {0}")]
    Image(#[from] ImageError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 数据集加载错误
#[derive(Debug, Error)]
pub enum DatasetError {
    /// 文件不存在
    #[error("文件不存在: {}", path.display())]
    NotFound { path: PathBuf },
    /// 读取文件失败
    #[error("读取文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({}): {source}", path.display())]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 质量控制清单读写错误
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("读取清单失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入失败是致命错误
    #[error("写入清单失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 输出文件错误
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("写入文件失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("PDF生成失败: {0}")]
    Pdf(String),
}

/// 图片缓存读写错误（单张候选图片的拒绝原因见 [`CandidateRejection`]）
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("保存图片失败 ({}): {source}", path.display())]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("替换缓存文件失败 ({}): {source}", path.display())]
    ReplaceFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML解析失败 ({}): {source}", path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 候选图片 / 搜索结果 ==========

/// 单张候选图片被拒绝的原因
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandidateRejection {
    #[error("图片解码失败")]
    DecodeFailed,
    #[error("图片太小 ({width}x{height})")]
    BelowMinimumResolution { width: u32, height: u32 },
    #[error("与现有图片完全相同")]
    DuplicateContent,
    #[error("与现有图片过于相似 (MSE={difference:.2})")]
    NearDuplicateContent { difference: f64 },
    #[error("网络错误: {0}")]
    NetworkError(String),
}

/// 整次搜索失败（计为一次失败的尝试，不向上传播）
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("搜索请求失败: {0}")]
    Request(#[from] reqwest::Error),
    #[error("搜索页面中找不到 vqd 令牌")]
    MissingToken,
    #[error("搜索结果格式异常: {0}")]
    UnexpectedPayload(String),
}

// ========== 便捷构造函数 ==========

impl ExportError {
    /// 创建文件写入错误
    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}

impl RegistryError {
    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RegistryError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
