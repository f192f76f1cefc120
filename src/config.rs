use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 程序配置
///
/// 在 `main` 中构造一次，之后只以只读引用传给各个组件
#[derive(Clone, Debug)]
pub struct Config {
    /// 鱼类数据集（JSON）
    pub data_file: PathBuf,
    /// 图片缓存目录
    pub images_dir: PathBuf,
    /// 输出目录
    pub output_dir: PathBuf,
    /// 质量控制清单（每行一个鱼名）
    pub poor_quality_file: PathBuf,
    // --- 图片搜索配置 ---
    /// 附加在搜索词后面的固定后缀
    pub search_suffix: String,
    pub max_results: usize,
    pub max_attempts: usize,
    /// 线性退避的基础等待时间（秒）
    pub retry_base_delay_secs: u64,
    pub min_width: u32,
    pub min_height: u32,
    /// 低于该 MSE 的候选图片视为近似重复
    pub similarity_threshold: f64,
    /// 是否打乱候选顺序
    pub shuffle_candidates: bool,
    pub http_timeout_secs: u64,
    // --- PDF 配置 ---
    /// TTF 字体路径；为空时使用内置 Helvetica 并转写特殊字符
    pub font_path: Option<PathBuf>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/fish_data.json"),
            images_dir: PathBuf::from("images/fish_images"),
            output_dir: PathBuf::from("output"),
            poor_quality_file: PathBuf::from("config/poor_quality_images.txt"),
            search_suffix: "Fisch".to_string(),
            max_results: 10,
            max_attempts: 3,
            retry_base_delay_secs: 10,
            min_width: 500,
            min_height: 300,
            similarity_threshold: 10.0,
            shuffle_candidates: true,
            http_timeout_secs: 10,
            font_path: None,
            verbose_logging: false,
        }
    }
}

/// TOML 配置文件的内容，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    data_file: Option<PathBuf>,
    images_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    poor_quality_file: Option<PathBuf>,
    search_suffix: Option<String>,
    max_results: Option<usize>,
    max_attempts: Option<usize>,
    retry_base_delay_secs: Option<u64>,
    min_width: Option<u32>,
    min_height: Option<u32>,
    similarity_threshold: Option<f64>,
    shuffle_candidates: Option<bool>,
    http_timeout_secs: Option<u64>,
    font_path: Option<PathBuf>,
    verbose_logging: Option<bool>,
}

impl Config {
    /// 默认值 → 可选的 TOML 文件 → 环境变量
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match config_file {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let file: FileConfig = toml::from_str(content)?;
        let default = Self::default();
        Ok(Self {
            data_file: file.data_file.unwrap_or(default.data_file),
            images_dir: file.images_dir.unwrap_or(default.images_dir),
            output_dir: file.output_dir.unwrap_or(default.output_dir),
            poor_quality_file: file.poor_quality_file.unwrap_or(default.poor_quality_file),
            search_suffix: file.search_suffix.unwrap_or(default.search_suffix),
            max_results: file.max_results.unwrap_or(default.max_results),
            max_attempts: file.max_attempts.unwrap_or(default.max_attempts),
            retry_base_delay_secs: file.retry_base_delay_secs.unwrap_or(default.retry_base_delay_secs),
            min_width: file.min_width.unwrap_or(default.min_width),
            min_height: file.min_height.unwrap_or(default.min_height),
            similarity_threshold: file.similarity_threshold.unwrap_or(default.similarity_threshold),
            shuffle_candidates: file.shuffle_candidates.unwrap_or(default.shuffle_candidates),
            http_timeout_secs: file.http_timeout_secs.unwrap_or(default.http_timeout_secs),
            font_path: file.font_path.or(default.font_path),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
        })
    }

    fn with_env_overrides(self) -> Self {
        Self {
            data_file: env_path("FISH_DATA_FILE").unwrap_or(self.data_file),
            images_dir: env_path("FISH_IMAGES_DIR").unwrap_or(self.images_dir),
            output_dir: env_path("FISH_OUTPUT_DIR").unwrap_or(self.output_dir),
            poor_quality_file: env_path("FISH_POOR_QUALITY_FILE").unwrap_or(self.poor_quality_file),
            search_suffix: std::env::var("FISH_SEARCH_SUFFIX").unwrap_or(self.search_suffix),
            max_results: env_parse("FISH_MAX_RESULTS").unwrap_or(self.max_results),
            max_attempts: env_parse("FISH_MAX_ATTEMPTS").unwrap_or(self.max_attempts),
            retry_base_delay_secs: env_parse("FISH_RETRY_BASE_DELAY_SECS").unwrap_or(self.retry_base_delay_secs),
            min_width: env_parse("FISH_MIN_WIDTH").unwrap_or(self.min_width),
            min_height: env_parse("FISH_MIN_HEIGHT").unwrap_or(self.min_height),
            similarity_threshold: env_parse("FISH_SIMILARITY_THRESHOLD").unwrap_or(self.similarity_threshold),
            shuffle_candidates: env_parse("FISH_SHUFFLE_CANDIDATES").unwrap_or(self.shuffle_candidates),
            http_timeout_secs: env_parse("FISH_HTTP_TIMEOUT_SECS").unwrap_or(self.http_timeout_secs),
            font_path: env_path("FISH_FONT_PATH").or(self.font_path),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    /// 图片获取引擎使用的策略
    pub fn acquisition_policy(&self) -> AcquisitionPolicy {
        AcquisitionPolicy {
            search_suffix: self.search_suffix.clone(),
            max_results: self.max_results,
            max_attempts: self.max_attempts,
            base_delay: Duration::from_secs(self.retry_base_delay_secs),
            min_width: self.min_width,
            min_height: self.min_height,
            similarity_threshold: self.similarity_threshold,
            shuffle_candidates: self.shuffle_candidates,
        }
    }
}

/// 图片获取策略
#[derive(Clone, Debug)]
pub struct AcquisitionPolicy {
    pub search_suffix: String,
    pub max_results: usize,
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub min_width: u32,
    pub min_height: u32,
    pub similarity_threshold: f64,
    pub shuffle_candidates: bool,
}

impl Default for AcquisitionPolicy {
    fn default() -> Self {
        Config::default().acquisition_policy()
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_acquisition_policy() {
        let policy = Config::default().acquisition_policy();
        assert_eq!(policy.max_results, 10);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(10));
        assert_eq!((policy.min_width, policy.min_height), (500, 300));
        assert_eq!(policy.search_suffix, "Fisch");
    }

    #[test]
    fn test_toml_overrides_only_given_keys() {
        let config = Config::from_toml_str(
            r#"
            images_dir = "cache/bilder"
            retry_base_delay_secs = 0
            shuffle_candidates = false
            "#,
        )
        .unwrap();

        assert_eq!(config.images_dir, PathBuf::from("cache/bilder"));
        assert_eq!(config.retry_base_delay_secs, 0);
        assert!(!config.shuffle_candidates);
        assert_eq!(config.data_file, PathBuf::from("data/fish_data.json"));
        assert_eq!(config.max_results, 10);
    }

    #[test]
    fn test_unknown_toml_key_is_rejected() {
        assert!(Config::from_toml_str("font_size = 12").is_err());
    }

    #[test]
    fn test_env_overrides_toml_in_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashcards.toml");
        std::fs::write(&path, "search_suffix = \"Fisch\"\nmin_height = 200\n").unwrap();

        // 只有这个测试调用 load 并设置这个变量
        std::env::set_var("FISH_SEARCH_SUFFIX", "Süßwasserfisch");
        let config = Config::load(Some(&path));
        std::env::remove_var("FISH_SEARCH_SUFFIX");

        let config = config.unwrap();
        assert_eq!(config.search_suffix, "Süßwasserfisch");
        assert_eq!(config.min_height, 200);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = Config::from_toml_file(Path::new("/nonexistent/flashcards.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }
}
