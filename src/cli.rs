//! 命令行参数

use crate::models::Selection;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 钓鱼执照考试的鱼类学习卡片生成器
#[derive(Debug, Parser)]
#[command(name = "fish-flashcards", version, about)]
pub struct Cli {
    /// TOML 配置文件
    #[arg(long, global = true, env = "FISH_CONFIG")]
    pub config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 生成学习卡片（PDF / Repetico CSV / Repetico JSON）
    Generate {
        #[arg(long, value_enum, default_value_t = Selection::All)]
        selection: Selection,
        #[arg(long, value_enum, default_value_t = OutputFormat::All)]
        format: OutputFormat,
    },
    /// 只下载或替换图片
    Images {
        #[arg(long, value_enum, default_value_t = Selection::All)]
        selection: Selection,
        #[arg(long, value_enum, default_value_t = DownloadMode::Missing)]
        mode: DownloadMode,
    },
}

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pdf,
    Csv,
    Json,
    /// 依次生成 PDF、CSV、JSON
    All,
}

impl OutputFormat {
    pub fn includes(self, format: OutputFormat) -> bool {
        self == OutputFormat::All || self == format
    }
}

/// 图片下载模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DownloadMode {
    /// 只下载缺失的图片（清单中的仍会被替换）
    Missing,
    /// 替换所有图片
    All,
    /// 只替换清单中的图片
    PoorQuality,
}
