//! # Fish Flashcards
//!
//! 为钓鱼执照考试生成鱼类学习卡片：带图片的双面打印 PDF，
//! 以及可以导入 Repetico 的 CSV 和 JSON
//!
//! ## 架构设计
//!
//! ### ① 数据层（Models）
//! - `models/` - 数据集记录 `Entry`、数据子集 `Selection`、JSON 加载
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单条记录
//! - `answer_parser` - 从答案文本中提取禁渔期和最小尺寸
//! - `ImageAcquisition` - 搜索、下载、质量检查、写入缓存
//! - `PoorQualityRegistry` - 读写质量控制清单
//!
//! ### ③ 排版与导出（Layout / Exporters）
//! - `layout/` - 卡片位置计算，背面列镜像
//! - `exporters/` - PDF、CSV、JSON
//!
//! ### ④ 流程层（Workflow）
//! - `ImageFlow` - 一条记录的图片流程（清单 → 获取 → 记录替换结果）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/app` - 加载数据集，执行一个命令，汇总统计
//!
//! 整个程序顺序执行，没有并发

pub mod cli;
pub mod config;
pub mod error;
pub mod exporters;
pub mod layout;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use cli::{Cli, Command, DownloadMode, OutputFormat};
pub use config::{AcquisitionPolicy, Config};
pub use error::{AppError, AppResult, CandidateRejection};
pub use models::{Entry, Selection};
pub use orchestrator::{App, RunReport};
pub use workflow::{EntryCtx, ImageFlow};
