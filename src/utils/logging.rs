/// 日志工具模块
///
/// 提供运行横幅和统计输出的辅助函数
use crate::exporters::PdfSummary;
use crate::workflow::FlowSummary;
use std::path::Path;
use tracing::info;

/// 记录程序启动信息
///
/// # 参数
/// - `task`: 本次运行的任务描述
/// - `selection`: 数据子集描述
pub fn log_startup(task: &str, selection: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", task);
    info!("🐟 数据范围: {}", selection);
    info!("{}", "=".repeat(60));
}

/// 记录导出开始
///
/// # 参数
/// - `step`: 第几个输出文件
/// - `total_steps`: 输出文件总数
/// - `path`: 输出路径
pub fn log_export_start(step: usize, total_steps: usize, path: &Path) {
    info!("\n{}", "─".repeat(60));
    info!("📦 开始生成第 {}/{} 个文件: {}", step, total_steps, path.display());
}

/// 记录导出完成
pub fn log_export_complete(path: &Path, cards: usize) {
    info!("✓ 已生成 {} ({} 张卡片)", path.display(), cards);
    info!("{}", "─".repeat(60));
}

/// 打印 PDF 的统计
pub fn log_pdf_summary(summary: &PdfSummary) {
    info!(
        "📄 PDF: {} 页, {} 张卡片, {} 张有图片, {} 张没有图片",
        summary.pages, summary.cards, summary.images_placed, summary.cards_without_image
    );
}

/// 打印最终统计信息
///
/// # 参数
/// - `written`: 生成的文件
/// - `images`: 图片处理的汇总（没有处理图片时为 `None`）
pub fn print_final_stats<P: AsRef<Path>>(written: &[P], images: Option<&FlowSummary>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    if let Some(summary) = images {
        info!("⬇️ 下载: {}", summary.stats.downloaded);
        info!("⏭️ 跳过: {}", summary.stats.skipped);
        info!("❌ 失败: {}", summary.stats.failed);
        info!(
            "🧹 清单: 移除 {} 个, 剩余 {} 个",
            summary.removed_from_registry.len(),
            summary.remaining_in_registry
        );
    }
    for path in written {
        info!("📁 {}", path.as_ref().display());
    }
    info!("{}", "=".repeat(60));
}
