//! 应用主流程 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：加载数据集（失败即终止，不产生任何输出），创建目录
//! 2. **执行命令**：生成卡片或只处理图片
//! 3. **资源管理**：创建搜索和下载客户端，交给图片处理流程
//! 4. **全局统计**：汇总生成的文件和图片处理结果
//!
//! 单条记录的图片问题只记日志，不会中断整个运行；
//! 数据集错误和清单写回失败会终止运行。

use crate::cli::{Command, DownloadMode, OutputFormat};
use crate::config::Config;
use crate::error::AppResult;
use crate::exporters::{self, PdfCanvas, PdfSummary};
use crate::models::{load_dataset, Entry, Selection};
use crate::services::{
    DuckDuckGoSearch, HttpImageFetcher, ImageAcquisition, ImageFetcher, ImageSearch,
    PoorQualityRegistry,
};
use crate::utils::logging;
use crate::workflow::{EntryCtx, FlowSummary, ImageFlow};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// 一次运行的结果
#[derive(Debug, Default)]
pub struct RunReport {
    /// 生成的文件，按生成顺序
    pub written: Vec<PathBuf>,
    pub pdf: Option<PdfSummary>,
    pub images: Option<FlowSummary>,
}

/// 应用主结构
pub struct App {
    config: Config,
    entries: Vec<Entry>,
}

impl App {
    /// 初始化应用
    ///
    /// 数据集在创建任何目录或文件之前加载
    pub async fn initialize(config: Config) -> Result<Self> {
        let entries = load_dataset(&config.data_file)
            .await
            .context("无法加载数据集，运行终止")?;

        for dir in [&config.output_dir, &config.images_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("无法创建目录: {}", dir.display()))?;
        }

        Ok(Self { config, entries })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 使用 DuckDuckGo 搜索和 HTTP 下载运行命令
    pub async fn run(&self, command: &Command) -> Result<RunReport> {
        let timeout = Duration::from_secs(self.config.http_timeout_secs);
        let search = DuckDuckGoSearch::new(timeout).context("无法创建搜索客户端")?;
        let fetcher = HttpImageFetcher::new(timeout).context("无法创建下载客户端")?;
        self.run_with(command, search, fetcher).await
    }

    /// 使用给定的搜索和下载能力运行命令
    pub async fn run_with<S, F>(&self, command: &Command, search: S, fetcher: F) -> Result<RunReport>
    where
        S: ImageSearch,
        F: ImageFetcher,
    {
        let report = match *command {
            Command::Generate { selection, format } => {
                logging::log_startup("生成学习卡片", selection.description());
                self.generate(selection, format, search, fetcher).await?
            }
            Command::Images { selection, mode } => {
                logging::log_startup("下载图片", selection.description());
                self.download_images(selection, mode, search, fetcher).await?
            }
        };

        logging::print_final_stats(&report.written, report.images.as_ref());
        Ok(report)
    }

    /// 输出文件路径
    pub fn output_path(&self, selection: Selection, format: OutputFormat) -> PathBuf {
        let stem = selection.file_stem();
        let name = match format {
            OutputFormat::Pdf => format!("{stem}_karteikarten.pdf"),
            OutputFormat::Csv => format!("{stem}_repetico.csv"),
            OutputFormat::Json => format!("{stem}_repetico.json"),
            OutputFormat::All => stem.to_string(),
        };
        self.config.output_dir.join(name)
    }

    async fn generate<S, F>(
        &self,
        selection: Selection,
        format: OutputFormat,
        search: S,
        fetcher: F,
    ) -> AppResult<RunReport>
    where
        S: ImageSearch,
        F: ImageFetcher,
    {
        let entries = selection.apply(&self.entries);
        let mut report = RunReport::default();
        if entries.is_empty() {
            warn!("⚠️ {} 中没有记录，不生成任何文件", selection.description());
            return Ok(report);
        }
        info!("✓ 选中 {} / {} 条记录", entries.len(), self.entries.len());

        let targets: Vec<OutputFormat> = [OutputFormat::Pdf, OutputFormat::Csv, OutputFormat::Json]
            .into_iter()
            .filter(|f| format.includes(*f))
            .collect();

        // 顺序固定：PDF → CSV → JSON
        let mut search_and_fetcher = Some((search, fetcher));
        for (step, target) in targets.iter().enumerate() {
            let path = self.output_path(selection, *target);
            logging::log_export_start(step + 1, targets.len(), &path);

            match target {
                OutputFormat::Pdf => {
                    if let Some((search, fetcher)) = search_and_fetcher.take() {
                        let (pdf, images) = self.write_pdf(&entries, &path, search, fetcher).await?;
                        logging::log_pdf_summary(&pdf);
                        report.pdf = Some(pdf);
                        report.images = Some(images);
                    }
                }
                OutputFormat::Csv => exporters::csv::write_csv(&entries, &path).await?,
                OutputFormat::Json => exporters::repetico::write_json(&entries, &path).await?,
                OutputFormat::All => continue,
            }

            logging::log_export_complete(&path, entries.len());
            report.written.push(path);
        }

        Ok(report)
    }

    async fn write_pdf<S, F>(
        &self,
        entries: &[Entry],
        path: &Path,
        search: S,
        fetcher: F,
    ) -> AppResult<(PdfSummary, FlowSummary)>
    where
        S: ImageSearch,
        F: ImageFetcher,
    {
        let mut flow = self.image_flow(search, fetcher)?;
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut canvas = PdfCanvas::new(&title, self.config.font_path.as_deref())?;

        let pdf = exporters::render_cards(entries, &mut canvas, &mut flow).await?;

        // 图片已经替换，即使 PDF 写入失败也要更新清单
        let saved = canvas.save(path);
        if let Err(e) = &saved {
            error!("❌ PDF 写入失败: {}", e);
        }
        let images = flow.finish()?;
        saved?;
        Ok((pdf, images))
    }

    async fn download_images<S, F>(
        &self,
        selection: Selection,
        mode: DownloadMode,
        search: S,
        fetcher: F,
    ) -> AppResult<RunReport>
    where
        S: ImageSearch,
        F: ImageFetcher,
    {
        let entries = selection.apply(&self.entries);
        let mut flow = self
            .image_flow(search, fetcher)?
            .force_all(mode == DownloadMode::All);

        let targets: Vec<&Entry> = match mode {
            DownloadMode::Missing | DownloadMode::All => entries.iter().collect(),
            DownloadMode::PoorQuality => {
                let registry = flow.poor_quality();
                if registry.is_empty() {
                    info!("📋 质量控制清单为空，没有需要替换的图片");
                    return Ok(RunReport::default());
                }
                for name in registry.iter() {
                    if !self.entries.iter().any(|e| e.identifier == name) {
                        warn!("⚠️ 清单中的 {} 不在数据集中", name);
                    }
                }
                entries
                    .iter()
                    .filter(|e| registry.contains(&e.identifier))
                    .collect()
            }
        };

        let total = targets.len();
        info!("✓ 共 {} 条记录需要处理图片", total);
        for (index, entry) in targets.into_iter().enumerate() {
            let ctx = EntryCtx::in_sequence(&entry.identifier, index + 1, total);
            flow.run(entry, &ctx).await;
        }

        let summary = flow.finish()?;
        Ok(RunReport {
            written: Vec::new(),
            pdf: None,
            images: Some(summary),
        })
    }

    fn image_flow<S, F>(&self, search: S, fetcher: F) -> AppResult<ImageFlow<S, F>>
    where
        S: ImageSearch,
        F: ImageFetcher,
    {
        let acquisition = ImageAcquisition::new(search, fetcher, self.config.acquisition_policy());
        let registry = PoorQualityRegistry::new(&self.config.poor_quality_file);
        Ok(ImageFlow::new(
            acquisition,
            &self.config.images_dir,
            registry,
        )?)
    }
}
