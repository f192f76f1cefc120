use fish_flashcards::cli::{Command, DownloadMode, OutputFormat};
use fish_flashcards::config::{AcquisitionPolicy, Config};
use fish_flashcards::error::{CandidateRejection, SearchError};
use fish_flashcards::exporters::{render_cards, ImageProvider};
use fish_flashcards::layout::{Bounds, Canvas, Side};
use fish_flashcards::logger;
use fish_flashcards::models::{Entry, Selection};
use fish_flashcards::services::{
    cache_path, image_codec, DecodedImage, ImageAcquisition, ImageFetcher, ImageSearch,
    PoorQualityRegistry,
};
use fish_flashcards::workflow::ImageFlow;
use fish_flashcards::App;
use image::{Rgb, RgbImage};
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

// ========== 测试替身 ==========

/// 按鱼名返回预设 URL 的搜索，记录调用次数
#[derive(Default)]
struct ScriptedSearch {
    urls: HashMap<String, Vec<String>>,
    calls: Rc<Cell<usize>>,
}

impl ScriptedSearch {
    fn with(mut self, identifier: &str, urls: &[&str]) -> Self {
        self.urls.insert(
            identifier.to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        );
        self
    }
}

impl ImageSearch for ScriptedSearch {
    async fn search_images(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, SearchError> {
        self.calls.set(self.calls.get() + 1);
        // 搜索词是 "<鱼名> Fisch"
        let identifier = query.strip_suffix(" Fisch").unwrap_or(query);
        Ok(self
            .urls
            .get(identifier)
            .map(|urls| urls.iter().take(max_results).cloned().collect())
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct MapFetcher {
    images: HashMap<String, DecodedImage>,
}

impl MapFetcher {
    fn with(mut self, url: &str, image: DecodedImage) -> Self {
        self.images.insert(url.to_string(), image);
        self
    }
}

impl ImageFetcher for MapFetcher {
    async fn fetch_and_decode(&self, url: &str) -> Result<DecodedImage, CandidateRejection> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| CandidateRejection::NetworkError(format!("unknown url {url}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DrawOp {
    Page(Side),
    Border(Bounds),
    Image(PathBuf, Bounds),
    Text(String, Bounds),
}

/// 只记录绘制操作的画布
#[derive(Default)]
struct RecordingCanvas {
    ops: Vec<DrawOp>,
}

impl Canvas for RecordingCanvas {
    fn begin_page(&mut self, side: Side) {
        self.ops.push(DrawOp::Page(side));
    }

    fn draw_border(&mut self, bounds: Bounds) {
        self.ops.push(DrawOp::Border(bounds));
    }

    fn draw_image(
        &mut self,
        image_path: &Path,
        bounds: Bounds,
    ) -> Result<(), fish_flashcards::error::ExportError> {
        self.ops.push(DrawOp::Image(image_path.to_path_buf(), bounds));
        Ok(())
    }

    fn draw_text(&mut self, text: &str, bounds: Bounds) {
        self.ops.push(DrawOp::Text(text.to_string(), bounds));
    }
}

// ========== 辅助函数 ==========

fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DecodedImage {
    DecodedImage::new(RgbImage::from_pixel(width, height, Rgb(rgb)))
}

fn test_config(root: &Path) -> Config {
    Config {
        data_file: root.join("data/fish_data.json"),
        images_dir: root.join("images"),
        output_dir: root.join("output"),
        poor_quality_file: root.join("config/poor_quality_images.txt"),
        retry_base_delay_secs: 0,
        shuffle_candidates: false,
        ..Config::default()
    }
}

fn test_policy() -> AcquisitionPolicy {
    AcquisitionPolicy {
        base_delay: Duration::ZERO,
        shuffle_candidates: false,
        ..AcquisitionPolicy::default()
    }
}

fn write_dataset(config: &Config, json: &str) {
    std::fs::create_dir_all(config.data_file.parent().unwrap()).unwrap();
    std::fs::write(&config.data_file, json).unwrap();
}

fn write_registry(config: &Config, content: &str) {
    std::fs::create_dir_all(config.poor_quality_file.parent().unwrap()).unwrap();
    std::fs::write(&config.poor_quality_file, content).unwrap();
}

fn cache_image(images_dir: &Path, identifier: &str, rgb: [u8; 3]) -> PathBuf {
    std::fs::create_dir_all(images_dir).unwrap();
    let path = cache_path::cache_path(images_dir, identifier);
    image_codec::save_jpeg(&solid(600, 400, rgb), &path).unwrap();
    path
}

// ========== 端到端场景 ==========

#[tokio::test]
async fn test_hecht_generates_pdf_csv_and_json() {
    logger::init(false);

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_dataset(
        &config,
        r#"[{"question":"Hecht","answer":"Schonzeit: 01.03-31.05, Mindestmaß: 45 cm"}]"#,
    );

    let app = App::initialize(config.clone()).await.unwrap();
    let command = Command::Generate {
        selection: Selection::All,
        format: OutputFormat::All,
    };
    let report = app
        .run_with(&command, ScriptedSearch::default(), MapFetcher::default())
        .await
        .unwrap();

    let output = &config.output_dir;
    assert_eq!(
        report.written,
        vec![
            output.join("alle_fische_karteikarten.pdf"),
            output.join("alle_fische_repetico.csv"),
            output.join("alle_fische_repetico.json"),
        ]
    );

    let csv = std::fs::read_to_string(output.join("alle_fische_repetico.csv")).unwrap();
    assert_eq!(csv, "Hecht,Schonzeit: 01.03 bis 31.05<br/>Mindestmaß: 45 cm\n");

    let json = std::fs::read_to_string(output.join("alle_fische_repetico.json")).unwrap();
    assert!(json.contains("Mindestmaß"));
    let records: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        records,
        serde_json::json!([
            {"question": "Hecht", "answer": "Schonzeit: 01.03-31.05\nMindestmaß: 45 cm"}
        ])
    );

    let pdf = std::fs::read(output.join("alle_fische_karteikarten.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    let summary = report.pdf.unwrap();
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.cards_without_image, 1);
}

#[tokio::test]
async fn test_year_round_summary_in_csv() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_dataset(
        &config,
        r#"[
            {"question":"Huchen","answer":"Ganzjährig geschont."},
            {"question":"Zander","answer":"Schonzeit: 01.03-31.05"}
        ]"#,
    );

    let app = App::initialize(config.clone()).await.unwrap();
    let command = Command::Generate {
        selection: Selection::YearRound,
        format: OutputFormat::Csv,
    };
    let report = app
        .run_with(&command, ScriptedSearch::default(), MapFetcher::default())
        .await
        .unwrap();

    let path = config.output_dir.join("ganzjaehrig_geschont_repetico.csv");
    assert_eq!(report.written, vec![path.clone()]);
    assert_eq!(
        std::fs::read_to_string(path).unwrap(),
        "Huchen,Ganzjährig geschont\n"
    );
}

#[tokio::test]
async fn test_malformed_dataset_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_dataset(&config, r#"[{"question": "Hecht", "answer": "#);

    let result = App::initialize(config.clone()).await;

    assert!(result.is_err());
    assert!(!config.output_dir.exists());
    assert!(!config.images_dir.exists());
}

#[tokio::test]
async fn test_missing_dataset_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let err = App::initialize(config).await.err().unwrap();
    assert!(format!("{err:#}").contains("fish_data.json"));
}

// ========== 质量控制清单 ==========

#[tokio::test]
async fn test_registry_keeps_only_failed_replacements() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_dataset(
        &config,
        r#"[
            {"question":"Aal","answer":"Schonzeit: 01.10-28.02"},
            {"question":"Barsch","answer":"Keine"},
            {"question":"Wels","answer":"Mindestmaß: 70 cm"}
        ]"#,
    );
    for name in ["Aal", "Barsch", "Wels"] {
        cache_image(&config.images_dir, name, [20, 20, 20]);
    }
    write_registry(&config, "Aal\nStör\nBarsch\n");

    let search = ScriptedSearch::default()
        .with("Aal", &["aal-new"])
        .with("Barsch", &["thumbnail"]);
    let calls = search.calls.clone();
    let fetcher = MapFetcher::default()
        .with("aal-new", solid(900, 600, [180, 40, 40]))
        .with("thumbnail", solid(120, 90, [0, 200, 0]));

    let app = App::initialize(config.clone()).await.unwrap();
    let command = Command::Images {
        selection: Selection::All,
        mode: DownloadMode::PoorQuality,
    };
    let report = app.run_with(&command, search, fetcher).await.unwrap();

    let images = report.images.unwrap();
    assert_eq!(images.stats.downloaded, 1);
    assert_eq!(images.stats.failed, 1);
    assert_eq!(images.removed_from_registry, vec!["Aal".to_string()]);
    // Aal 一次成功，Barsch 三次都失败
    assert_eq!(calls.get(), 4);

    let registry = PoorQualityRegistry::new(&config.poor_quality_file)
        .load()
        .unwrap();
    assert_eq!(registry.iter().collect::<Vec<_>>(), vec!["Stör", "Barsch"]);
}

#[tokio::test]
async fn test_second_run_without_registry_makes_no_network_calls() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_dataset(
        &config,
        r#"[{"question":"Karpfen","answer":"Mindestmaß: 35 cm"}]"#,
    );

    let app = App::initialize(config.clone()).await.unwrap();
    let command = Command::Images {
        selection: Selection::All,
        mode: DownloadMode::Missing,
    };

    let first = ScriptedSearch::default().with("Karpfen", &["karpfen"]);
    let first_calls = first.calls.clone();
    let fetcher = MapFetcher::default().with("karpfen", solid(800, 600, [90, 90, 30]));
    let report = app.run_with(&command, first, fetcher).await.unwrap();
    assert_eq!(report.images.unwrap().stats.downloaded, 1);
    assert_eq!(first_calls.get(), 1);

    let path = cache_path::cache_path(&config.images_dir, "Karpfen");
    let before = std::fs::read(&path).unwrap();

    let second = ScriptedSearch::default().with("Karpfen", &["karpfen"]);
    let second_calls = second.calls.clone();
    let report = app
        .run_with(&command, second, MapFetcher::default())
        .await
        .unwrap();
    assert_eq!(report.images.unwrap().stats.skipped, 1);
    assert_eq!(second_calls.get(), 0);
    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert!(!config.poor_quality_file.exists());
}

#[tokio::test]
async fn test_empty_registry_in_poor_quality_mode_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_dataset(&config, r#"[{"question":"Aal","answer":"Keine"}]"#);

    let search = ScriptedSearch::default().with("Aal", &["aal"]);
    let calls = search.calls.clone();
    let app = App::initialize(config).await.unwrap();
    let command = Command::Images {
        selection: Selection::All,
        mode: DownloadMode::PoorQuality,
    };
    let report = app.run_with(&command, search, MapFetcher::default()).await.unwrap();

    assert!(report.images.is_none());
    assert_eq!(calls.get(), 0);
}

// ========== PDF 排版 ==========

#[tokio::test]
async fn test_pdf_run_draws_every_border_and_only_cached_images() {
    let dir = tempfile::tempdir().unwrap();
    let images_dir = dir.path().join("images");

    let entries: Vec<Entry> = (1..=10)
        .map(|i| Entry::new(format!("Fisch {i}"), "Mindestmaß: 30 cm"))
        .collect();
    let cached: Vec<PathBuf> = ["Fisch 1", "Fisch 4", "Fisch 9"]
        .iter()
        .map(|name| cache_image(&images_dir, name, [60, 90, 120]))
        .collect();

    let acquisition =
        ImageAcquisition::new(ScriptedSearch::default(), MapFetcher::default(), test_policy());
    let registry = PoorQualityRegistry::new(dir.path().join("poor_quality_images.txt"));
    let mut flow = ImageFlow::new(acquisition, &images_dir, registry).unwrap();
    let mut canvas = RecordingCanvas::default();

    let summary = render_cards(&entries, &mut canvas, &mut flow).await.unwrap();

    assert_eq!(summary.pages, 4);
    assert_eq!(summary.cards, 10);
    assert_eq!(summary.images_placed, 3);
    assert_eq!(summary.cards_without_image, 7);

    let pages: Vec<Side> = canvas
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Page(side) => Some(*side),
            _ => None,
        })
        .collect();
    assert_eq!(pages, vec![Side::Front, Side::Back, Side::Front, Side::Back]);

    let borders = canvas.ops.iter().filter(|op| matches!(op, DrawOp::Border(_))).count();
    assert_eq!(borders, 20);

    let images: Vec<&PathBuf> = canvas
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Image(path, _) => Some(path),
            _ => None,
        })
        .collect();
    assert_eq!(images, cached.iter().collect::<Vec<_>>());

    // 第一张卡片：正面在左上，背面文字在右上
    let first_text = canvas
        .ops
        .iter()
        .find_map(|op| match op {
            DrawOp::Text(text, bounds) => Some((text.clone(), *bounds)),
            _ => None,
        })
        .unwrap();
    assert_eq!(first_text.0, "Fisch 1\n\nMindestmaß: 30 cm");
    assert_eq!(first_text.1.x, 112.0);
    assert_eq!(first_text.1.y, 12.0);

    let flow_summary = flow.finish().unwrap();
    assert_eq!(flow_summary.stats.skipped, 3);
    assert_eq!(flow_summary.stats.failed, 7);
}

#[tokio::test]
async fn test_missing_images_are_fetched_while_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let images_dir = dir.path().join("images");
    std::fs::create_dir_all(&images_dir).unwrap();

    let entries = vec![Entry::new("Äsche", "Schonzeit: 01.03-30.04, Mindestmaß: 35 cm")];
    let search = ScriptedSearch::default().with("Äsche", &["small", "good"]);
    let fetcher = MapFetcher::default()
        .with("small", solid(300, 200, [0, 0, 0]))
        .with("good", solid(640, 480, [10, 120, 200]));
    let acquisition = ImageAcquisition::new(search, fetcher, test_policy());
    let registry = PoorQualityRegistry::new(dir.path().join("poor_quality_images.txt"));
    let mut flow = ImageFlow::new(acquisition, &images_dir, registry).unwrap();

    let path = flow.image_for(&entries[0], 0, 0).await.unwrap();

    assert_eq!(path, cache_path::cache_path(&images_dir, "Äsche"));
    let stored = image_codec::load(&path).unwrap();
    assert_eq!((stored.width(), stored.height()), (640, 480));
}

#[tokio::test]
async fn test_failed_pdf_write_still_updates_registry() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_dataset(
        &config,
        r#"[{"question":"Hecht","answer":"Schonzeit: 01.02-30.04, Mindestmaß: 50 cm"}]"#,
    );
    cache_image(&config.images_dir, "Hecht", [20, 20, 20]);
    write_registry(&config, "Hecht\nStör\n");

    let search = ScriptedSearch::default().with("Hecht", &["hecht-new"]);
    let fetcher = MapFetcher::default().with("hecht-new", solid(800, 600, [30, 90, 160]));

    let app = App::initialize(config.clone()).await.unwrap();
    // 目标路径是目录，PDF 无法写入
    let pdf_path = app.output_path(Selection::All, OutputFormat::Pdf);
    std::fs::create_dir_all(&pdf_path).unwrap();

    let command = Command::Generate {
        selection: Selection::All,
        format: OutputFormat::Pdf,
    };
    assert!(app.run_with(&command, search, fetcher).await.is_err());

    let registry = PoorQualityRegistry::new(&config.poor_quality_file)
        .load()
        .unwrap();
    assert_eq!(registry.iter().collect::<Vec<_>>(), vec!["Stör"]);
}
