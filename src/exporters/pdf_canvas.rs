//! 基于 printpdf 的画布实现
//!
//! 排版坐标的原点在左上角，PDF 的原点在左下角，这里统一换算

use crate::error::ExportError;
use crate::layout::{Bounds, Canvas, Side, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::services::image_codec;
use phf::phf_map;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// 文字大小（pt）
const FONT_SIZE_PT: f32 = 14.0;
/// 行高（mm）
const LINE_HEIGHT_MM: f32 = 7.0;
/// 平均字符宽度占字号的比例，用于估算每行字数
const AVERAGE_CHAR_WIDTH_EM: f32 = 0.5;
const PT_TO_MM: f32 = 25.4 / 72.0;
const IMAGE_DPI: f32 = 300.0;
const BORDER_THICKNESS_PT: f32 = 0.5;

/// 内置 Helvetica 无法编码的字符
static TRANSLITERATIONS: phf::Map<char, &'static str> = phf_map! {
    '–' => "-",
    '—' => "-",
    '„' => "\"",
    '“' => "\"",
    '”' => "\"",
    '’' => "'",
    '‘' => "'",
    '…' => "...",
    'ß' => "ss",
    'ä' => "ae",
    'ö' => "oe",
    'ü' => "ue",
    'Ä' => "Ae",
    'Ö' => "Oe",
    'Ü' => "Ue",
};

/// 把文字转写成内置字体可以显示的 ASCII
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match TRANSLITERATIONS.get(&c) {
            Some(replacement) => out.push_str(replacement),
            None if c.is_ascii() => out.push(c),
            None => out.push('?'),
        }
    }
    out
}

/// 按单词贪心换行；保留原有的换行和空行，过长的单词强制截断
pub fn wrap_lines(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > max_chars && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }

        lines.push(current);
    }

    lines
}

/// PDF 画布
pub struct PdfCanvas {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    transliterate: bool,
    /// PdfDocument::new 自带的第一页，第一次 begin_page 时使用
    first_layer: Option<PdfLayerReference>,
    layer: Option<PdfLayerReference>,
    pages: usize,
}

impl PdfCanvas {
    /// `font_path` 为空时使用内置 Helvetica 并转写特殊字符
    pub fn new(title: &str, font_path: Option<&Path>) -> Result<Self, ExportError> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Seite 1",
        );
        let first_layer = doc.get_page(page).get_layer(layer);

        let (font, transliterate) = match font_path {
            Some(path) => {
                let file = File::open(path).map_err(|e| {
                    ExportError::Pdf(format!("无法打开字体 {}: {}", path.display(), e))
                })?;
                let font = doc
                    .add_external_font(file)
                    .map_err(|e| ExportError::Pdf(format!("无法加载字体 {}: {}", path.display(), e)))?;
                (font, false)
            }
            None => {
                let font = doc
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| ExportError::Pdf(e.to_string()))?;
                (font, true)
            }
        };

        Ok(Self {
            doc,
            font,
            transliterate,
            first_layer: Some(first_layer),
            layer: None,
            pages: 0,
        })
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    /// 写入文件
    pub fn save(self, path: &Path) -> Result<(), ExportError> {
        let file = File::create(path).map_err(|e| ExportError::write_failed(path, e))?;
        self.doc
            .save(&mut BufWriter::new(file))
            .map_err(|e| ExportError::Pdf(e.to_string()))
    }

    /// 当前页；还没有 begin_page 时落在第一页
    fn current_layer(&mut self) -> PdfLayerReference {
        match &self.layer {
            Some(layer) => layer.clone(),
            None => self.open_page(Side::Front),
        }
    }

    fn open_page(&mut self, side: Side) -> PdfLayerReference {
        let layer = match self.first_layer.take() {
            Some(layer) => layer,
            None => {
                let name = match side {
                    Side::Front => "Vorderseite",
                    Side::Back => "Rückseite",
                };
                let (page, layer) =
                    self.doc
                        .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), name);
                self.doc.get_page(page).get_layer(layer)
            }
        };
        layer.set_outline_thickness(BORDER_THICKNESS_PT);
        self.layer = Some(layer.clone());
        self.pages += 1;
        layer
    }

    fn chars_per_line(width_mm: f32) -> usize {
        (width_mm / (FONT_SIZE_PT * PT_TO_MM * AVERAGE_CHAR_WIDTH_EM)).floor() as usize
    }
}

/// 左上角坐标 → PDF 坐标
fn pdf_y(top_y: f32) -> Mm {
    Mm(PAGE_HEIGHT_MM - top_y)
}

impl Canvas for PdfCanvas {
    fn begin_page(&mut self, side: Side) {
        self.open_page(side);
    }

    fn draw_border(&mut self, bounds: Bounds) {
        let left = Mm(bounds.x);
        let right = Mm(bounds.x + bounds.width);
        let top = pdf_y(bounds.y);
        let bottom = pdf_y(bounds.y + bounds.height);

        let border = Line {
            points: vec![
                (Point::new(left, bottom), false),
                (Point::new(right, bottom), false),
                (Point::new(right, top), false),
                (Point::new(left, top), false),
            ],
            is_closed: true,
        };
        self.current_layer().add_line(border);
    }

    fn draw_image(&mut self, image_path: &Path, bounds: Bounds) -> Result<(), ExportError> {
        let decoded = image_codec::load(image_path).ok_or_else(|| {
            ExportError::Pdf(format!("图片无法解码: {}", image_path.display()))
        })?;

        // 按目标区域拉伸，与卡片尺寸一致
        let native_width_mm = decoded.width() as f32 / IMAGE_DPI * 25.4;
        let native_height_mm = decoded.height() as f32 / IMAGE_DPI * 25.4;
        let transform = ImageTransform {
            translate_x: Some(Mm(bounds.x)),
            translate_y: Some(pdf_y(bounds.y + bounds.height)),
            scale_x: Some(bounds.width / native_width_mm),
            scale_y: Some(bounds.height / native_height_mm),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        };

        let layer = self.current_layer();
        Image::from_dynamic_image(&decoded.to_dynamic()).add_to_layer(layer, transform);
        Ok(())
    }

    fn draw_text(&mut self, text: &str, bounds: Bounds) {
        let text = if self.transliterate {
            transliterate(text)
        } else {
            text.to_string()
        };

        let max_lines = (bounds.height / LINE_HEIGHT_MM).floor() as usize;
        let font_height_mm = FONT_SIZE_PT * PT_TO_MM;
        let layer = self.current_layer();

        for (i, line) in wrap_lines(&text, Self::chars_per_line(bounds.width))
            .into_iter()
            .take(max_lines)
            .enumerate()
        {
            if line.is_empty() {
                continue;
            }
            let baseline = bounds.y + i as f32 * LINE_HEIGHT_MM + font_height_mm;
            layer.use_text(line, FONT_SIZE_PT, Mm(bounds.x), pdf_y(baseline), &self.font);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transliterate_german_text() {
        assert_eq!(
            transliterate("Äsche – Mindestmaß: 35 cm „groß“…"),
            "Aesche - Mindestmass: 35 cm \"gross\"..."
        );
        assert_eq!(transliterate("Saibling ø"), "Saibling ?");
    }

    #[test]
    fn test_wrap_keeps_paragraphs_and_blank_lines() {
        let lines = wrap_lines("Hecht\n\nSchonzeit: 01.03 bis 31.05", 12);
        assert_eq!(lines, vec!["Hecht", "", "Schonzeit:", "01.03 bis", "31.05"]);
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        let lines = wrap_lines("Regenbogenforelle ist", 8);
        assert_eq!(lines, vec!["Regenbog", "enforell", "e ist"]);
    }

    #[test]
    fn test_chars_per_line_for_card_width() {
        // 86mm 的内容宽度，14pt 字号
        assert_eq!(PdfCanvas::chars_per_line(86.0), 34);
    }

    #[test]
    fn test_pdf_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("karten.pdf");
        let mut canvas = PdfCanvas::new("Fischkarten", None).unwrap();

        canvas.begin_page(Side::Front);
        canvas.draw_border(Bounds { x: 10.0, y: 10.0, width: 90.0, height: 60.0 });
        canvas.begin_page(Side::Back);
        canvas.draw_text("Äsche\n\nMindestmaß: 35 cm", Bounds { x: 112.0, y: 12.0, width: 86.0, height: 56.0 });
        assert_eq!(canvas.pages(), 2);
        canvas.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
