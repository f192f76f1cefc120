//! 导出器：PDF 卡片、Repetico CSV 和 JSON

pub mod csv;
pub mod pdf;
pub mod pdf_canvas;
pub mod repetico;

pub use pdf::{render_cards, ImageProvider, PdfSummary};
pub use pdf_canvas::PdfCanvas;
