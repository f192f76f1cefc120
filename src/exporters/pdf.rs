//! PDF 卡片导出
//!
//! 每批 8 条：先画正面（图片），再画背面（镜像后的文字）。
//! 图片由 [`ImageProvider`] 提供，拿不到图片的卡片只画边框。

use crate::error::ExportError;
use crate::layout::{self, Canvas, Side};
use crate::models::Entry;
use crate::services::answer_parser::{self, LINE_BREAK};
use std::path::PathBuf;
use tracing::{debug, warn};

/// 为一条记录提供缓存图片
#[allow(async_fn_in_trait)]
pub trait ImageProvider {
    /// 返回可用的图片路径；没有图片时返回 `None`
    async fn image_for(&mut self, entry: &Entry, batch_index: usize, slot_index: usize)
        -> Option<PathBuf>;
}

/// PDF 导出统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PdfSummary {
    pub pages: usize,
    pub cards: usize,
    pub images_placed: usize,
    pub cards_without_image: usize,
}

/// 卡片背面的文字
pub fn back_text(entry: &Entry) -> String {
    let summary = answer_parser::summarize(&entry.raw_answer);
    format!("{}\n\n{}", entry.identifier, summary.replace(LINE_BREAK, "\n"))
}

/// 把所有记录画到画布上
pub async fn render_cards<C, P>(
    entries: &[Entry],
    canvas: &mut C,
    images: &mut P,
) -> Result<PdfSummary, ExportError>
where
    C: Canvas,
    P: ImageProvider,
{
    let mut summary = PdfSummary::default();

    for (batch_index, batch) in layout::batches(entries) {
        debug!("第 {} 批: {} 张卡片", batch_index + 1, batch.len());

        // 正面：图片
        canvas.begin_page(Side::Front);
        summary.pages += 1;
        let front = layout::compute_slots(batch_index, batch.len(), Side::Front);
        for (slot_index, (entry, slot)) in batch.iter().zip(&front).enumerate() {
            let placed = match images.image_for(entry, batch_index, slot_index).await {
                Some(path) => match canvas.draw_image(&path, slot.content_bounds()) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("{}: 图片无法放入PDF: {}", entry.identifier, e);
                        false
                    }
                },
                None => false,
            };
            if placed {
                summary.images_placed += 1;
            } else {
                summary.cards_without_image += 1;
            }
            canvas.draw_border(slot.card_bounds());
        }

        // 背面：文字，列已镜像
        canvas.begin_page(Side::Back);
        summary.pages += 1;
        let back = layout::compute_slots(batch_index, batch.len(), Side::Back);
        for (entry, slot) in batch.iter().zip(&back) {
            canvas.draw_text(&back_text(entry), slot.content_bounds());
            canvas.draw_border(slot.card_bounds());
        }

        summary.cards += batch.len();
    }

    Ok(summary)
}
