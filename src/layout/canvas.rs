use crate::error::ExportError;
use crate::layout::{Bounds, Side};
use std::path::Path;

/// 抽象画布
///
/// 排版引擎只给出位置，具体怎么画由实现决定（PDF、测试中的记录器等）
pub trait Canvas {
    /// 开始新的一页
    fn begin_page(&mut self, side: Side);

    /// 卡片边框，无论有没有内容都要画
    fn draw_border(&mut self, bounds: Bounds);

    /// 把缓存图片缩放到给定区域
    fn draw_image(&mut self, image_path: &Path, bounds: Bounds) -> Result<(), ExportError>;

    /// 在区域内自动换行绘制文字，超出区域的行被丢弃
    fn draw_text(&mut self, text: &str, bounds: Bounds);
}
