//! 卡片排版引擎
//!
//! 每 8 条记录占一对页面：正面放图片，背面放文字。每页 2 列 × 4 行。
//! 双面打印时背面沿竖轴翻转，所以背面的列要镜像（`1 - column`），
//! 这样每张卡片的文字正好落在对应图片的背后。
//!
//! 这里只计算位置（单位 mm，原点在页面左上角），绘制交给 [`Canvas`]。

pub mod canvas;

pub use canvas::Canvas;

/// 每对页面的卡片数
pub const CARDS_PER_PAGE: usize = 8;
pub const COLUMNS: usize = 2;
pub const ROWS: usize = CARDS_PER_PAGE / COLUMNS;

/// A4
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

pub const CARD_WIDTH_MM: f32 = 90.0;
pub const CARD_HEIGHT_MM: f32 = 60.0;
pub const MARGIN_X_MM: f32 = 10.0;
pub const MARGIN_Y_MM: f32 = 10.0;
/// 卡片之间的间距
pub const GAP_MM: f32 = 10.0;
/// 卡片边框到内容的距离
pub const PADDING_MM: f32 = 2.0;

/// 页面的哪一面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// 图片面
    Front,
    /// 文字面（列镜像）
    Back,
}

/// 矩形区域（左上角 + 尺寸，单位 mm）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    /// 向内收缩
    pub fn inset(&self, padding: f32) -> Self {
        Self {
            x: self.x + padding,
            y: self.y + padding,
            width: self.width - 2.0 * padding,
            height: self.height - 2.0 * padding,
        }
    }
}

/// 一张卡片的位置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardSlot {
    /// 整个文档中的页码（从 0 开始）：第 b 批的正面是 2b，背面是 2b+1
    pub page_index: usize,
    pub row: usize,
    pub column: usize,
    pub x: f32,
    pub y: f32,
}

impl CardSlot {
    /// 卡片边框
    pub fn card_bounds(&self) -> Bounds {
        Bounds {
            x: self.x,
            y: self.y,
            width: CARD_WIDTH_MM,
            height: CARD_HEIGHT_MM,
        }
    }

    /// 图片或文字可以使用的区域
    pub fn content_bounds(&self) -> Bounds {
        self.card_bounds().inset(PADDING_MM)
    }
}

/// 计算一批记录的位置
///
/// `batch_len` 超过 [`CARDS_PER_PAGE`] 的部分会被忽略
pub fn compute_slots(batch_index: usize, batch_len: usize, side: Side) -> Vec<CardSlot> {
    let page_index = match side {
        Side::Front => batch_index * 2,
        Side::Back => batch_index * 2 + 1,
    };

    (0..batch_len.min(CARDS_PER_PAGE))
        .map(|index| {
            let row = index / COLUMNS;
            let column = match side {
                Side::Front => index % COLUMNS,
                Side::Back => COLUMNS - 1 - index % COLUMNS,
            };
            CardSlot {
                page_index,
                row,
                column,
                x: MARGIN_X_MM + column as f32 * (CARD_WIDTH_MM + GAP_MM),
                y: MARGIN_Y_MM + row as f32 * (CARD_HEIGHT_MM + GAP_MM),
            }
        })
        .collect()
}

/// 把记录按每页 8 张分批
pub fn batches<T>(items: &[T]) -> impl Iterator<Item = (usize, &[T])> {
    items.chunks(CARDS_PER_PAGE).enumerate()
}
