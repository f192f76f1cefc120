pub mod entry_ctx;
pub mod image_flow;

pub use entry_ctx::EntryCtx;
pub use image_flow::{FlowSummary, ImageFlow, ImageStats, ImageStatus};
