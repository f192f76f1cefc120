pub mod entry;
pub mod loaders;

pub use entry::{Entry, Selection};
pub use loaders::load_dataset;
