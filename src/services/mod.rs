pub mod answer_parser;
pub mod cache_path;
pub mod image_acquisition;
pub mod image_codec;
pub mod image_fetch;
pub mod image_search;
pub mod poor_quality;

pub use answer_parser::ParsedAnswer;
pub use image_acquisition::{AcquisitionOutcome, CachedImage, ImageAcquisition, RejectedCandidate};
pub use image_codec::DecodedImage;
pub use image_fetch::{HttpImageFetcher, ImageFetcher};
pub use image_search::{DuckDuckGoSearch, ImageSearch};
pub use poor_quality::{PoorQualityRegistry, PoorQualitySet};
