//! 图片解码、哈希与相似度
//!
//! 所有图片统一转换为 RGB8 后再比较

use crate::error::ImageError;
use image::{DynamicImage, ImageFormat, RgbImage};
use sha2::{Digest, Sha256};
use std::path::Path;

/// 解码后的图片
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: RgbImage,
}

impl DecodedImage {
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageRgb8(self.pixels.clone())
    }
}

/// 从内存解码，任意格式
pub fn decode(bytes: &[u8]) -> Option<DecodedImage> {
    image::load_from_memory(bytes)
        .ok()
        .map(|img| DecodedImage::new(img.to_rgb8()))
}

/// 读取缓存中的图片；文件损坏时返回 `None`
///
/// 按文件内容判断格式，不看扩展名
pub fn load(path: &Path) -> Option<DecodedImage> {
    image::io::Reader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .decode()
        .ok()
        .map(|img| DecodedImage::new(img.to_rgb8()))
}

/// 原始 RGB 像素的 SHA-256
pub fn content_hash(image: &DecodedImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image.pixels.as_raw());
    format!("{:x}", hasher.finalize())
}

/// 两张图片的感知差异
///
/// 在重叠区域内按通道求平均绝对差，再对各通道平均值的平方取平均。
/// 完全相同的图片结果为 0
pub fn perceptual_difference(a: &DecodedImage, b: &DecodedImage) -> f64 {
    let width = a.width().min(b.width());
    let height = a.height().min(b.height());
    let count = u64::from(width) * u64::from(height);
    if count == 0 {
        return 0.0;
    }

    let mut sums = [0u64; 3];
    for y in 0..height {
        for x in 0..width {
            let pa = a.pixels.get_pixel(x, y);
            let pb = b.pixels.get_pixel(x, y);
            for (channel, sum) in sums.iter_mut().enumerate() {
                *sum += u64::from(pa[channel].abs_diff(pb[channel]));
            }
        }
    }

    let squared: f64 = sums
        .iter()
        .map(|sum| {
            let mean = *sum as f64 / count as f64;
            mean * mean
        })
        .sum();
    squared / sums.len() as f64
}

/// 以 JPEG 格式保存
///
/// 先写入同目录下的临时文件再重命名，失败时原缓存文件保持不变
pub fn save_jpeg(image: &DecodedImage, path: &Path) -> Result<(), ImageError> {
    replace_via_temp(path, |tmp_path| {
        image.to_dynamic().save_with_format(tmp_path, ImageFormat::Jpeg)
    })
}

/// 写入 `<path>.part` 后重命名；写入失败时删除临时文件
fn replace_via_temp<W>(path: &Path, write: W) -> Result<(), ImageError>
where
    W: FnOnce(&Path) -> Result<(), image::ImageError>,
{
    let tmp_path = path.with_extension("jpg.part");
    if let Err(source) = write(&tmp_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(ImageError::SaveFailed {
            path: tmp_path,
            source,
        });
    }
    std::fs::rename(&tmp_path, path).map_err(|source| ImageError::ReplaceFailed {
        path: path.to_path_buf(),
        source,
    })
}
