//! 鱼名 ↔ 缓存文件名
//!
//! 只对文件系统保留字符做百分号编码，普通鱼名（含变音字母和空格）保持原样，
//! 因此旧的 `<鱼名>.jpg` 缓存仍然可以直接命中

use std::path::{Path, PathBuf};

/// 缓存图片扩展名
pub const IMAGE_EXTENSION: &str = "jpg";

const RESERVED: &[char] = &['%', '/', '\\', ':', '*', '?', '"', '<', '>', '|'];

fn needs_escape(c: char, is_first: bool) -> bool {
    RESERVED.contains(&c) || c.is_ascii_control() || (is_first && c == '.')
}

/// 把鱼名编码成可以安全使用的文件名主体（不含扩展名）
pub fn encode_identifier(identifier: &str) -> String {
    let mut encoded = String::with_capacity(identifier.len());
    for (i, c) in identifier.chars().enumerate() {
        if needs_escape(c, i == 0) {
            encoded.push_str(&format!("%{:02X}", c as u32));
        } else {
            encoded.push(c);
        }
    }
    encoded
}

/// [`encode_identifier`] 的逆操作；不是合法编码时返回 `None`
pub fn decode_identifier(encoded: &str) -> Option<String> {
    let mut decoded = String::with_capacity(encoded.len());
    let mut chars = encoded.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            decoded.push(c);
            continue;
        }
        let hex: String = chars.by_ref().take(2).collect();
        if hex.len() != 2 {
            return None;
        }
        let byte = u8::from_str_radix(&hex, 16).ok()?;
        decoded.push(char::from(byte));
    }
    Some(decoded)
}

/// 缓存文件名，例如 `Hecht.jpg`
pub fn file_name_for(identifier: &str) -> String {
    format!("{}.{}", encode_identifier(identifier), IMAGE_EXTENSION)
}

/// 从缓存文件名还原鱼名
pub fn identifier_for(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(&format!(".{IMAGE_EXTENSION}"))?;
    decode_identifier(stem)
}

/// 缓存目录中的完整路径
pub fn cache_path(images_dir: &Path, identifier: &str) -> PathBuf {
    images_dir.join(file_name_for(identifier))
}
