//! 答案解析服务 - 业务能力层
//!
//! 把一条无结构的答案文本拆成禁渔期 / 最小尺寸 / 全年禁捕三个字段，
//! 并组合成卡片背面和 CSV 使用的摘要。纯函数，没有错误分支。
//!
//! 优先级：
//! 1. 禁渔期和最小尺寸都有 → `Schonzeit: ..<br/>Mindestmaß: ..`
//! 2. 只有其中一个 → 只输出该字段
//! 3. 都没有 → 全年禁捕文本，否则固定的“无限制”句子

use crate::models::entry::{CLOSED_SEASON_MARKER, MINIMUM_SIZE_MARKER, YEAR_ROUND_MARKER};
use regex::Regex;
use std::sync::LazyLock;

/// 摘要中两个字段之间的换行标记
pub const LINE_BREAK: &str = "<br/>";
/// 没有任何限制时的固定句子
pub const NO_RESTRICTION: &str = "Keine Schonzeit oder Mindestmaß angegeben";

const CLOSED_SEASON_LABEL: &str = "Schonzeit";
const MINIMUM_SIZE_LABEL: &str = "Mindestmaß";
const FIELD_SEPARATOR: char = ',';

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}\.\d{2})[–-](\d{2}\.\d{2})").expect("date range pattern is valid")
});

/// 解析结果（派生数据，不保存）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedAnswer {
    /// 规范化后的禁渔期
    pub closed_season: Option<String>,
    /// 最小尺寸（只去掉空白）
    pub minimum_size: Option<String>,
    pub year_round_protected: bool,
    /// 只有在其他三项都不成立时才为 true
    pub has_no_restriction: bool,
}

impl ParsedAnswer {
    /// 组合摘要
    pub fn summary(&self) -> String {
        let mut result = String::new();
        if let Some(range) = &self.closed_season {
            result.push_str(&format!("{CLOSED_SEASON_LABEL}: {range}"));
        }
        if let Some(size) = &self.minimum_size {
            if !result.is_empty() {
                result.push_str(LINE_BREAK);
            }
            result.push_str(&format!("{MINIMUM_SIZE_LABEL}: {size}"));
        }
        if result.is_empty() {
            if self.year_round_protected {
                return YEAR_ROUND_MARKER.to_string();
            }
            return NO_RESTRICTION.to_string();
        }
        result.trim().to_string()
    }
}

/// 解析答案文本
pub fn parse(raw_answer: &str) -> ParsedAnswer {
    let year_round_protected = raw_answer.contains(YEAR_ROUND_MARKER);

    let closed_season = field_after(raw_answer, CLOSED_SEASON_MARKER)
        .map(normalize_range)
        .filter(|range| !range.is_empty());

    let minimum_size = field_after(raw_answer, MINIMUM_SIZE_MARKER)
        .map(|size| size.trim().to_string())
        .filter(|size| !size.is_empty());

    let has_no_restriction =
        closed_season.is_none() && minimum_size.is_none() && !year_round_protected;

    ParsedAnswer {
        closed_season,
        minimum_size,
        year_round_protected,
        has_no_restriction,
    }
}

/// 解析并直接返回摘要
pub fn summarize(raw_answer: &str) -> String {
    parse(raw_answer).summary()
}

/// 规范化日期区间：`DD.MM-DD.MM` 或 `DD.MM–DD.MM` → `DD.MM bis DD.MM`，
/// 否则去掉首尾空白和结尾的句点
pub fn normalize_range(text: &str) -> String {
    if let Some(caps) = DATE_RANGE.captures(text) {
        return format!("{} bis {}", &caps[1], &caps[2]);
    }
    text.trim().trim_end_matches('.').to_string()
}

/// 取标记之后到下一个逗号（或下一个同名标记 / 文本结尾）之间的内容
fn field_after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let rest = text.split(marker).nth(1)?.trim();
    Some(match rest.split_once(FIELD_SEPARATOR) {
        Some((field, _)) => field,
        None => rest,
    })
}
