use serde::{Deserialize, Serialize};

/// 原始答案中的标记
pub const YEAR_ROUND_MARKER: &str = "Ganzjährig geschont";
pub const CLOSED_SEASON_MARKER: &str = "Schonzeit:";
pub const MINIMUM_SIZE_MARKER: &str = "Mindestmaß:";

/// 数据集中的一条记录
///
/// `identifier` 既是显示名称也是图片缓存的键
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "question")]
    pub identifier: String,
    #[serde(rename = "answer")]
    pub raw_answer: String,
}

impl Entry {
    pub fn new(identifier: impl Into<String>, raw_answer: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            raw_answer: raw_answer.into(),
        }
    }

    /// 全年禁捕
    pub fn is_year_round_protected(&self) -> bool {
        self.raw_answer.contains(YEAR_ROUND_MARKER)
    }

    /// 有禁渔期或最小尺寸，且不是全年禁捕
    pub fn has_season_or_size(&self) -> bool {
        (self.raw_answer.contains(CLOSED_SEASON_MARKER)
            || self.raw_answer.contains(MINIMUM_SIZE_MARKER))
            && !self.is_year_round_protected()
    }
}

/// 数据集子集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Selection {
    /// 所有鱼
    All,
    /// 只要全年禁捕的鱼
    YearRound,
    /// 只要有禁渔期或最小尺寸的鱼
    Restricted,
}

impl Selection {
    /// 输出文件名前缀
    pub fn file_stem(self) -> &'static str {
        match self {
            Selection::All => "alle_fische",
            Selection::YearRound => "ganzjaehrig_geschont",
            Selection::Restricted => "schonzeit_mindestmass",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Selection::All => "所有鱼类",
            Selection::YearRound => "全年禁捕的鱼类",
            Selection::Restricted => "有禁渔期/最小尺寸的鱼类",
        }
    }

    pub fn matches(self, entry: &Entry) -> bool {
        match self {
            Selection::All => true,
            Selection::YearRound => entry.is_year_round_protected(),
            Selection::Restricted => entry.has_season_or_size(),
        }
    }

    /// 按原顺序筛选
    pub fn apply(self, entries: &[Entry]) -> Vec<Entry> {
        entries.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}
