use serde::{Deserialize, Serialize};
use std::fmt;

/// 合理性状态
///
/// 描述一个提取值的可信程度，而不是正确性。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlausibilityStatus {
    /// 满分
    Full,
    /// 零分
    Zero,
    /// 介于零分和满分之间
    Ok,
    /// 无法解释或超出范围
    Invalid,
    /// 题目区域内没有检测到分数
    NoMatch,
    /// 题目区域内检测到多个分数
    DoubleMatch,
    /// 经过 OCR 修正（只用于学号 / 座位号）
    Normalized,
}

impl PlausibilityStatus {
    /// 获取标准名称
    pub fn as_str(self) -> &'static str {
        match self {
            PlausibilityStatus::Full => "full",
            PlausibilityStatus::Zero => "zero",
            PlausibilityStatus::Ok => "ok",
            PlausibilityStatus::Invalid => "invalid",
            PlausibilityStatus::NoMatch => "no_match",
            PlausibilityStatus::DoubleMatch => "double_match",
            PlausibilityStatus::Normalized => "normalized",
        }
    }

    /// 是否需要人工复核
    pub fn needs_review(self) -> bool {
        matches!(
            self,
            PlausibilityStatus::Invalid
                | PlausibilityStatus::NoMatch
                | PlausibilityStatus::DoubleMatch
                | PlausibilityStatus::Normalized
        )
    }
}

impl fmt::Display for PlausibilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
