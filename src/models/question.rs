//! 题目与分数的关联模型

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 检测到的一个题目标题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSlot {
    /// 题号（小正整数）
    pub qnum: u32,
    /// 满分
    pub max_marks: Option<u32>,
    pub page: u32,
    /// 边框上边缘
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
}

/// 检测到的一个分数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeCandidate {
    pub text: String,
    pub confidence: f64,
    pub page: u32,
    /// 边框垂直中心
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
}

/// 题号 → 关联结果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssociationEntry {
    /// 选中分数的原始文本
    pub raw: Option<String>,
    pub raw_confidence: Option<f64>,
    pub max_marks: Option<u32>,
    /// 题目标题所在页
    pub question_page: Option<u32>,
    /// 选中分数所在页
    pub achieved_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_crop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_crop: Option<String>,
    /// 补齐的空缺题号带有 "not detected" 标记
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssociationEntry {
    /// 空缺题号的占位条目
    pub fn not_detected() -> Self {
        Self {
            error: Some(NOT_DETECTED.to_string()),
            ..Default::default()
        }
    }

    /// 是否为补齐的占位条目
    pub fn is_synthetic(&self) -> bool {
        self.error.is_some()
    }
}

/// 占位条目的标记文本
pub const NOT_DETECTED: &str = "not detected";

/// 稠密的题号映射：1..=最大题号 全部存在
pub type AssociationMap = BTreeMap<u32, AssociationEntry>;

/// 被忽略的重复题目标题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateHeader {
    pub qnum: u32,
    pub page: u32,
    /// 该重复标题区域内被丢弃的分数数量
    pub discarded_grades: usize,
}

/// 一个学生分组的关联结果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Association {
    pub entries: AssociationMap,
    /// 每道题区域内观察到的分数数量
    pub observations: BTreeMap<u32, usize>,
    pub duplicates: Vec<DuplicateHeader>,
    /// 出现在第一个题目标题之前的分数数量
    pub orphan_grades: usize,
}

impl Association {
    pub fn observation_count(&self, qnum: u32) -> usize {
        self.observations.get(&qnum).copied().unwrap_or(0)
    }
}
