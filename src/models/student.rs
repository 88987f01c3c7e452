//! 学生记录模型
//!
//! 每个学生分组在一次处理中生成一条 `StudentRecord`，汇总完成后不再修改。

use crate::models::question::{AssociationEntry, AssociationMap};
use crate::models::status::PlausibilityStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 学号 / 座位号字段
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IdField {
    /// 原始 OCR 文本（已去掉 `:` 之前的前缀）
    pub raw: Option<String>,
    /// 数字修正后的文本
    pub normalized: Option<String>,
    /// 是否发生过字符替换
    pub changed: bool,
    pub status: Option<PlausibilityStatus>,
}

/// 单道题的评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub qnum: u32,
    pub entry: AssociationEntry,
    /// 区域内观察到的分数数量
    pub observations: usize,
    /// 按本地小数分隔符显示的得分
    pub achieved_text: String,
    pub achieved: Option<f64>,
    /// 是否经过 OCR 字符修正
    pub normalized: bool,
    pub status: PlausibilityStatus,
    /// achieved / max_marks
    pub relative: Option<f64>,
    /// "OK" 或问题描述
    pub error_check: String,
}

/// 页面缺失的归因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCause {
    /// 页面都在，但页码文本没有被识别出来
    Recognizer,
    /// 扫描中缺少页面本身
    Detector,
}

/// 页面完整性结论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageHealth {
    pub ok: bool,
    pub message: String,
    pub expected_total: Option<u32>,
    pub physical_pages: usize,
    pub missing: Vec<u32>,
    pub extra: Vec<u32>,
    pub missing_cause: Option<MissingCause>,
}

/// 一个学生的评分记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// 分组序号（从 1 开始）
    pub group_index: usize,
    /// 本组包含的文档页码
    pub pages: Vec<u32>,
    pub matriculation_number: IdField,
    pub seat_number: IdField,
    /// 稠密的题号映射
    pub associations: AssociationMap,
    pub observations: BTreeMap<u32, usize>,
    pub questions: BTreeMap<u32, QuestionResult>,
    /// 印刷页码 → 总页数
    pub page_markers: BTreeMap<u32, u32>,
    pub page_health: PageHealth,
    pub achieved_total: f64,
    pub max_total: f64,
    pub percentage: f64,
    /// 按本地小数分隔符显示的最终成绩
    pub final_grade: String,
    pub passed: bool,
    pub issues: Vec<String>,
}

impl StudentRecord {
    /// 用于日志和问题列表的学生标识
    pub fn display_id(&self) -> String {
        self.matriculation_number
            .normalized
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "?".to_string())
    }

    /// 需要人工复核的题号
    pub fn questions_needing_review(&self) -> Vec<u32> {
        self.questions
            .values()
            .filter(|q| q.status.needs_review())
            .map(|q| q.qnum)
            .collect()
    }
}

/// 每个成绩的人数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeCount {
    pub grade: String,
    pub count: usize,
}

/// 一份文档的评分结果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    pub students: Vec<StudentRecord>,
    /// 所有学生问题的扁平列表
    pub issues: Vec<String>,
    pub grade_distribution: Vec<GradeCount>,
}
