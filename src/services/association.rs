//! 题目-分数关联服务 - 业务能力层
//!
//! 题目标题按 (页码, 纵坐标) 排出阅读顺序，每个标题拥有从自身位置到下一个标题
//! 位置（不含）的区域，落在区域内的分数都归这道题。选中置信度最高的分数，
//! 但保留区域内的分数总数，供下游判定 double_match。

use crate::models::{
    Association, AssociationEntry, DuplicateHeader, GradeCandidate, Label, PageDetections,
    QuestionSlot,
};
use crate::services::page_marker::PageMarkerParser;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

static HEADLINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\. ?Frage.*\((\d+)\s*Punkte\)").expect("题目标题正则不合法")
});
static HEADLINE_FALLBACK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)[^\d]*\((\d+)\s*Punkte\)").expect("题目标题正则不合法")
});

/// 解析题目标题
///
/// `"1.Frage Grundlagen (10 Punkte)"` → `(1, Some(10))`。
/// 无法解析或题号为 0 时返回 `None`。
pub fn parse_question_headline(text: &str) -> Option<(u32, Option<u32>)> {
    let caps = HEADLINE_PATTERN
        .captures(text)
        .or_else(|| HEADLINE_FALLBACK_PATTERN.captures(text))?;
    let qnum: u32 = caps[1].parse().ok().filter(|n| *n > 0)?;
    let max_marks = caps[2].parse().ok();
    Some((qnum, max_marks))
}

/// 一个学生分组中提取出的原始证据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupEvidence {
    pub matriculation_number: Option<String>,
    pub seat_number: Option<String>,
    pub slots: Vec<QuestionSlot>,
    pub grades: Vec<GradeCandidate>,
    /// 印刷页码 → 总页数
    pub page_markers: BTreeMap<u32, u32>,
    /// 无法解析而被丢弃的题目标题数量
    pub unparsed_headers: usize,
}

/// 从分组页面中提取学号、座位号、题目标题、分数和页码标记
///
/// 没有候选文本的记录直接跳过。学号 / 座位号取 `:` 之后的部分，
/// 同一分组出现多次时以最后一次非空的为准。
pub fn extract_group_evidence(pages: &[PageDetections], parser: &PageMarkerParser) -> GroupEvidence {
    let mut evidence = GroupEvidence::default();

    for page in pages {
        for record in &page.records {
            let Some(best) = record.best_candidate() else {
                continue;
            };
            let text = best.text.as_str();

            match record.label {
                Label::PageNumber => {
                    if let Some(marker) = parser.parse(text) {
                        evidence.page_markers.insert(marker.current, marker.total);
                    }
                }
                Label::MatriculationNumber => {
                    if let Some(id) = after_last_colon(text) {
                        evidence.matriculation_number = Some(id);
                    }
                }
                Label::SeatNumber => {
                    if let Some(id) = after_last_colon(text) {
                        evidence.seat_number = Some(id);
                    }
                }
                Label::QuestionHeader => match parse_question_headline(text) {
                    Some((qnum, max_marks)) => evidence.slots.push(QuestionSlot {
                        qnum,
                        max_marks,
                        page: page.page,
                        y: record.bbox.top(),
                        crop: record.crop.clone(),
                    }),
                    None => {
                        debug!("第 {} 页题目标题无法解析: {}", page.page, text);
                        evidence.unparsed_headers += 1;
                    }
                },
                Label::Grade => evidence.grades.push(GradeCandidate {
                    text: text.to_string(),
                    confidence: best.confidence,
                    page: page.page,
                    y: record.bbox.center_y(),
                    crop: record.crop.clone(),
                }),
                Label::Other => {}
            }
        }
    }

    evidence
}

/// `:` 之后的文本，为空时返回 `None`
fn after_last_colon(text: &str) -> Option<String> {
    let id = text.rsplit(':').next().unwrap_or(text).trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// 文档阅读顺序：先页码，后纵坐标
fn reading_order(a: (u32, f64), b: (u32, f64)) -> Ordering {
    a.0.cmp(&b.0).then_with(|| a.1.total_cmp(&b.1))
}

fn is_before(a: (u32, f64), b: (u32, f64)) -> bool {
    a.0 < b.0 || (a.0 == b.0 && a.1 < b.1)
}

/// 置信度最高的分数；置信度相同时取阅读顺序靠前的
fn best_grade<'a>(candidates: &[&'a GradeCandidate]) -> Option<&'a GradeCandidate> {
    let mut best: Option<&GradeCandidate> = None;
    for &candidate in candidates {
        let better = match best {
            Some(b) => candidate.confidence > b.confidence,
            None => !candidate.confidence.is_nan(),
        };
        if better {
            best = Some(candidate);
        }
    }
    best.or_else(|| candidates.first().copied())
}

/// 把题目标题和分数关联成稠密的题号映射
///
/// 重复题号只保留阅读顺序中的第一个；后出现的重复标题仍然作为前一区域的边界，
/// 但它自己区域内的分数被丢弃并记录下来。
pub fn associate(slots: &[QuestionSlot], grades: &[GradeCandidate]) -> Association {
    let mut slots: Vec<&QuestionSlot> = slots.iter().collect();
    slots.sort_by(|a, b| reading_order((a.page, a.y), (b.page, b.y)));
    let mut grades: Vec<&GradeCandidate> = grades.iter().collect();
    grades.sort_by(|a, b| reading_order((a.page, a.y), (b.page, b.y)));

    let mut association = Association::default();

    association.orphan_grades = match slots.first() {
        Some(first) => grades
            .iter()
            .filter(|g| is_before((g.page, g.y), (first.page, first.y)))
            .count(),
        None => grades.len(),
    };

    for (i, slot) in slots.iter().enumerate() {
        let start = (slot.page, slot.y);
        let end = slots.get(i + 1).map(|next| (next.page, next.y));

        let candidates: Vec<&GradeCandidate> = grades
            .iter()
            .copied()
            .filter(|g| {
                let pos = (g.page, g.y);
                !is_before(pos, start) && end.map_or(true, |e| is_before(pos, e))
            })
            .collect();

        if association.entries.contains_key(&slot.qnum) {
            debug!(
                "题号 {} 在第 {} 页重复出现，丢弃 {} 个分数",
                slot.qnum,
                slot.page,
                candidates.len()
            );
            association.duplicates.push(DuplicateHeader {
                qnum: slot.qnum,
                page: slot.page,
                discarded_grades: candidates.len(),
            });
            continue;
        }

        association.observations.insert(slot.qnum, candidates.len());

        let entry = match best_grade(&candidates) {
            Some(grade) => AssociationEntry {
                raw: Some(grade.text.clone()),
                raw_confidence: Some(grade.confidence),
                max_marks: slot.max_marks,
                question_page: Some(slot.page),
                achieved_page: Some(grade.page),
                question_crop: slot.crop.clone(),
                grade_crop: grade.crop.clone(),
                error: None,
            },
            None => AssociationEntry {
                max_marks: slot.max_marks,
                question_page: Some(slot.page),
                question_crop: slot.crop.clone(),
                ..Default::default()
            },
        };
        association.entries.insert(slot.qnum, entry);
    }

    backfill_gaps(&mut association);
    association
}

/// 补齐 1..=最大题号 之间缺失的题号
fn backfill_gaps(association: &mut Association) {
    let Some(&max_qnum) = association.entries.keys().next_back() else {
        return;
    };
    for qnum in 1..=max_qnum {
        if !association.entries.contains_key(&qnum) {
            association.entries.insert(qnum, AssociationEntry::not_detected());
            association.observations.insert(qnum, 0);
        }
    }
}
