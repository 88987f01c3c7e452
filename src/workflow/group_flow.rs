//! 学生分组评分流程 - 流程层
//!
//! 核心职责：定义"一个学生"的完整评分流程
//!
//! 流程顺序：
//! 1. 提取证据（学号、座位号、题目标题、分数、页码）
//! 2. 题目-分数关联 → 稠密题号映射
//! 3. 每道题：数字修正 → 分数格式化 → 合理性分类
//! 4. 页面完整性校验
//! 5. 成绩汇总，收集问题列表
//!
//! 流程本身不会失败：任何缺失或异常都变成状态和问题描述。

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::GradingConfig;
use crate::models::{
    AssociationEntry, IdField, PageDetections, PlausibilityStatus, QuestionResult, StudentRecord,
};
use crate::services::{
    aggregate, associate, check_page_completeness, classify_id_field, classify_question,
    extract_group_evidence, format_grade, normalize_digits, PageMarkerParser,
};
use crate::utils::logging::truncate_text;
use crate::workflow::group_ctx::GroupCtx;

/// 学生分组评分流程
///
/// - 只持有只读配置
/// - 不做任何 I/O
pub struct GroupFlow<'a> {
    config: &'a GradingConfig,
    parser: PageMarkerParser,
}

impl<'a> GroupFlow<'a> {
    /// 创建新的分组评分流程
    pub fn new(config: &'a GradingConfig) -> Self {
        Self {
            config,
            parser: PageMarkerParser::from_config(config),
        }
    }

    pub fn run(&self, pages: &[PageDetections], ctx: &GroupCtx) -> StudentRecord {
        let evidence = extract_group_evidence(pages, &self.parser);
        debug!(
            "{} 题目标题 {} 个，分数 {} 个，页码标记 {} 个",
            ctx,
            evidence.slots.len(),
            evidence.grades.len(),
            evidence.page_markers.len()
        );

        let mut issues = Vec::new();

        // ========== 身份字段 ==========
        let matriculation_number = build_id_field(evidence.matriculation_number.as_deref());
        push_id_issue(&mut issues, "Matriculation number", &matriculation_number);
        let seat_number = build_id_field(evidence.seat_number.as_deref());
        push_id_issue(&mut issues, "Seat number", &seat_number);

        // ========== 题目关联与分类 ==========
        let association = associate(&evidence.slots, &evidence.grades);
        let mut questions = BTreeMap::new();
        for (&qnum, entry) in &association.entries {
            let (result, messages) =
                self.evaluate_question(qnum, entry, association.observation_count(qnum));
            issues.extend(messages.iter().map(|m| format!("{}: {}", qnum, m)));
            questions.insert(qnum, result);
        }

        for duplicate in &association.duplicates {
            issues.push(format!(
                "{}: duplicate question header on page {} ignored",
                duplicate.qnum, duplicate.page
            ));
        }
        if association.orphan_grades > 0 {
            issues.push(format!(
                "{} grade mark(s) found before the first question header",
                association.orphan_grades
            ));
        }

        // ========== 页面完整性 ==========
        let page_health = check_page_completeness(&evidence.page_markers, pages.len());
        if !page_health.ok {
            warn!("{} ⚠️ 页面检查: {}", ctx, page_health.message);
            issues.push(format!("Page check: {}", page_health.message));
        }

        // ========== 汇总 ==========
        let summary = aggregate(questions.values(), &self.config.grading_table);
        if let Some(overflow) = &summary.overflow {
            warn!("{} ⚠️ {}", ctx, overflow);
            issues.push(overflow.clone());
        }
        let final_grade = self.config.decimal_separator.apply(&summary.grade);

        debug!(
            "{} 学号 {} | {}/{} ({:.1}%) → {} | 问题 {} 条",
            ctx,
            truncate_text(matriculation_number.normalized.as_deref().unwrap_or("?"), 16),
            summary.achieved_total,
            summary.max_total,
            summary.percentage,
            final_grade,
            issues.len()
        );

        StudentRecord {
            group_index: ctx.group_index,
            pages: pages.iter().map(|p| p.page).collect(),
            matriculation_number,
            seat_number,
            observations: association.observations,
            associations: association.entries,
            questions,
            page_markers: evidence.page_markers,
            page_health,
            achieved_total: summary.achieved_total,
            max_total: summary.max_total,
            percentage: summary.percentage,
            final_grade,
            passed: summary.passed,
            issues,
        }
    }

    /// 单道题：数字修正 → 格式化 → 分类
    ///
    /// 返回结果和该题的问题描述（不带题号前缀）
    fn evaluate_question(
        &self,
        qnum: u32,
        entry: &AssociationEntry,
        observations: usize,
    ) -> (QuestionResult, Vec<String>) {
        let normalization = entry.raw.as_deref().map(normalize_digits);
        let formatted = format_grade(
            normalization.as_ref().map(|n| n.text.as_str()),
            entry.max_marks,
        );
        let max_marks = entry.max_marks.map(f64::from);
        let status = classify_question(formatted.value, max_marks, observations);

        let relative = match (formatted.value, max_marks) {
            (Some(achieved), Some(max)) if max > 0.0 => Some(achieved / max),
            _ => None,
        };
        let achieved_text = self.config.decimal_separator.apply(&formatted.text);

        let mut messages = Vec::new();
        if entry.is_synthetic() {
            messages.push(entry.error.clone().unwrap_or_default());
        }
        match status {
            PlausibilityStatus::NoMatch => messages.push("no grade detected".to_string()),
            PlausibilityStatus::DoubleMatch => {
                messages.push(format!("multiple grades detected ({})", observations))
            }
            PlausibilityStatus::Invalid => messages.push(format!(
                "invalid achieved marks ({}) vs max {}",
                if achieved_text.is_empty() { "none" } else { achieved_text.as_str() },
                entry
                    .max_marks
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "none".to_string())
            )),
            _ => {}
        }

        let result = QuestionResult {
            qnum,
            entry: entry.clone(),
            observations,
            achieved_text,
            achieved: formatted.value,
            normalized: normalization.is_some_and(|n| n.changed),
            status,
            relative,
            error_check: if messages.is_empty() {
                "OK".to_string()
            } else {
                messages.join("; ")
            },
        };
        (result, messages)
    }
}

/// 原始文本 → 数字修正 → 状态
fn build_id_field(raw: Option<&str>) -> IdField {
    let Some(raw) = raw else {
        return IdField {
            status: Some(classify_id_field(None)),
            ..Default::default()
        };
    };
    let normalization = normalize_digits(raw);
    IdField {
        raw: Some(raw.to_string()),
        normalized: Some(normalization.text),
        changed: normalization.changed,
        status: Some(classify_id_field(Some(raw))),
    }
}

fn push_id_issue(issues: &mut Vec<String>, name: &str, field: &IdField) {
    match field.status {
        Some(PlausibilityStatus::Full) | None => {}
        Some(status) => issues.push(format!(
            "{} {}: '{}'",
            name,
            status,
            field.raw.as_deref().unwrap_or_default()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BBox, Candidate, DetectionRecord, Label, MissingCause};

    fn record(label: Label, text: &str, y: f64, page: u32) -> DetectionRecord {
        DetectionRecord::new(
            label,
            vec![Candidate::new(text, 0.9)],
            BBox::new(0.0, y, 200.0, y + 40.0),
            page,
        )
    }

    fn run(pages: &[PageDetections]) -> StudentRecord {
        let config = GradingConfig::default();
        let ctx = GroupCtx::new("test", 1, pages.iter().map(|p| p.page).collect());
        GroupFlow::new(&config).run(pages, &ctx)
    }

    #[test]
    fn complete_student_has_no_issues() {
        let pages = vec![
            PageDetections::new(
                1,
                vec![
                    record(Label::MatriculationNumber, "Matrikelnr: 123456", 10.0, 1),
                    record(Label::SeatNumber, "Platz: 12", 60.0, 1),
                    record(Label::QuestionHeader, "1.Frage Grundlagen (5 Punkte)", 200.0, 1),
                    record(Label::Grade, "45", 400.0, 1),
                    record(Label::PageNumber, "Seite 1 von 2", 1500.0, 1),
                ],
            ),
            PageDetections::new(
                2,
                vec![
                    record(Label::QuestionHeader, "2.Frage SQL (5 Punkte)", 100.0, 2),
                    record(Label::Grade, "5", 300.0, 2),
                    record(Label::PageNumber, "Seite 2 von 2", 1500.0, 2),
                ],
            ),
        ];
        let student = run(&pages);

        assert!(student.issues.is_empty(), "{:?}", student.issues);
        assert_eq!(student.matriculation_number.normalized.as_deref(), Some("123456"));
        assert_eq!(student.questions[&1].achieved_text, "4,5");
        assert_eq!(student.questions[&1].status, PlausibilityStatus::Ok);
        assert_eq!(student.questions[&1].relative, Some(0.9));
        assert_eq!(student.questions[&2].status, PlausibilityStatus::Full);
        assert_eq!(student.achieved_total, 9.5);
        assert_eq!(student.max_total, 10.0);
        assert_eq!(student.final_grade, "1,0");
        assert!(student.passed);
        assert!(student.page_health.ok);
    }

    #[test]
    fn faults_become_issue_lines() {
        let pages = vec![PageDetections::new(
            1,
            vec![
                record(Label::MatriculationNumber, "Matrikelnr: 12B4S", 10.0, 1),
                record(Label::Grade, "1", 100.0, 1),
                record(Label::QuestionHeader, "1.Frage A (4 Punkte)", 200.0, 1),
                record(Label::Grade, "2", 300.0, 1),
                record(Label::Grade, "3", 350.0, 1),
                record(Label::QuestionHeader, "3.Frage C (2 Punkte)", 600.0, 1),
                record(Label::Grade, "x", 700.0, 1),
                record(Label::PageNumber, "Seite 1 von 2", 1500.0, 1),
            ],
        )];
        let student = run(&pages);

        assert_eq!(student.matriculation_number.normalized.as_deref(), Some("12845"));
        assert_eq!(student.matriculation_number.status, Some(PlausibilityStatus::Normalized));
        assert_eq!(student.questions[&1].status, PlausibilityStatus::DoubleMatch);
        assert_eq!(student.questions[&2].status, PlausibilityStatus::NoMatch);
        assert_eq!(student.questions[&3].status, PlausibilityStatus::Invalid);
        assert_eq!(student.page_health.missing_cause, Some(MissingCause::Detector));
        assert_eq!(
            student.issues,
            vec![
                "Matriculation number normalized: '12B4S'".to_string(),
                "Seat number invalid: ''".to_string(),
                "1: multiple grades detected (2)".to_string(),
                "2: not detected".to_string(),
                "2: no grade detected".to_string(),
                "3: invalid achieved marks (x) vs max 2".to_string(),
                "1 grade mark(s) found before the first question header".to_string(),
                "Page check: Detector failed to detect pages: [2]; Group pages (1) < expected total (2)"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn empty_group_still_yields_a_record() {
        let student = run(&[]);
        assert!(student.questions.is_empty());
        assert_eq!(student.percentage, 0.0);
        assert_eq!(student.final_grade, "5,0");
        assert!(!student.passed);
        assert!(student.issues.contains(&"Page check: No page markers found".to_string()));
    }

    #[test]
    fn overflow_is_flagged() {
        let pages = vec![PageDetections::new(
            1,
            vec![
                record(Label::MatriculationNumber, "Matrikelnr: 1", 10.0, 1),
                record(Label::QuestionHeader, "1.Frage A (10 Punkte)", 200.0, 1),
                record(Label::Grade, "10,5", 300.0, 1),
                record(Label::PageNumber, "Seite 1 von 1", 1500.0, 1),
            ],
        )];
        let student = run(&pages);

        assert_eq!(student.questions[&1].status, PlausibilityStatus::Invalid);
        assert_eq!(student.questions[&1].achieved_text, "10,5");
        assert!(student
            .issues
            .contains(&"1: invalid achieved marks (10,5) vs max 10".to_string()));
        assert!(student
            .issues
            .contains(&"Achieved total (10.5) > Max total (10)".to_string()));
    }

    #[test]
    fn misread_page_total_is_ignored() {
        let pages = vec![PageDetections::new(
            1,
            vec![
                record(Label::MatriculationNumber, "Matrikelnr: 123456", 10.0, 1),
                record(Label::PageNumber, "Seite 1 von 2222222222", 1500.0, 1),
            ],
        )];
        let student = run(&pages);

        assert!(student.page_markers.is_empty());
        assert_eq!(student.page_health.expected_total, None);
        assert!(student.issues.contains(&"Page check: No page markers found".to_string()));
    }

    #[test]
    fn blank_matriculation_on_later_page_keeps_identity() {
        let pages = vec![
            PageDetections::new(
                1,
                vec![
                    record(Label::MatriculationNumber, "Matrikelnr: 123456", 10.0, 1),
                    record(Label::PageNumber, "Seite 1 von 2", 1500.0, 1),
                ],
            ),
            PageDetections::new(
                2,
                vec![
                    record(Label::MatriculationNumber, "  ", 10.0, 2),
                    record(Label::PageNumber, "Seite 2 von 2", 1500.0, 2),
                ],
            ),
        ];
        let student = run(&pages);

        assert_eq!(student.matriculation_number.normalized.as_deref(), Some("123456"));
        assert_eq!(student.matriculation_number.status, Some(PlausibilityStatus::Full));
        assert!(!student.issues.iter().any(|i| i.starts_with("Matriculation number")));
    }
}
