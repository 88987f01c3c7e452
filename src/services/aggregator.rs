//! 成绩汇总服务 - 业务能力层
//!
//! 汇总得分和满分，计算百分比，并通过分数表得到最终成绩。

use crate::models::{GradeCount, GradingTable, QuestionResult, StudentRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// 超分判定容差
const OVERFLOW_TOLERANCE: f64 = 1e-6;

/// 一个学生的汇总结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeSummary {
    pub achieved_total: f64,
    pub max_total: f64,
    pub percentage: f64,
    /// 分数表中的成绩标签（未转换小数分隔符）
    pub grade: String,
    pub passed: bool,
    /// 得分总和超过满分总和时的问题描述
    pub overflow: Option<String>,
}

/// 汇总一组题目结果
///
/// 缺失的满分和得分按 0 计算；满分总和为 0 时百分比为 0。
pub fn aggregate<'a, I>(questions: I, table: &GradingTable) -> GradeSummary
where
    I: IntoIterator<Item = &'a QuestionResult>,
{
    let mut achieved_total = 0.0;
    let mut max_total = 0.0;
    for question in questions {
        max_total += question.entry.max_marks.map(f64::from).unwrap_or(0.0);
        achieved_total += question.achieved.filter(|v| v.is_finite()).unwrap_or(0.0);
    }

    let overflow = (achieved_total > max_total + OVERFLOW_TOLERANCE)
        .then(|| format!("Achieved total ({}) > Max total ({})", achieved_total, max_total));

    let percentage = if max_total > 0.0 {
        achieved_total / max_total * 100.0
    } else {
        0.0
    };

    let grade = table.lookup(percentage).to_string();
    let passed = grade != table.worst();

    GradeSummary {
        achieved_total,
        max_total,
        percentage,
        grade,
        passed,
        overflow,
    }
}

/// 统计每个最终成绩的人数，按成绩数值升序排列
pub fn grade_distribution(students: &[StudentRecord]) -> Vec<GradeCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for student in students {
        *counts.entry(student.final_grade.as_str()).or_default() += 1;
    }

    let mut distribution: Vec<GradeCount> = counts
        .into_iter()
        .map(|(grade, count)| GradeCount {
            grade: grade.to_string(),
            count,
        })
        .collect();
    distribution.sort_by(|a, b| compare_grade_labels(&a.grade, &b.grade));
    distribution
}

/// 能解析为数字的成绩按数值比较并排在前面，其余按文本比较
fn compare_grade_labels(a: &str, b: &str) -> Ordering {
    let parse = |s: &str| s.replace(',', ".").parse::<f64>().ok();
    match (parse(a), parse(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssociationEntry, PlausibilityStatus};

    fn question(qnum: u32, achieved: Option<f64>, max_marks: Option<u32>) -> QuestionResult {
        QuestionResult {
            qnum,
            entry: AssociationEntry {
                max_marks,
                ..Default::default()
            },
            observations: 1,
            achieved_text: String::new(),
            achieved,
            normalized: false,
            status: PlausibilityStatus::Ok,
            relative: None,
            error_check: "OK".to_string(),
        }
    }

    #[test]
    fn sums_with_missing_values_as_zero() {
        let questions = vec![
            question(1, Some(4.5), Some(5)),
            question(2, None, Some(5)),
            question(3, Some(2.0), None),
        ];
        let summary = aggregate(&questions, &GradingTable::german());

        assert_eq!(summary.achieved_total, 6.5);
        assert_eq!(summary.max_total, 10.0);
        assert!((summary.percentage - 65.0).abs() < 1e-9);
        assert_eq!(summary.grade, "3.0");
        assert!(summary.passed);
        assert!(summary.overflow.is_none());
    }

    #[test]
    fn zero_max_total_gives_zero_percentage() {
        let summary = aggregate(&[question(1, None, None)], &GradingTable::german());
        assert_eq!(summary.percentage, 0.0);
        assert_eq!(summary.grade, "5.0");
        assert!(!summary.passed);
    }

    #[test]
    fn overflow_is_reported_with_both_totals() {
        let questions = vec![question(1, Some(7.0), Some(5)), question(2, Some(4.0), Some(5))];
        let summary = aggregate(&questions, &GradingTable::german());

        let overflow = summary.overflow.expect("应当报告超分");
        assert!(overflow.contains("11"));
        assert!(overflow.contains("10"));
    }

    #[test]
    fn tiny_excess_within_tolerance_is_not_overflow() {
        let questions = vec![question(1, Some(5.0 + 1e-9), Some(5))];
        assert!(aggregate(&questions, &GradingTable::german()).overflow.is_none());
    }

    #[test]
    fn distribution_is_ordered_by_grade_value() {
        let student = |grade: &str| StudentRecord {
            group_index: 1,
            pages: vec![],
            matriculation_number: Default::default(),
            seat_number: Default::default(),
            associations: Default::default(),
            observations: Default::default(),
            questions: Default::default(),
            page_markers: Default::default(),
            page_health: crate::services::page_check::check_page_completeness(&BTreeMap::new(), 0),
            achieved_total: 0.0,
            max_total: 0.0,
            percentage: 0.0,
            final_grade: grade.to_string(),
            passed: true,
            issues: vec![],
        };
        let students = vec![student("5,0"), student("1,3"), student("10,0"), student("1,3")];
        let distribution = grade_distribution(&students);

        let grades: Vec<(&str, usize)> = distribution
            .iter()
            .map(|g| (g.grade.as_str(), g.count))
            .collect();
        assert_eq!(grades, vec![("1,3", 2), ("5,0", 1), ("10,0", 1)]);
    }
}
