//! 合理性分类服务 - 业务能力层
//!
//! 状态只由 (得分, 满分, 观察次数) 决定，没有任何隐藏状态。

use crate::models::PlausibilityStatus;
use regex::Regex;
use std::sync::LazyLock;

/// 浮点比较容差
const EPSILON: f64 = 1e-9;

static LETTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]").expect("字母正则不合法"));

/// 按优先级判定单道题的状态
///
/// 观察次数 0 → no_match；大于 1 → double_match；得分或满分缺失、得分为负或
/// 不是有限数 → invalid；≈0 → zero；≈满分 → full；超过满分 → invalid；其余 → ok。
pub fn classify_question(
    achieved: Option<f64>,
    max_marks: Option<f64>,
    observations: usize,
) -> PlausibilityStatus {
    if observations == 0 {
        return PlausibilityStatus::NoMatch;
    }
    if observations > 1 {
        return PlausibilityStatus::DoubleMatch;
    }
    let (Some(achieved), Some(max_marks)) = (achieved, max_marks) else {
        return PlausibilityStatus::Invalid;
    };
    if !achieved.is_finite() || !max_marks.is_finite() || achieved < 0.0 {
        return PlausibilityStatus::Invalid;
    }
    if achieved.abs() < EPSILON {
        return PlausibilityStatus::Zero;
    }
    if (achieved - max_marks).abs() < EPSILON {
        return PlausibilityStatus::Full;
    }
    if achieved > max_marks {
        return PlausibilityStatus::Invalid;
    }
    PlausibilityStatus::Ok
}

/// 判定学号 / 座位号字段
///
/// 缺失或为空 → invalid；含字母 → normalized（可疑）；纯数字 → full；其余 → invalid。
pub fn classify_id_field(value: Option<&str>) -> PlausibilityStatus {
    let s = match value.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return PlausibilityStatus::Invalid,
    };
    if LETTER_PATTERN.is_match(s) {
        return PlausibilityStatus::Normalized;
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return PlausibilityStatus::Full;
    }
    PlausibilityStatus::Invalid
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlausibilityStatus::*;

    #[test]
    fn observation_count_has_priority() {
        assert_eq!(classify_question(Some(3.0), Some(5.0), 0), NoMatch);
        assert_eq!(classify_question(None, None, 0), NoMatch);
        assert_eq!(classify_question(Some(3.0), Some(5.0), 2), DoubleMatch);
        assert_eq!(classify_question(Some(99.0), Some(5.0), 4), DoubleMatch);
    }

    #[test]
    fn missing_or_negative_values_are_invalid() {
        assert_eq!(classify_question(None, Some(5.0), 1), Invalid);
        assert_eq!(classify_question(Some(2.0), None, 1), Invalid);
        assert_eq!(classify_question(Some(-1.0), Some(5.0), 1), Invalid);
    }

    #[test]
    fn non_finite_values_are_invalid() {
        assert_eq!(classify_question(Some(f64::NAN), Some(5.0), 1), Invalid);
        assert_eq!(classify_question(Some(f64::INFINITY), Some(5.0), 1), Invalid);
        assert_eq!(classify_question(Some(2.0), Some(f64::NAN), 1), Invalid);
    }

    #[test]
    fn range_statuses() {
        assert_eq!(classify_question(Some(0.0), Some(5.0), 1), Zero);
        assert_eq!(classify_question(Some(5.0), Some(5.0), 1), Full);
        assert_eq!(classify_question(Some(5.0 + 1e-12), Some(5.0), 1), Full);
        assert_eq!(classify_question(Some(5.5), Some(5.0), 1), Invalid);
        assert_eq!(classify_question(Some(2.5), Some(5.0), 1), Ok);
    }

    #[test]
    fn zero_wins_over_full_when_max_is_zero() {
        assert_eq!(classify_question(Some(0.0), Some(0.0), 1), Zero);
    }

    #[test]
    fn id_fields() {
        assert_eq!(classify_id_field(None), Invalid);
        assert_eq!(classify_id_field(Some("  ")), Invalid);
        assert_eq!(classify_id_field(Some("12a45")), Normalized);
        assert_eq!(classify_id_field(Some("123456")), Full);
        assert_eq!(classify_id_field(Some("12-45")), Invalid);
    }
}
