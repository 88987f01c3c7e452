//! 文本规范化服务 - 业务能力层
//!
//! 两个互相独立、永不失败的变换：
//! - 数字修正：把 OCR 常见的形近字符替换为数字
//! - 分数格式化：根据满分大小决定小数点位置

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// OCR 形近字符 → 数字
static OCR_DIGIT_MAP: phf::Map<char, char> = phf_map! {
    'H' => '4', 'h' => '4',
    'O' => '0', 'o' => '0', 'Q' => '0',
    'l' => '1', 'I' => '1', '|' => '1', 'ß' => '1',
    'Z' => '2',
    'E' => '3',
    'A' => '4',
    'S' => '5', '$' => '5',
    'G' => '6',
    'T' => '7',
    'B' => '8',
    'g' => '9', 'q' => '9',
};

/// 数字修正后的值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedText {
    /// 替换后全部是数字
    Integer(u64),
    /// 仍包含非数字字符
    Text(String),
}

impl NormalizedText {
    /// 转换回文本（整数不保留前导零）
    pub fn as_text(&self) -> String {
        match self {
            NormalizedText::Integer(n) => n.to_string(),
            NormalizedText::Text(s) => s.clone(),
        }
    }
}

/// 数字修正结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitNormalization {
    /// 替换后的完整文本（保留前导零）
    pub text: String,
    pub value: NormalizedText,
    /// 是否发生过替换
    pub changed: bool,
}

/// 把 OCR 形近字符逐个替换为数字
///
/// 替换后全部是 ASCII 数字时返回整数，否则返回字符串。
pub fn normalize_digits(text: &str) -> DigitNormalization {
    let normalized: String = text
        .chars()
        .map(|ch| OCR_DIGIT_MAP.get(&ch).copied().unwrap_or(ch))
        .collect();
    let changed = normalized != text;

    let value = if !normalized.is_empty() && normalized.chars().all(|c| c.is_ascii_digit()) {
        match normalized.parse::<u64>() {
            Ok(n) => NormalizedText::Integer(n),
            Err(_) => NormalizedText::Text(normalized.clone()),
        }
    } else {
        NormalizedText::Text(normalized.clone())
    };

    DigitNormalization {
        text: normalized,
        value,
        changed,
    }
}

/// 格式化后的分数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedGrade {
    /// 规范形式（以 `.` 为小数分隔符）
    pub text: String,
    /// 无法解释时为空，下游会归类为 invalid
    pub value: Option<f64>,
}

impl FormattedGrade {
    fn new(text: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            text: text.into(),
            value,
        }
    }

    fn empty() -> Self {
        Self::new("", None)
    }
}

/// 根据满分格式化分数文本
///
/// - 满分 > 9：只把 `,` 换成 `.`，原样保留（`"12"` → `"12"`）；
///   纯数字却超过满分时按隐含小数点处理（满分 10 时 `"45"` → `"4.5"`）
/// - 满分 ≤ 9 或未知：
///   - 已有分隔符：保留一位小数（`"3,5"` → `"3.5"`）
///   - 单个数字：`"3"` → `"3.0"`
///   - 多位数字：第一位之后隐含小数点（`"45"` → `"4.5"`，`"125"` → `"1.25"`）
pub fn format_grade(text: Option<&str>, max_marks: Option<u32>) -> FormattedGrade {
    let Some(text) = text else {
        return FormattedGrade::empty();
    };
    let s = text.trim();
    if s.is_empty() {
        return FormattedGrade::empty();
    }
    let s = s.replace(',', ".");

    if let Some(max) = max_marks.filter(|m| *m > 9) {
        let value = parse_finite(&s);
        // 纯数字且超过满分时，多半是漏掉了小数点
        if matches!(value, Some(v) if v > f64::from(max)) && is_digit_run(&s) && s.len() > 1 {
            return implied_decimal(&s);
        }
        return FormattedGrade::new(s, value);
    }

    if s.contains('.') {
        return match parse_finite(&s) {
            Some(val) => FormattedGrade::new(format!("{:.1}", val), Some(val)),
            None => FormattedGrade::new(s, None),
        };
    }

    if is_digit_run(&s) {
        if s.len() == 1 {
            let value = parse_finite(&s);
            return FormattedGrade::new(format!("{}.0", s), value);
        }
        return implied_decimal(&s);
    }

    match parse_finite(&s) {
        Some(val) => FormattedGrade::new(format!("{:.1}", val), Some(val)),
        None => FormattedGrade::new(s, None),
    }
}

/// 多位纯数字：第一位之后插入小数点，其余位数决定保留几位小数
fn implied_decimal(s: &str) -> FormattedGrade {
    let (first, rest) = s.split_at(1);
    let implied = format!("{}.{}", first, rest);
    match parse_finite(&implied) {
        Some(val) if rest.len() == 1 => FormattedGrade::new(format!("{:.1}", val), Some(val)),
        Some(val) => FormattedGrade::new(format!("{:.2}", val), Some(round2(val))),
        None => FormattedGrade::new(s, None),
    }
}

fn is_digit_run(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}
