//! 分数表与小数分隔符

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 小数分隔符约定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecimalSeparator {
    /// 德语习惯，`4,5`
    #[default]
    Comma,
    /// `4.5`
    Dot,
}

impl DecimalSeparator {
    pub fn as_char(self) -> char {
        match self {
            DecimalSeparator::Comma => ',',
            DecimalSeparator::Dot => '.',
        }
    }

    /// 把规范形式（以 `.` 为分隔符）的数字文本转换为本地形式
    pub fn apply(self, canonical: &str) -> String {
        match self {
            DecimalSeparator::Comma => canonical.replace('.', ","),
            DecimalSeparator::Dot => canonical.to_string(),
        }
    }

    /// 按固定小数位格式化数字
    pub fn format_number(self, value: f64, decimals: usize) -> String {
        self.apply(&format!("{:.*}", decimals, value))
    }
}

/// 分数表中的一行：达到 `min_percentage` 即可获得 `label`
///
/// 反序列化时也可以写成 `[50, "4.0"]`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeThreshold {
    pub min_percentage: f64,
    pub label: String,
}

impl GradeThreshold {
    pub fn new(min_percentage: f64, label: impl Into<String>) -> Self {
        Self {
            min_percentage,
            label: label.into(),
        }
    }
}

/// 百分比 → 成绩 的单调分数表
///
/// 阈值严格递增；最低阈值对应最差成绩。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GradeThreshold>", into = "Vec<GradeThreshold>")]
pub struct GradingTable {
    thresholds: Vec<GradeThreshold>,
}

impl GradingTable {
    /// 校验并创建分数表
    pub fn new(thresholds: Vec<GradeThreshold>) -> AppResult<Self> {
        if thresholds.is_empty() {
            return Err(AppError::invalid_grading_table("分数表为空"));
        }
        if let Some(bad) = thresholds.iter().find(|t| !t.min_percentage.is_finite()) {
            return Err(AppError::invalid_grading_table(format!(
                "阈值 {} 不是有限数",
                bad.min_percentage
            )));
        }
        for pair in thresholds.windows(2) {
            if pair[1].min_percentage <= pair[0].min_percentage {
                return Err(AppError::invalid_grading_table(format!(
                    "阈值必须严格递增: {} 之后出现 {}",
                    pair[0].min_percentage, pair[1].min_percentage
                )));
            }
        }
        Ok(Self { thresholds })
    }

    /// 德国大学常用的 1,0 – 5,0 分数表
    pub fn german() -> Self {
        let thresholds = [
            (0.0, "5.0"),
            (50.0, "4.0"),
            (55.0, "3.7"),
            (60.0, "3.3"),
            (65.0, "3.0"),
            (70.0, "2.7"),
            (75.0, "2.3"),
            (80.0, "2.0"),
            (85.0, "1.7"),
            (90.0, "1.3"),
            (95.0, "1.0"),
        ]
        .into_iter()
        .map(|(pct, label)| GradeThreshold::new(pct, label))
        .collect();
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &[GradeThreshold] {
        &self.thresholds
    }

    /// 查找百分比对应的成绩
    ///
    /// 返回不超过百分比的最高阈值的成绩（边界包含）；低于所有阈值时返回最差成绩。
    pub fn lookup(&self, percentage: f64) -> &str {
        self.thresholds
            .iter()
            .filter(|t| percentage >= t.min_percentage)
            .last()
            .map(|t| t.label.as_str())
            .unwrap_or_else(|| self.worst())
    }

    /// 最差成绩（最低阈值对应的成绩）
    pub fn worst(&self) -> &str {
        self.thresholds
            .first()
            .map(|t| t.label.as_str())
            .unwrap_or_default()
    }
}

impl Default for GradingTable {
    fn default() -> Self {
        Self::german()
    }
}

impl TryFrom<Vec<GradeThreshold>> for GradingTable {
    type Error = AppError;

    fn try_from(thresholds: Vec<GradeThreshold>) -> AppResult<Self> {
        Self::new(thresholds)
    }
}

impl From<GradingTable> for Vec<GradeThreshold> {
    fn from(table: GradingTable) -> Self {
        table.thresholds
    }
}
