//! 程序配置
//!
//! - `Config`：进程级配置，来自环境变量
//! - `GradingConfig`：注入评分引擎的只读配置，可从 TOML 加载

use crate::error::{AppError, AppResult, FileError};
use crate::models::{DecimalSeparator, GradingTable};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 检测结果文档所在目录
    pub input_folder: String,
    /// 评分结果输出目录
    pub output_folder: String,
    /// 同时处理的文档数量
    pub max_concurrent_documents: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 评分配置文件（TOML），为空时使用默认配置
    pub grading_config_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_folder: "detections".to_string(),
            output_folder: "processed_results".to_string(),
            max_concurrent_documents: 8,
            verbose_logging: false,
            output_log_file: "grading_log.txt".to_string(),
            grading_config_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            input_folder: std::env::var("INPUT_FOLDER").unwrap_or(default.input_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            max_concurrent_documents: std::env::var("MAX_CONCURRENT_DOCUMENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default.max_concurrent_documents),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            grading_config_file: std::env::var("GRADING_CONFIG_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or(default.grading_config_file),
        }
    }
}

/// 评分配置
///
/// 在一次运行中只读，并发处理学生分组时通过 `Arc` 共享。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    /// 百分比 → 成绩
    pub grading_table: GradingTable,
    /// 输出时使用的小数分隔符
    pub decimal_separator: DecimalSeparator,
    /// 页码文本开头的标记词
    pub page_marker_words: Vec<String>,
    /// 标记词模糊匹配的相似度阈值
    pub page_marker_cutoff: f64,
    /// 参与模糊匹配的前缀长度
    pub page_marker_prefix_len: usize,
    /// 可信的最大印刷总页数，超过时该页码标记视为无法解析
    pub max_printed_total: u32,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            grading_table: GradingTable::german(),
            decimal_separator: DecimalSeparator::Comma,
            page_marker_words: vec!["seite".to_string(), "page".to_string()],
            page_marker_cutoff: 0.3,
            page_marker_prefix_len: 8,
            max_printed_total: 200,
        }
    }
}

impl GradingConfig {
    /// 从 TOML 文本解析，缺省项使用默认值
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, path: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content).map_err(|source| FileError::TomlParseFailed {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if !(0.0..=1.0).contains(&self.page_marker_cutoff) {
            return Err(crate::error::ConfigError::InvalidValue {
                field: "page_marker_cutoff".to_string(),
                value: self.page_marker_cutoff.to_string(),
            }
            .into());
        }
        if self.page_marker_prefix_len == 0 {
            return Err(crate::error::ConfigError::InvalidValue {
                field: "page_marker_prefix_len".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.max_printed_total == 0 {
            return Err(crate::error::ConfigError::InvalidValue {
                field: "max_printed_total".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// 加载评分配置
///
/// # 参数
/// - `path`: TOML 文件路径；为 `None` 时返回默认配置
pub async fn load_grading_config(path: Option<&str>) -> AppResult<GradingConfig> {
    let Some(path) = path else {
        info!("📐 使用默认评分配置");
        return Ok(GradingConfig::default());
    };

    let content = tokio::fs::read_to_string(Path::new(path))
        .await
        .map_err(|e| AppError::file_read_failed(path, e))?;
    let config = GradingConfig::parse(&content, path)?;
    info!(
        "📐 已加载评分配置: {} ({} 档成绩)",
        path,
        config.grading_table.thresholds().len()
    );
    Ok(config)
}
