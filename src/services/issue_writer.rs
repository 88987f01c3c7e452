//! 问题写入服务 - 业务能力层
//!
//! 只负责把问题行追加到运行日志，不关心流程

use crate::error::{AppError, AppResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// 问题写入服务
///
/// 职责：
/// - 将一份文档的问题列表追加到日志文件
/// - 每条问题一行，前面带上文档名
pub struct IssueWriter {
    log_file_path: PathBuf,
}

impl IssueWriter {
    /// 使用默认文件 `grading_log.txt`
    pub fn new() -> Self {
        Self::with_path("grading_log.txt")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    /// 追加问题
    ///
    /// # 参数
    /// - `document`: 文档名
    /// - `issues`: 问题列表
    ///
    /// # 返回
    /// 写入的行数
    pub fn write(&self, document: &str, issues: &[String]) -> AppResult<usize> {
        if issues.is_empty() {
            return Ok(0);
        }
        debug!("写入问题: 文档 {} | 共 {} 条", document, issues.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .map_err(|e| AppError::file_write_failed(self.log_file_path.display().to_string(), e))?;

        let mut lines = String::new();
        for issue in issues {
            lines.push_str(&format!("文档 {} | {}\n", document, issue));
        }
        file.write_all(lines.as_bytes())
            .map_err(|e| AppError::file_write_failed(self.log_file_path.display().to_string(), e))?;

        Ok(issues.len())
    }
}

impl Default for IssueWriter {
    fn default() -> Self {
        Self::new()
    }
}
