//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量文档的评分和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建运行日志、加载评分配置、准备输出目录
//! 2. **批量加载**：扫描并加载所有待评分的检测文档（`Vec<ScanDocument>`）
//! 3. **并发控制**：使用 Semaphore 限制并发数量
//! 4. **分批处理**：将文档分批次处理，每批完成后再开始下一批
//! 5. **结果落盘**：每份文档写一个 `<文档名>.result.json`，问题追加到运行日志
//! 6. **全局统计**：汇总所有文档的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个学生的细节
//! - **向下委托**：委托 document_processor 评分单个文档

use crate::config::{load_grading_config, Config, GradingConfig};
use crate::error::{AppError, AppResult, FileError};
use crate::models::{Evaluation, ScanDocument};
use crate::orchestrator::document_processor;
use crate::services::IssueWriter;
use crate::utils::logging::{
    init_log_file, log_batch_complete, log_batch_start, log_documents_loaded, log_startup,
    print_final_stats,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    grading: Arc<GradingConfig>,
    issue_writer: IssueWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(config.max_concurrent_documents);

        let grading = load_grading_config(config.grading_config_file.as_deref())
            .await
            .context("加载评分配置失败")?;

        tokio::fs::create_dir_all(&config.output_folder)
            .await
            .with_context(|| format!("无法创建输出目录: {}", config.output_folder))?;

        let issue_writer = IssueWriter::with_path(&config.output_log_file);

        Ok(Self {
            config,
            grading: Arc::new(grading),
            issue_writer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        // 加载所有待评分的文档
        let all_documents = self.load_documents().await?;

        if all_documents.is_empty() {
            warn!("⚠️ 没有找到待评分的检测文档，程序结束");
            return Ok(ProcessingStats::default());
        }

        let total_documents = all_documents.len();
        log_documents_loaded(total_documents, self.config.max_concurrent_documents);

        // 处理所有文档
        let stats = self.process_all_documents(all_documents).await?;

        // 输出最终统计
        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            stats.students,
            stats.issues,
            &self.config.output_log_file,
        );

        Ok(stats)
    }

    /// 加载文档
    async fn load_documents(&self) -> Result<Vec<ScanDocument>> {
        info!("📁 正在扫描待评分的文档...");
        Ok(crate::models::load_all_documents(&self.config.input_folder).await?)
    }

    /// 处理所有文档
    async fn process_all_documents(&self, all_documents: Vec<ScanDocument>) -> Result<ProcessingStats> {
        let batch_size = self.config.max_concurrent_documents.max(1);
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total_documents = all_documents.len();
        let total_batches = total_documents.div_ceil(batch_size);
        let mut stats = ProcessingStats {
            total: total_documents,
            ..Default::default()
        };

        let mut remaining = all_documents.into_iter();
        for batch_num in 1..=total_batches {
            let batch_start = (batch_num - 1) * batch_size;
            let batch_documents: Vec<ScanDocument> = remaining.by_ref().take(batch_size).collect();
            let batch_end = batch_start + batch_documents.len();

            log_batch_start(batch_num, total_batches, batch_start + 1, batch_end, total_documents);

            // 处理本批
            let batch_result = self
                .process_batch(batch_documents, batch_start, semaphore.clone())
                .await?;

            stats.success += batch_result.success;
            stats.failed += batch_result.failed;
            stats.students += batch_result.students;
            stats.issues += batch_result.issues;

            log_batch_complete(batch_num, batch_result.success, batch_result.success + batch_result.failed);
        }

        Ok(stats)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch_documents: Vec<ScanDocument>,
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut batch_handles = Vec::new();

        // 为本批创建并发任务
        for (idx, document) in batch_documents.into_iter().enumerate() {
            let document_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let grading = self.grading.clone();
            let output_folder = PathBuf::from(&self.config.output_folder);
            let name = document.name.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                match process_document(document, document_index, grading, &output_folder).await {
                    Ok(evaluation) => Ok(evaluation),
                    Err(e) => {
                        error!("[文档 {}] ❌ 处理过程中发生错误: {}", document_index, e);
                        Err(e)
                    }
                }
            });
            batch_handles.push((document_index, name, handle));
        }

        // 等待本批所有任务完成
        let mut result = BatchResult::default();

        for (document_index, name, handle) in batch_handles {
            match handle.await {
                Ok(Ok(evaluation)) => {
                    result.success += 1;
                    result.students += evaluation.students.len();
                    result.issues += evaluation.issues.len();
                    // 问题在这里顺序写入，避免并发任务交错写同一个文件
                    if let Err(e) = self.issue_writer.write(&name, &evaluation.issues) {
                        warn!("[文档 {}] ⚠️ 写入问题日志失败: {}", document_index, e);
                    }
                }
                Ok(Err(_)) => {
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[文档 {}] 任务执行失败: {}", document_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 评分一份文档并写出结果文件
///
/// # 参数
/// - `document`: 检测文档
/// - `document_index`: 文档索引（用于日志）
/// - `grading`: 评分配置
/// - `output_folder`: 结果输出目录
///
/// # 返回
/// 返回该文档的评分结果
pub async fn process_document(
    document: ScanDocument,
    document_index: usize,
    grading: Arc<GradingConfig>,
    output_folder: &Path,
) -> AppResult<Evaluation> {
    info!(
        "[文档 {}] 🚀 开始评分: {} ({} 页)",
        document_index,
        document.name,
        document.pages.len()
    );

    let evaluation =
        document_processor::evaluate_document_concurrent(&document.name, document.pages, grading).await;

    let report = DocumentReport {
        document: &document.name,
        source: document.file_path.as_deref(),
        evaluated_at: chrono::Local::now().to_rfc3339(),
        evaluation: &evaluation,
    };
    let output_path = output_folder.join(format!("{}.result.json", document.name));
    write_report(&output_path, &report).await?;

    let review: usize = evaluation
        .students
        .iter()
        .map(|s| s.questions_needing_review().len())
        .sum();
    info!(
        "[文档 {}] ✓ 完成: {} 个学生，{} 道题需复核，{} 条问题 → {}",
        document_index,
        evaluation.students.len(),
        review,
        evaluation.issues.len(),
        output_path.display()
    );

    Ok(evaluation)
}

async fn write_report(path: &Path, report: &DocumentReport<'_>) -> AppResult<()> {
    let path_str = path.display().to_string();
    let json = serde_json::to_string_pretty(report).map_err(|source| FileError::JsonFailed {
        path: path_str.clone(),
        source,
    })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| AppError::file_write_failed(path_str, e))
}

/// 结果文件内容
#[derive(Debug, Serialize)]
struct DocumentReport<'a> {
    document: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    evaluated_at: String,
    #[serde(flatten)]
    evaluation: &'a Evaluation,
}

/// 处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
    /// 评分的学生总数
    pub students: usize,
    /// 问题总数
    pub issues: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
    students: usize,
    issues: usize,
}
