//! 单个文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责一份扫描文档的评分，是文档级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **学生切分**：按学号把页面切分为学生分组
//! 2. **流程调度**：每个分组交给 `GroupFlow`
//! 3. **结果汇总**：扁平化问题列表，统计成绩分布
//!
//! 每个分组恰好产生一条 `StudentRecord`，顺序与分组顺序一致；
//! 并发任务失败的分组得到一条带失败说明的占位记录。

use crate::config::GradingConfig;
use crate::models::{Evaluation, IdField, PageDetections, StudentRecord};
use crate::services::{check_page_completeness, grade_distribution, split_pages_by_matnum};
use crate::workflow::{GroupCtx, GroupFlow};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

/// 未命名文档在日志中的名称
const UNNAMED_DOCUMENT: &str = "-";

/// 评分入口：页面序列 → 学生记录 + 扁平问题列表
pub fn evaluate(pages: &[PageDetections], config: &GradingConfig) -> Evaluation {
    evaluate_document(UNNAMED_DOCUMENT, pages, config)
}

/// 带文档名的评分（文档名只用于日志）
pub fn evaluate_document(document: &str, pages: &[PageDetections], config: &GradingConfig) -> Evaluation {
    let groups = split_pages_by_matnum(pages);
    debug!("[文档 {}] 共 {} 页，切分为 {} 个学生", document, pages.len(), groups.len());

    let flow = GroupFlow::new(config);
    let students = groups
        .iter()
        .enumerate()
        .map(|(index, group)| flow.run(group, &group_ctx(document, index, group)))
        .collect();

    finish(students)
}

/// 并发评分：每个学生分组在独立的阻塞任务中处理
///
/// 结果顺序与分组顺序一致，内容与 [`evaluate`] 相同。
pub async fn evaluate_concurrent(pages: Vec<PageDetections>, config: Arc<GradingConfig>) -> Evaluation {
    evaluate_document_concurrent(UNNAMED_DOCUMENT, pages, config).await
}

/// 带文档名的并发评分
pub async fn evaluate_document_concurrent(
    document: &str,
    pages: Vec<PageDetections>,
    config: Arc<GradingConfig>,
) -> Evaluation {
    let groups: Vec<Vec<PageDetections>> = split_pages_by_matnum(&pages)
        .into_iter()
        .map(<[PageDetections]>::to_vec)
        .collect();
    debug!("[文档 {}] 并发评分 {} 个学生", document, groups.len());

    let mut handles = Vec::with_capacity(groups.len());
    for (index, group) in groups.iter().enumerate() {
        let ctx = group_ctx(document, index, group);
        let group = group.clone();
        let config = config.clone();
        let handle = tokio::task::spawn_blocking(move || GroupFlow::new(&config).run(&group, &ctx));
        handles.push(handle);
    }

    let mut students = Vec::with_capacity(handles.len());
    for (index, joined) in join_all(handles).await.into_iter().enumerate() {
        match joined {
            Ok(student) => students.push(student),
            Err(e) => {
                error!("[文档 {}] [学生 {}] 任务执行失败: {}", document, index + 1, e);
                let ctx = group_ctx(document, index, &groups[index]);
                students.push(failed_record(&ctx, &config, &e.to_string()));
            }
        }
    }

    finish(students)
}

fn group_ctx(document: &str, index: usize, group: &[PageDetections]) -> GroupCtx {
    GroupCtx::new(document, index + 1, group.iter().map(|p| p.page).collect())
}

/// 任务失败时的占位记录：没有题目，成绩为最差档，并带一条失败说明
fn failed_record(ctx: &GroupCtx, config: &GradingConfig, reason: &str) -> StudentRecord {
    StudentRecord {
        group_index: ctx.group_index,
        pages: ctx.pages.clone(),
        matriculation_number: IdField::default(),
        seat_number: IdField::default(),
        associations: BTreeMap::new(),
        observations: BTreeMap::new(),
        questions: BTreeMap::new(),
        page_markers: BTreeMap::new(),
        page_health: check_page_completeness(&BTreeMap::new(), ctx.pages.len()),
        achieved_total: 0.0,
        max_total: 0.0,
        percentage: 0.0,
        final_grade: config.decimal_separator.apply(config.grading_table.worst()),
        passed: false,
        issues: vec![format!("Evaluation failed: {}", reason)],
    }
}

fn finish(students: Vec<StudentRecord>) -> Evaluation {
    let issues = students
        .iter()
        .flat_map(|student| {
            let prefix = format!("Student {} ({}): ", student.group_index, student.display_id());
            student.issues.iter().map(move |issue| format!("{}{}", prefix, issue))
        })
        .collect();
    let grade_distribution = grade_distribution(&students);

    Evaluation {
        students,
        issues,
        grade_distribution,
    }
}
