//! # Exam Grader
//!
//! 把扫描试卷的检测 / 识别结果变成经过校验、可审计的学生成绩记录
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 检测记录、题目关联、学生记录、分数表
//! - `loaders` - 从 JSON / TOML 加载检测文档
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，都是纯函数
//! - `split_pages_by_matnum` - 按学号切分学生
//! - `associate` - 题目标题与分数的区域关联
//! - `normalize_digits` / `format_grade` - OCR 数字修正与分数格式化
//! - `classify_question` / `classify_id_field` - 合理性分类
//! - `check_page_completeness` - 页面完整性校验
//! - `aggregate` - 成绩汇总
//! - `IssueWriter` - 写问题日志能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个学生"的完整评分流程
//! - `GroupCtx` - 上下文封装（文档名 + 学生序号 + 页码）
//! - `GroupFlow` - 流程编排（证据 → 关联 → 分类 → 页面校验 → 汇总）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量文档处理器，管理并发和结果落盘
//! - `orchestrator/document_processor` - 单个文档处理器，切分学生并汇总
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{load_grading_config, Config, GradingConfig};
pub use error::{AppError, AppResult};
pub use models::{
    DecimalSeparator, DetectionRecord, Evaluation, GradeThreshold, GradingTable, PageDetections,
    PlausibilityStatus, ScanDocument, StudentRecord,
};
pub use orchestrator::{evaluate, evaluate_concurrent, App, ProcessingStats};
pub use workflow::{GroupCtx, GroupFlow};
