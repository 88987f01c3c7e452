//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文档处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载检测文档（Vec<ScanDocument>）
//! - 控制并发数量（Semaphore）
//! - 写出结果文件和问题日志
//! - 输出全局统计信息
//!
//! ### `document_processor` - 单个文档处理器
//! - 按学号切分学生分组
//! - 每个分组交给 GroupFlow
//! - 扁平化问题列表，统计成绩分布
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<ScanDocument>)
//!     ↓
//! document_processor (处理 Vec<PageDetections>)
//!     ↓
//! workflow::GroupFlow (处理单个学生)
//!     ↓
//! services (能力层：关联 / 规范化 / 分类 / 校验 / 汇总)
//! ```

pub mod batch_processor;
pub mod document_processor;

// 重新导出主要类型
pub use batch_processor::{process_document, App, ProcessingStats};
pub use document_processor::{
    evaluate, evaluate_concurrent, evaluate_document, evaluate_document_concurrent,
};
