//! 业务能力层（Services）
//!
//! 每个模块只描述"我能做什么"，彼此独立，都是纯函数或只写一个文件：
//!
//! - `segmenter` - 按学号把页面切分成学生分组
//! - `page_marker` - 解析印刷页码
//! - `text_normalizer` - OCR 数字修正与分数格式化
//! - `association` - 题目标题与分数的区域关联
//! - `classifier` - 合理性分类
//! - `page_check` - 页面完整性校验
//! - `aggregator` - 成绩汇总与分数表查询
//! - `issue_writer` - 把问题追加到运行日志

pub mod aggregator;
pub mod association;
pub mod classifier;
pub mod issue_writer;
pub mod page_check;
pub mod page_marker;
pub mod segmenter;
pub mod text_normalizer;

pub use aggregator::{aggregate, grade_distribution, GradeSummary};
pub use association::{associate, extract_group_evidence, parse_question_headline, GroupEvidence};
pub use classifier::{classify_id_field, classify_question};
pub use issue_writer::IssueWriter;
pub use page_check::check_page_completeness;
pub use page_marker::{parse_page_marker, PageMarker, PageMarkerParser};
pub use segmenter::split_pages_by_matnum;
pub use text_normalizer::{format_grade, normalize_digits, DigitNormalization, FormattedGrade, NormalizedText};
