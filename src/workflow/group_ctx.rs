//! 学生分组处理上下文
//!
//! 封装"我正在处理哪份文档的第几个学生"这一信息

use std::fmt::Display;

/// 学生分组处理上下文
#[derive(Debug, Clone)]
pub struct GroupCtx {
    /// 文档名
    pub document: String,

    /// 分组在文档中的序号（从1开始）
    pub group_index: usize,

    /// 分组包含的文档页码
    pub pages: Vec<u32>,
}

impl GroupCtx {
    /// 创建新的分组上下文
    pub fn new(document: impl Into<String>, group_index: usize, pages: Vec<u32>) -> Self {
        Self {
            document: document.into(),
            group_index,
            pages,
        }
    }

    fn page_range(&self) -> String {
        match (self.pages.first(), self.pages.last()) {
            (Some(first), Some(last)) if first == last => first.to_string(),
            (Some(first), Some(last)) => format!("{}-{}", first, last),
            _ => "-".to_string(),
        }
    }
}

impl Display for GroupCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文档 {} 学生 {} 页 {}]",
            self.document,
            self.group_index,
            self.page_range()
        )
    }
}
