//! 学生分组服务 - 业务能力层
//!
//! 按学号检测把文档的页面序列切分为每个学生的连续页面组。

use crate::models::PageDetections;

/// 按学号切分页面
///
/// 含有非空学号检测的页面开启一个新分组，之后的页面归入该组，直到下一个学号页。
/// 第一个学号页之前的页面单独成为开头的一组。
/// 整份文档都没有学号时，所有页面作为一组返回（空文档也返回一个空组）。
pub fn split_pages_by_matnum(pages: &[PageDetections]) -> Vec<&[PageDetections]> {
    if !pages.iter().any(PageDetections::has_matriculation_number) {
        return vec![pages];
    }

    let mut groups = Vec::new();
    let mut start = 0;

    for (index, page) in pages.iter().enumerate() {
        if page.has_matriculation_number() && index > start {
            groups.push(&pages[start..index]);
            start = index;
        }
    }
    if start < pages.len() {
        groups.push(&pages[start..]);
    }

    groups
}
