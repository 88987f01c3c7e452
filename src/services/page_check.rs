//! 页面完整性校验服务 - 业务能力层

use crate::models::{MissingCause, PageHealth};
use std::collections::BTreeMap;

/// 问题描述中最多列出的页码数量
const MAX_LISTED_PAGES: usize = 20;

/// 出现次数最多的总页数；次数相同时取较小的值
pub fn most_common_total(page_markers: &BTreeMap<u32, u32>) -> Option<u32> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for total in page_markers.values() {
        *counts.entry(*total).or_default() += 1;
    }
    // BTreeMap 按值升序遍历，只有严格更多才替换，因此并列时保留较小的总页数
    let mut best: Option<(u32, usize)> = None;
    for (total, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((total, count));
        }
    }
    best.map(|(total, _)| total)
}

/// 对比印刷页码和分组实际页数，判断页面是否完整
///
/// - `page_markers`: 印刷页码 → 总页数
/// - `physical_pages`: 分组中实际的页面数量
pub fn check_page_completeness(page_markers: &BTreeMap<u32, u32>, physical_pages: usize) -> PageHealth {
    let Some(expected_total) = most_common_total(page_markers) else {
        return PageHealth {
            ok: false,
            message: "No page markers found".to_string(),
            expected_total: None,
            physical_pages,
            missing: Vec::new(),
            extra: Vec::new(),
            missing_cause: None,
        };
    };

    let missing: Vec<u32> = (1..=expected_total)
        .filter(|page| !page_markers.contains_key(page))
        .collect();
    let extra: Vec<u32> = page_markers
        .keys()
        .copied()
        .filter(|page| *page == 0 || *page > expected_total)
        .collect();
    let expected_count = expected_total as usize;

    let mut messages = Vec::new();
    let mut missing_cause = None;

    if !missing.is_empty() {
        if physical_pages == expected_count {
            messages.push(format!("OCR failed to extract page markers for: {}", list_pages(&missing)));
            missing_cause = Some(MissingCause::Recognizer);
        } else {
            messages.push(format!("Detector failed to detect pages: {}", list_pages(&missing)));
            missing_cause = Some(MissingCause::Detector);
        }
    }
    if !extra.is_empty() {
        messages.push(format!("Unexpected printed pages: {}", list_pages(&extra)));
    }
    if physical_pages < expected_count {
        messages.push(format!(
            "Group pages ({}) < expected total ({})",
            physical_pages, expected_total
        ));
    }
    if physical_pages > expected_count {
        messages.push(format!(
            "Group pages ({}) > expected total ({})",
            physical_pages, expected_total
        ));
    }

    let ok = messages.is_empty();
    PageHealth {
        ok,
        message: if ok { "OK".to_string() } else { messages.join("; ") },
        expected_total: Some(expected_total),
        physical_pages,
        missing,
        extra,
        missing_cause,
    }
}

/// `[1, 2, 3]`，超出上限时只列出前面的部分
fn list_pages(pages: &[u32]) -> String {
    if pages.len() <= MAX_LISTED_PAGES {
        return format!("{:?}", pages);
    }
    format!(
        "{:?} (+{} more)",
        &pages[..MAX_LISTED_PAGES],
        pages.len() - MAX_LISTED_PAGES
    )
}
