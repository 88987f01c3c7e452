//! 页码标记解析服务 - 业务能力层
//!
//! 从带噪声的印刷页码文本（"Seite 2 von 5"、"Seite2/5"、"Saite 2 vom 5"）中
//! 提取 (当前页, 总页数)。

use crate::config::GradingConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static OF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:von|of)\s*(\d+)").expect("页码正则不合法"));
static SLASH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").expect("页码正则不合法"));
static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("页码正则不合法"));

/// 解析出的印刷页码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMarker {
    pub current: u32,
    pub total: u32,
}

/// 页码标记解析器
#[derive(Debug, Clone)]
pub struct PageMarkerParser {
    words: Vec<String>,
    cutoff: f64,
    prefix_len: usize,
    max_total: u32,
}

impl PageMarkerParser {
    pub fn new(words: Vec<String>, cutoff: f64, prefix_len: usize, max_total: u32) -> Self {
        Self {
            words: words.into_iter().map(|w| w.to_lowercase()).collect(),
            cutoff,
            prefix_len,
            max_total,
        }
    }

    pub fn from_config(config: &GradingConfig) -> Self {
        Self::new(
            config.page_marker_words.clone(),
            config.page_marker_cutoff,
            config.page_marker_prefix_len,
            config.max_printed_total,
        )
    }

    /// 解析页码文本
    ///
    /// 先对前几个字符做模糊匹配确认是页码，再依次尝试
    /// `X von/of Y`、`X/Y`，最后退回到文本中的前两个整数。
    /// 总页数超过上限的标记视为识别错误，返回 `None`。
    pub fn parse(&self, text: &str) -> Option<PageMarker> {
        self.parse_numbers(text)
            .filter(|marker| marker.total <= self.max_total)
    }

    fn parse_numbers(&self, text: &str) -> Option<PageMarker> {
        let s: String = text
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if s.is_empty() {
            return None;
        }

        let prefix: String = s.chars().take(self.prefix_len).collect();
        if !fuzzy_contains(&prefix, &self.words, self.cutoff) {
            return None;
        }

        for pattern in [&*OF_PATTERN, &*SLASH_PATTERN] {
            if let Some(caps) = pattern.captures(&s) {
                if let (Some(current), Some(total)) = (parse_u32(&caps[1]), parse_u32(&caps[2])) {
                    return Some(PageMarker { current, total });
                }
            }
        }

        let mut numbers = NUMBER_PATTERN.find_iter(&s).map(|m| parse_u32(m.as_str()));
        match (numbers.next(), numbers.next()) {
            (Some(Some(current)), Some(Some(total))) => Some(PageMarker { current, total }),
            _ => None,
        }
    }
}

impl Default for PageMarkerParser {
    fn default() -> Self {
        Self::from_config(&GradingConfig::default())
    }
}

/// 使用默认配置解析页码文本
pub fn parse_page_marker(text: &str) -> Option<PageMarker> {
    PageMarkerParser::default().parse(text)
}

/// 页码必须是正整数
fn parse_u32(s: &str) -> Option<u32> {
    s.parse().ok().filter(|n| *n > 0)
}

/// 文本与任一候选词的相似度达到阈值即视为匹配
pub fn fuzzy_contains(text: &str, candidates: &[String], cutoff: f64) -> bool {
    if text.is_empty() {
        return false;
    }
    let text = text.to_lowercase();
    candidates
        .iter()
        .any(|cand| similarity_ratio(&text, &cand.to_lowercase()) >= cutoff)
}

/// 相似度 2·M / (|a| + |b|)，M 为递归最长公共子串匹配到的字符数
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, k) = longest_common_block(a, b);
    if k == 0 {
        return 0;
    }
    k + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + k..], &b[j + k..])
}

/// 最长公共子串 (a 起点, b 起点, 长度)，长度相同时取最靠前的
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let mut curr = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                let len = prev[j] + 1;
                curr[j + 1] = len;
                let start = (i + 1 - len, j + 1 - len);
                if len > best.2 || (len == best.2 && start < (best.0, best.1)) {
                    best = (start.0, start.1, len);
                }
            }
        }
        prev = curr;
    }
    best
}
