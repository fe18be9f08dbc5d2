//! 页码范围表达式
//!
//! 语法：逗号分隔的若干项，每项是单个页码 `N` 或闭区间 `A-B`。
//! 两侧空白会被去掉；格式不对的项直接忽略；超出 `[1, total_pages]` 的页码被丢弃。

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::organizer::OrganizeError;

/// 插入对话框里的两种选择
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageSelection {
    /// 插入全部页面
    #[default]
    All,
    /// 按页码范围表达式插入
    Range(String),
}

impl From<String> for PageSelection {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("all") {
            PageSelection::All
        } else {
            PageSelection::Range(value)
        }
    }
}

impl From<PageSelection> for String {
    fn from(selection: PageSelection) -> Self {
        match selection {
            PageSelection::All => "all".to_string(),
            PageSelection::Range(expr) => expr,
        }
    }
}

impl PageSelection {
    /// 解析为页码列表（从 1 开始）
    pub fn resolve(&self, total_pages: usize) -> Result<Vec<usize>, OrganizeError> {
        match self {
            PageSelection::All if total_pages > 0 => Ok((1..=total_pages).collect()),
            PageSelection::All => Err(OrganizeError::EmptyPageSelection {
                expr: "all".to_string(),
                total_pages,
            }),
            PageSelection::Range(expr) => parse_page_range(expr, total_pages),
        }
    }
}

fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"^(\d+)(?:-(\d+))?$").expect("页码正则无效"))
}

/// 解析页码范围表达式
///
/// 返回按输入顺序排列的页码（允许重复）；结果为空时返回
/// [`OrganizeError::EmptyPageSelection`]
pub fn parse_page_range(expr: &str, total_pages: usize) -> Result<Vec<usize>, OrganizeError> {
    let mut pages = Vec::new();

    for token in expr.split(',').map(str::trim) {
        let Some(caps) = token_pattern().captures(token) else {
            continue;
        };
        // 数字过大无法解析时整项忽略
        let Ok(start) = caps[1].parse::<usize>() else {
            continue;
        };
        let end = match caps.get(2) {
            Some(m) => match m.as_str().parse::<usize>() {
                Ok(end) => end,
                Err(_) => continue,
            },
            None => start,
        };

        let lo = start.max(1);
        let hi = end.min(total_pages);
        if lo <= hi {
            pages.extend(lo..=hi);
        }
    }

    if pages.is_empty() {
        return Err(OrganizeError::EmptyPageSelection {
            expr: expr.to_string(),
            total_pages,
        });
    }

    Ok(pages)
}
