//! 页面整理核心
//!
//! - `editor` - 页面列表状态机（旋转、复制、删除、重排、插入、批量操作、撤销/重做）
//! - `history` - 基于完整快照的撤销/重做栈
//! - `page_range` - 插入对话框的页码范围表达式

pub mod editor;
pub mod history;
pub mod page_range;

pub use editor::{EditOutcome, OrganizeError, PageOrganizer};
pub use history::{History, HistorySnapshot};
pub use page_range::{parse_page_range, PageSelection};
