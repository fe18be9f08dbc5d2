//! 编辑计划
//!
//! 以 TOML 描述对一个文档要执行的页面操作序列，页面按当前显示序号（从 1 开始）定位

use serde::{Deserialize, Serialize};

use crate::organizer::PageSelection;

/// 一个文档的编辑计划
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPlan {
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub operations: Vec<PlanOperation>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

impl EditPlan {
    /// 用于日志显示的名称
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.document_id)
    }

    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }
}

/// 单个计划操作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlanOperation {
    Rotate { page: usize, angle: i32 },
    Duplicate { page: usize },
    Delete { page: usize },
    /// 把第 `page` 页拖到第 `to` 页的位置
    Move { page: usize, to: usize },
    /// 切换这些页面的选中状态，同一页出现两次等于没选
    ToggleSelect { pages: Vec<usize> },
    SelectAll {
        #[serde(default = "default_true")]
        selected: bool,
    },
    BulkRotate { angle: i32 },
    BulkDelete,
    BulkDuplicate,
    /// 上传 `file` 并把选中的页面插入到第 `at` 个显示位置
    Insert {
        at: usize,
        file: String,
        #[serde(default)]
        pages: PageSelection,
    },
    Undo,
    Redo,
}

fn default_true() -> bool {
    true
}
