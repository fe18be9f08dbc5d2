//! 页面模型
//!
//! 描述"编辑中文档"里的一个页面槽位

use serde::{Deserialize, Serialize};
use std::fmt;

/// 页面唯一标识
///
/// 由编辑器内部的单调计数器生成，重排、撤销后也不会被复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageUid(pub u64);

impl fmt::Display for PageUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

/// 页面旋转角度，只可能是 0 / 90 / 180 / 270
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Rotation(u16);

impl Rotation {
    pub const NONE: Rotation = Rotation(0);

    /// 获取角度值
    pub fn degrees(self) -> u16 {
        self.0
    }

    /// 叠加旋转增量（取模 360）
    ///
    /// 增量必须是 90 的倍数，否则返回 `None`
    pub fn rotated_by(self, delta: i32) -> Option<Rotation> {
        if delta % 90 != 0 {
            return None;
        }
        let degrees = (i32::from(self.0) + delta.rem_euclid(360)).rem_euclid(360);
        Some(Rotation(degrees as u16))
    }

    /// 叠加另一个合法角度
    pub fn plus(self, other: Rotation) -> Rotation {
        Rotation((self.0 + other.0) % 360)
    }
}

impl TryFrom<i32> for Rotation {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Rotation::NONE
            .rotated_by(value)
            .ok_or_else(|| format!("旋转角度必须是 90 的倍数: {}", value))
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        i32::from(rotation.0)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// 页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub uid: PageUid,
    /// 页面内容来自哪个文档（原文档或插入的文档）
    pub source_document_id: String,
    /// 在来源文档中的索引（从 0 开始）
    pub source_page_index: usize,
    /// 在可见序列中的位置（从 1 开始），已删除页面为 `None`
    pub display_index: Option<usize>,
    pub rotation: Rotation,
    /// 软删除标记
    pub is_deleted: bool,
    pub selected: bool,
    /// 插入文档的 ID，原文档页面为 `None`
    pub insert_doc_id: Option<String>,
}

impl Page {
    /// 创建原文档中的页面
    pub fn original(uid: PageUid, document_id: &str, source_page_index: usize) -> Self {
        Self {
            uid,
            source_document_id: document_id.to_string(),
            source_page_index,
            display_index: None,
            rotation: Rotation::NONE,
            is_deleted: false,
            selected: false,
            insert_doc_id: None,
        }
    }

    /// 创建来自插入文档的页面
    pub fn inserted(uid: PageUid, insert_doc_id: &str, source_page_index: usize) -> Self {
        Self {
            insert_doc_id: Some(insert_doc_id.to_string()),
            ..Self::original(uid, insert_doc_id, source_page_index)
        }
    }

    /// 是否来自插入的文档
    pub fn is_inserted(&self) -> bool {
        self.insert_doc_id.is_some()
    }

    /// 是否可见（未删除）
    pub fn is_visible(&self) -> bool {
        !self.is_deleted
    }

    /// 复制页面：新的 uid，取消选中，其余保持一致
    pub fn duplicate_as(&self, uid: PageUid) -> Self {
        Self {
            uid,
            selected: false,
            ..self.clone()
        }
    }
}
