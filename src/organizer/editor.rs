//! 页面整理编辑器 - 核心状态机
//!
//! 持有一个文档的完整页面列表（包括软删除的页面）和撤销/重做历史。
//! 所有操作都是同步的内存操作，只有三种拒绝：删除最后的页面、
//! 页码范围无有效页面、旋转角度不是 90 的倍数。找不到 uid 时静默忽略。
//!
//! 状态：
//! - Clean：加载后或保存成功后没有修改
//! - Dirty：至少有一次结构性修改（撤销/重做也保持 Dirty）

use thiserror::Error;
use tracing::debug;

use crate::models::document::RecipeEntry;
use crate::models::page::{Page, PageUid, Rotation};
use crate::organizer::history::History;
use crate::organizer::page_range::PageSelection;

/// 整理操作被拒绝的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrganizeError {
    /// 试图删除全部剩余页面，调用方应改为询问是否删除整个文档
    #[error("不能删除全部页面（剩余 {remaining} 页）")]
    CannotDeleteAllPages { remaining: usize },

    /// 页码范围过滤后为空
    #[error("页码范围 \"{expr}\" 在 1-{total_pages} 内没有有效页面")]
    EmptyPageSelection { expr: String, total_pages: usize },

    /// 旋转角度不是 90 的倍数
    #[error("旋转角度必须是 90 的倍数: {angle}")]
    InvalidRotation { angle: i32 },
}

impl OrganizeError {
    /// 给界面层使用的原因代码
    pub fn reason_code(&self) -> &'static str {
        match self {
            OrganizeError::CannotDeleteAllPages { .. } => "cannot_delete_all_pages",
            OrganizeError::EmptyPageSelection { .. } => "empty_page_selection",
            OrganizeError::InvalidRotation { .. } => "invalid_rotation",
        }
    }
}

/// 操作结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// 状态已改变
    Applied,
    /// 没有可操作的对象（uid 不存在、选择为空、历史为空等）
    Unchanged,
}

impl EditOutcome {
    pub fn is_applied(self) -> bool {
        self == EditOutcome::Applied
    }
}

/// 页面整理编辑器
#[derive(Debug)]
pub struct PageOrganizer {
    document_id: String,
    pages: Vec<Page>,
    history: History,
    next_uid: u64,
    dirty: bool,
    /// 每次页面列表变化都会递增，用于判断保存期间是否有新的修改
    revision: u64,
}

impl PageOrganizer {
    /// 为一个 `total_pages` 页的文档创建编辑器，每页一个条目，按顺序排列
    pub fn new(document_id: impl Into<String>, total_pages: usize) -> Self {
        Self::with_history(document_id, total_pages, History::new())
    }

    /// 创建撤销栈有上限的编辑器，`0` 表示不限制
    pub fn with_history_limit(
        document_id: impl Into<String>,
        total_pages: usize,
        limit: usize,
    ) -> Self {
        Self::with_history(document_id, total_pages, History::with_limit(limit))
    }

    fn with_history(document_id: impl Into<String>, total_pages: usize, history: History) -> Self {
        let mut organizer = Self {
            document_id: document_id.into(),
            pages: Vec::with_capacity(total_pages),
            history,
            next_uid: 0,
            dirty: false,
            revision: 0,
        };
        organizer.fill_original(total_pages);
        organizer
    }

    /// 放弃全部修改，回到刚打开时的页面列表
    ///
    /// 历史清空、回到 Clean；uid 计数继续递增，之前发出的 uid 不会指向新页面
    pub fn reset(&mut self, total_pages: usize) {
        self.history.clear();
        self.fill_original(total_pages);
        self.dirty = false;
        self.revision += 1;
        debug!("重置文档 {} 为 {} 页", self.document_id, total_pages);
    }

    // ========== 只读访问 ==========

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// 完整页面列表（包括已删除的页面）
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// 可见页面，按显示顺序
    pub fn visible_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|p| p.is_visible())
    }

    pub fn visible_count(&self) -> usize {
        self.visible_pages().count()
    }

    /// 选中的可见页面数量
    pub fn selected_count(&self) -> usize {
        self.visible_pages().filter(|p| p.selected).count()
    }

    pub fn page(&self, uid: PageUid) -> Option<&Page> {
        self.pages.iter().find(|p| p.uid == uid)
    }

    /// 根据显示序号（从 1 开始）查找 uid
    pub fn uid_at(&self, display_index: usize) -> Option<PageUid> {
        self.visible_pages()
            .find(|p| p.display_index == Some(display_index))
            .map(|p| p.uid)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ========== 单页操作 ==========

    /// 旋转页面
    pub fn rotate(&mut self, uid: PageUid, angle: i32) -> Result<EditOutcome, OrganizeError> {
        let Some(idx) = self.position(uid) else {
            return Ok(EditOutcome::Unchanged);
        };
        let rotation = self.pages[idx]
            .rotation
            .rotated_by(angle)
            .ok_or(OrganizeError::InvalidRotation { angle })?;

        self.snapshot();
        self.pages[idx].rotation = rotation;
        self.touch();
        debug!("旋转 {} -> {}", uid, rotation);
        Ok(EditOutcome::Applied)
    }

    /// 复制页面，副本紧跟在原页面之后
    ///
    /// 返回副本的 uid，找不到原页面时返回 `None`
    pub fn duplicate(&mut self, uid: PageUid) -> Option<PageUid> {
        let idx = self.position(uid)?;

        self.snapshot();
        let copy_uid = self.next_uid();
        let copy = self.pages[idx].duplicate_as(copy_uid);
        self.pages.insert(idx + 1, copy);
        self.renumber();
        self.touch();
        debug!("复制 {} -> {}", uid, copy_uid);
        Some(copy_uid)
    }

    /// 软删除页面
    ///
    /// 如果这是最后一个可见页面则拒绝，由调用方决定是否删除整个文档
    pub fn delete(&mut self, uid: PageUid) -> Result<EditOutcome, OrganizeError> {
        let Some(idx) = self.position(uid) else {
            return Ok(EditOutcome::Unchanged);
        };
        if self.pages[idx].is_deleted {
            return Ok(EditOutcome::Unchanged);
        }
        let remaining = self.visible_count();
        if remaining <= 1 {
            debug!("拒绝删除最后一页 {}", uid);
            return Err(OrganizeError::CannotDeleteAllPages { remaining });
        }

        self.snapshot();
        self.pages[idx].is_deleted = true;
        self.renumber();
        self.touch();
        debug!("删除 {}", uid);
        Ok(EditOutcome::Applied)
    }

    /// 切换选中状态（不进入历史）
    pub fn toggle_select(&mut self, uid: PageUid) -> EditOutcome {
        match self.pages.iter_mut().find(|p| p.uid == uid) {
            Some(page) => {
                page.selected = !page.selected;
                EditOutcome::Applied
            }
            None => EditOutcome::Unchanged,
        }
    }

    /// 全选 / 全不选可见页面（不进入历史）
    pub fn select_all(&mut self, selected: bool) {
        for page in &mut self.pages {
            page.selected = selected && page.is_visible();
        }
    }

    /// 把 `uid` 移动到 `target` 所在的位置（先移除再插入到目标下标）
    pub fn reorder(&mut self, uid: PageUid, target: PageUid) -> EditOutcome {
        if uid == target {
            return EditOutcome::Unchanged;
        }
        let (Some(from), Some(to)) = (self.position(uid), self.position(target)) else {
            return EditOutcome::Unchanged;
        };

        self.snapshot();
        let page = self.pages.remove(from);
        self.pages.insert(to, page);
        self.renumber();
        self.touch();
        debug!("移动 {} 到下标 {}", uid, to);
        EditOutcome::Applied
    }

    /// 从另一个文档插入页面
    ///
    /// 新页面按选择顺序放在显示位置 `at_display_index`（从 1 开始）上，
    /// 超出范围时追加到末尾。页码范围无效时不做任何修改。
    pub fn insert_pages(
        &mut self,
        at_display_index: usize,
        source_document_id: &str,
        source_total_pages: usize,
        selection: &PageSelection,
    ) -> Result<Vec<PageUid>, OrganizeError> {
        let page_numbers = selection.resolve(source_total_pages)?;

        let at = at_display_index.clamp(1, self.visible_count() + 1);
        let insert_idx = self
            .visible_pages()
            .find(|p| p.display_index == Some(at))
            .and_then(|p| self.position(p.uid))
            .unwrap_or(self.pages.len());

        self.snapshot();
        let mut new_pages = Vec::with_capacity(page_numbers.len());
        for number in page_numbers {
            let uid = self.next_uid();
            new_pages.push(Page::inserted(uid, source_document_id, number - 1));
        }
        let uids: Vec<PageUid> = new_pages.iter().map(|p| p.uid).collect();
        self.pages.splice(insert_idx..insert_idx, new_pages);
        self.renumber();
        self.touch();
        debug!(
            "从文档 {} 插入 {} 页到位置 {}",
            source_document_id,
            uids.len(),
            at
        );
        Ok(uids)
    }

    // ========== 批量操作 ==========

    /// 旋转所有选中的可见页面（一次历史记录）
    pub fn bulk_rotate(&mut self, angle: i32) -> Result<EditOutcome, OrganizeError> {
        let delta = Rotation::try_from(angle).map_err(|_| OrganizeError::InvalidRotation { angle })?;
        if self.selected_count() == 0 {
            return Ok(EditOutcome::Unchanged);
        }

        self.snapshot();
        for page in self.pages.iter_mut().filter(|p| p.selected && p.is_visible()) {
            page.rotation = page.rotation.plus(delta);
        }
        self.touch();
        debug!("批量旋转 {} 度", angle);
        Ok(EditOutcome::Applied)
    }

    /// 删除所有选中的可见页面，并取消它们的选中状态
    ///
    /// 选中了全部可见页面时拒绝，调用方应改为询问是否删除整个文档
    pub fn bulk_delete(&mut self) -> Result<EditOutcome, OrganizeError> {
        let selected = self.selected_count();
        if selected == 0 {
            return Ok(EditOutcome::Unchanged);
        }
        let remaining = self.visible_count();
        if selected >= remaining {
            debug!("拒绝批量删除全部 {} 页", remaining);
            return Err(OrganizeError::CannotDeleteAllPages { remaining });
        }

        self.snapshot();
        for page in self.pages.iter_mut().filter(|p| p.selected && p.is_visible()) {
            page.is_deleted = true;
            page.selected = false;
        }
        self.renumber();
        self.touch();
        debug!("批量删除 {} 页", selected);
        Ok(EditOutcome::Applied)
    }

    /// 复制所有选中的可见页面，每个副本紧跟在原页面之后
    pub fn bulk_duplicate(&mut self) -> Vec<PageUid> {
        if self.selected_count() == 0 {
            return Vec::new();
        }

        self.snapshot();
        let originals = std::mem::take(&mut self.pages);
        let mut pages = Vec::with_capacity(originals.len() * 2);
        let mut copies = Vec::new();
        for page in originals {
            let copy = if page.selected && page.is_visible() {
                Some(page.duplicate_as(self.next_uid()))
            } else {
                None
            };
            pages.push(page);
            if let Some(copy) = copy {
                copies.push(copy.uid);
                pages.push(copy);
            }
        }
        self.pages = pages;
        self.renumber();
        self.touch();
        debug!("批量复制 {} 页", copies.len());
        copies
    }

    // ========== 历史 ==========

    pub fn undo(&mut self) -> EditOutcome {
        match self.history.undo(&self.pages) {
            Some(pages) => {
                self.pages = pages;
                self.renumber();
                self.touch();
                EditOutcome::Applied
            }
            None => EditOutcome::Unchanged,
        }
    }

    pub fn redo(&mut self) -> EditOutcome {
        match self.history.redo(&self.pages) {
            Some(pages) => {
                self.pages = pages;
                self.renumber();
                self.touch();
                EditOutcome::Applied
            }
            None => EditOutcome::Unchanged,
        }
    }

    // ========== 保存 ==========

    /// 生成提交给后端的配方：只包含可见页面，保持当前顺序和旋转
    pub fn compute_recipe(&self) -> Vec<RecipeEntry> {
        self.visible_pages()
            .map(|p| RecipeEntry {
                source_document_id: p.source_document_id.clone(),
                source_page_index: p.source_page_index,
                rotation: p.rotation,
            })
            .collect()
    }

    /// 保存成功后回到 Clean，历史保留以便继续编辑
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    // ========== 内部辅助 ==========

    /// 用原文档的页面（每页一个新 uid）替换当前列表
    fn fill_original(&mut self, total_pages: usize) {
        let mut pages = Vec::with_capacity(total_pages);
        for index in 0..total_pages {
            pages.push(Page::original(self.next_uid(), &self.document_id, index));
        }
        self.pages = pages;
        self.renumber();
    }

    fn position(&self, uid: PageUid) -> Option<usize> {
        self.pages.iter().position(|p| p.uid == uid)
    }

    fn next_uid(&mut self) -> PageUid {
        self.next_uid += 1;
        PageUid(self.next_uid)
    }

    fn snapshot(&mut self) {
        self.history.record(&self.pages);
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    /// 重新计算可见页面的显示序号
    fn renumber(&mut self) {
        let mut next = 1;
        for page in &mut self.pages {
            if page.is_deleted {
                page.display_index = None;
            } else {
                page.display_index = Some(next);
                next += 1;
            }
        }
    }
}
