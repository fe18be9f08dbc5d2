//! 撤销 / 重做历史
//!
//! 每次结构性修改前保存整个页面列表的深拷贝，线性历史，不分叉

use crate::models::page::Page;

/// 某一时刻的完整页面列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub pages: Vec<Page>,
}

/// 撤销 / 重做栈
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<HistorySnapshot>,
    redo_stack: Vec<HistorySnapshot>,
    /// 撤销栈上限，`None` 表示不限制
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建有上限的历史，`0` 表示不限制
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: (limit > 0).then_some(limit),
            ..Self::default()
        }
    }

    /// 在修改前记录当前状态，并清空重做栈
    pub fn record(&mut self, pages: &[Page]) {
        self.undo_stack.push(HistorySnapshot {
            pages: pages.to_vec(),
        });
        self.redo_stack.clear();

        if let Some(limit) = self.limit {
            if self.undo_stack.len() > limit {
                let overflow = self.undo_stack.len() - limit;
                self.undo_stack.drain(..overflow);
            }
        }
    }

    /// 撤销：当前状态压入重做栈，返回上一个快照
    pub fn undo(&mut self, current: &[Page]) -> Option<Vec<Page>> {
        let snapshot = self.undo_stack.pop()?;
        self.redo_stack.push(HistorySnapshot {
            pages: current.to_vec(),
        });
        Some(snapshot.pages)
    }

    /// 重做：当前状态压入撤销栈，返回下一个快照
    pub fn redo(&mut self, current: &[Page]) -> Option<Vec<Page>> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push(HistorySnapshot {
            pages: current.to_vec(),
        });
        Some(snapshot.pages)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
