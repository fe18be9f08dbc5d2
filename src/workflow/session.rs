//! 文档整理会话 - 流程层
//!
//! 核心职责：围绕一个打开的文档编排"编辑 → 保存"的完整流程
//!
//! - 打开文档：获取详情，只允许 PDF 查看器类型，每页一个条目
//! - 保存：同一时间只允许一个保存请求；失败时保留 Dirty 状态和全部历史
//! - 插入：上传来源文档（同一时间只允许一个），多页文档需要确认页码范围
//! - 退出：有未保存修改时需要确认放弃

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{info, warn};

use crate::clients::DocumentBackend;
use crate::error::AppResult;
use crate::models::document::{DocumentDetails, RecipeEntry, UploadedDocument};
use crate::models::page::{PageUid, Rotation};
use crate::models::viewer::ViewerType;
use crate::organizer::{OrganizeError, PageOrganizer, PageSelection};

/// 会话错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 同类请求仍在进行中
    #[error("{operation}请求仍在进行中")]
    RequestInFlight { operation: &'static str },

    /// 文档类型不支持页面整理
    #[error("文档 {document_id} 不支持页面整理 (查看器: {viewer:?})")]
    NotOrganizable {
        document_id: String,
        viewer: ViewerType,
    },

    /// 文档没有页面
    #[error("文档 {document_id} 没有页面")]
    EmptyDocument { document_id: String },
}

/// 退出时的判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    /// 没有未保存的修改，可以直接离开
    Leave,
    /// 有未保存的修改，需要用户确认放弃
    ConfirmDiscard,
}

/// 页面缩略图信息
///
/// 地址或旋转变化时界面应重新渲染
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageThumbnail {
    pub uid: PageUid,
    pub display_index: usize,
    pub url: String,
    pub rotation: Rotation,
}

/// 进行中的保存请求
///
/// 持有保存许可，在 [`DocumentSession::finish_save`] 之前其他保存请求都会被拒绝
#[derive(Debug)]
pub struct PendingSave {
    _permit: OwnedSemaphorePermit,
    document_id: String,
    recipe: Vec<RecipeEntry>,
    revision: u64,
}

impl PendingSave {
    pub fn recipe(&self) -> &[RecipeEntry] {
        &self.recipe
    }

    /// 发送配方到后端
    pub async fn send<B: DocumentBackend>(&self, backend: &B) -> AppResult<UploadedDocument> {
        backend.organize(&self.document_id, &self.recipe).await
    }
}

/// 已上传、等待确认页码的插入请求
#[derive(Debug)]
pub struct PendingInsert {
    _permit: OwnedSemaphorePermit,
    /// 上传后得到的文档 ID
    pub document_id: String,
    pub total_pages: usize,
    /// 插入位置（显示序号，从 1 开始）
    pub at: usize,
}

impl PendingInsert {
    /// 单页文档不需要选择页码
    pub fn is_single_page(&self) -> bool {
        self.total_pages == 1
    }
}

/// 页码选择无效时返回原请求，以便用户修改后重试
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RejectedInsert {
    pub pending: PendingInsert,
    pub error: OrganizeError,
}

/// 文档整理会话
#[derive(Debug)]
pub struct DocumentSession {
    details: DocumentDetails,
    organizer: PageOrganizer,
    commit_gate: Arc<Semaphore>,
    upload_gate: Arc<Semaphore>,
    last_saved: Option<UploadedDocument>,
}

impl DocumentSession {
    /// 打开文档
    pub async fn open<B: DocumentBackend>(
        backend: &B,
        document_id: &str,
        history_limit: usize,
    ) -> AppResult<Self> {
        let details = backend.get_document(document_id).await?;
        let session = Self::from_details(details, history_limit)?;
        info!(
            "📄 打开文档 {} ({}, {} 页, {})",
            session.details.name,
            document_id,
            session.details.total_pages,
            session.details.size_mb()
        );
        Ok(session)
    }

    /// 根据已获取的文档详情创建会话
    pub fn from_details(details: DocumentDetails, history_limit: usize) -> Result<Self, SessionError> {
        let viewer = ViewerType::for_document(&details);
        if !viewer.supports_page_organizing() {
            return Err(SessionError::NotOrganizable {
                document_id: details.id,
                viewer,
            });
        }
        if details.total_pages == 0 {
            return Err(SessionError::EmptyDocument {
                document_id: details.id,
            });
        }

        let organizer =
            PageOrganizer::with_history_limit(&details.id, details.total_pages, history_limit);
        Ok(Self {
            details,
            organizer,
            commit_gate: Arc::new(Semaphore::new(1)),
            upload_gate: Arc::new(Semaphore::new(1)),
            last_saved: None,
        })
    }

    pub fn details(&self) -> &DocumentDetails {
        &self.details
    }

    pub fn organizer(&self) -> &PageOrganizer {
        &self.organizer
    }

    pub fn organizer_mut(&mut self) -> &mut PageOrganizer {
        &mut self.organizer
    }

    pub fn is_dirty(&self) -> bool {
        self.organizer.is_dirty()
    }

    /// 最近一次保存成功后后端返回的新文档
    pub fn last_saved(&self) -> Option<&UploadedDocument> {
        self.last_saved.as_ref()
    }

    /// 是否有保存请求正在进行
    pub fn is_saving(&self) -> bool {
        self.commit_gate.available_permits() == 0
    }

    // ========== 保存 ==========

    /// 开始保存：占用保存许可并固定当前配方
    pub fn begin_save(&self) -> Result<PendingSave, SessionError> {
        let permit = Arc::clone(&self.commit_gate)
            .try_acquire_owned()
            .map_err(|_| SessionError::RequestInFlight { operation: "保存" })?;

        Ok(PendingSave {
            _permit: permit,
            document_id: self.details.id.clone(),
            recipe: self.organizer.compute_recipe(),
            revision: self.organizer.revision(),
        })
    }

    /// 结束保存
    ///
    /// 成功且期间没有新修改时回到 Clean；失败时不改变任何本地状态
    pub fn finish_save(
        &mut self,
        pending: PendingSave,
        result: AppResult<UploadedDocument>,
    ) -> AppResult<UploadedDocument> {
        match result {
            Ok(document) => {
                if self.organizer.revision() == pending.revision {
                    self.organizer.mark_saved();
                } else {
                    info!("保存期间有新的修改，保持未保存状态");
                }
                info!(
                    "✓ 保存成功: {} -> 新文档 {} ({} 页)",
                    self.details.id,
                    document.id,
                    pending.recipe.len()
                );
                self.last_saved = Some(document.clone());
                Ok(document)
            }
            Err(e) => {
                warn!("⚠️ 保存失败 ({}): {}，保留全部修改以便重试", self.details.id, e);
                Err(e)
            }
        }
    }

    /// 保存：开始 → 发送 → 结束
    pub async fn save<B: DocumentBackend>(&mut self, backend: &B) -> AppResult<UploadedDocument> {
        let pending = self.begin_save()?;
        let result = pending.send(backend).await;
        self.finish_save(pending, result)
    }

    // ========== 插入 ==========

    /// 上传来源文档，准备插入到显示位置 `at`
    pub async fn begin_insert<B: DocumentBackend>(
        &self,
        backend: &B,
        file_name: &str,
        bytes: Vec<u8>,
        at: usize,
    ) -> AppResult<PendingInsert> {
        let permit = Arc::clone(&self.upload_gate)
            .try_acquire_owned()
            .map_err(|_| SessionError::RequestInFlight { operation: "上传" })?;

        let uploaded = backend.upload_document(file_name, bytes).await?;
        info!(
            "✓ 上传完成: {} -> {} ({} 页)",
            file_name, uploaded.id, uploaded.total_pages
        );

        Ok(PendingInsert {
            _permit: permit,
            document_id: uploaded.id,
            total_pages: uploaded.total_pages.max(1),
            at,
        })
    }

    /// 确认插入
    ///
    /// 单页文档忽略页码选择直接插入；页码选择无效时原样返回请求
    pub fn confirm_insert(
        &mut self,
        pending: PendingInsert,
        selection: &PageSelection,
    ) -> Result<Vec<PageUid>, RejectedInsert> {
        let all = PageSelection::All;
        let selection = if pending.is_single_page() {
            &all
        } else {
            selection
        };

        match self.organizer.insert_pages(
            pending.at,
            &pending.document_id,
            pending.total_pages,
            selection,
        ) {
            Ok(uids) => {
                info!("✓ 已插入 {} 页", uids.len());
                Ok(uids)
            }
            Err(error) => Err(RejectedInsert { pending, error }),
        }
    }

    // ========== 退出 / 删除 ==========

    pub fn request_exit(&self) -> ExitDecision {
        if self.is_dirty() {
            ExitDecision::ConfirmDiscard
        } else {
            ExitDecision::Leave
        }
    }

    /// 放弃所有未保存的修改，回到刚打开时的状态
    ///
    /// 保存请求进行中时拒绝，不能悄悄丢弃
    pub fn discard(&mut self) -> Result<(), SessionError> {
        if self.is_saving() {
            return Err(SessionError::RequestInFlight { operation: "保存" });
        }
        self.organizer.reset(self.details.total_pages);
        info!("已放弃对文档 {} 的修改", self.details.id);
        Ok(())
    }

    /// 删除整个文档（删除全部页面被拒绝后，用户确认时使用）
    pub async fn delete_whole_document<B: DocumentBackend>(&self, backend: &B) -> AppResult<()> {
        if self.is_saving() {
            return Err(SessionError::RequestInFlight { operation: "保存" }.into());
        }
        backend.delete_document(&self.details.id).await?;
        info!("🗑️ 已删除文档 {}", self.details.id);
        Ok(())
    }

    // ========== 缩略图 ==========

    /// 可见页面的缩略图地址
    pub fn thumbnails<B: DocumentBackend>(&self, backend: &B) -> Vec<PageThumbnail> {
        self.organizer
            .visible_pages()
            .map(|p| PageThumbnail {
                uid: p.uid,
                display_index: p.display_index.unwrap_or_default(),
                url: backend.page_url(&p.source_document_id, p.source_page_index + 1),
                rotation: p.rotation,
            })
            .collect()
    }

    /// 加载单个页面的预览图，页面不存在时返回 `None`
    pub async fn load_thumbnail<B: DocumentBackend>(
        &self,
        backend: &B,
        uid: PageUid,
    ) -> AppResult<Option<Vec<u8>>> {
        let Some(page) = self.organizer.page(uid) else {
            return Ok(None);
        };
        let bytes = backend
            .fetch_page(&page.source_document_id, page.source_page_index + 1)
            .await?;
        Ok(Some(bytes))
    }
}
