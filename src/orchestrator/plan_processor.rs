//! 单个编辑计划处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责把一个编辑计划应用到一个文档上，是计划级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **打开文档**：创建 `DocumentSession`
//! 2. **逐项执行**：按显示序号定位页面，执行计划中的每个操作
//! 3. **拒绝不中断**：被拒绝的操作只记录警告，继续后续操作
//! 4. **提交**：有修改时保存一次；保存失败时计划文件保留以便重试
//! 5. **文件标记**：成功后把计划文件重命名为 `.done`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::clients::{read_upload_file, DocumentBackend};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::loaders::mark_plan_done;
use crate::models::plan::{EditPlan, PlanOperation};
use crate::workflow::DocumentSession;

/// 操作统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlanStats {
    /// 改变了页面列表的操作
    pub applied: usize,
    /// 没有可操作对象的操作
    pub unchanged: usize,
    /// 被拒绝的操作（校验错误）
    pub refused: usize,
    /// 后端调用失败的操作
    pub failed: usize,
    /// 保存后得到的新文档 ID
    pub saved_document_id: Option<String>,
}

/// 处理单个编辑计划
///
/// # 参数
/// - `backend`: 文档后端
/// - `plan`: 编辑计划
/// - `plan_index`: 计划索引（用于日志）
/// - `config`: 配置
///
/// # 返回
/// 返回操作统计
pub async fn process_plan<B: DocumentBackend>(
    backend: &B,
    plan: EditPlan,
    plan_index: usize,
    config: &Config,
) -> Result<PlanStats> {
    log_plan_start(plan_index, &plan);

    let mut session = DocumentSession::open(backend, &plan.document_id, config.history_limit)
        .await
        .with_context(|| format!("无法打开文档: {}", plan.document_id))?;

    let base_dir = plan
        .file_path
        .as_deref()
        .and_then(|p| Path::new(p).parent())
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut stats = PlanStats::default();
    let total = plan.operations.len();

    for (index, operation) in plan.operations.iter().enumerate() {
        debug!(
            "[计划 {}] 操作 {}/{}: {:?}",
            plan_index,
            index + 1,
            total,
            operation
        );

        match apply_operation(backend, &mut session, operation, &base_dir).await {
            Ok(true) => stats.applied += 1,
            Ok(false) => {
                debug!("[计划 {}] 操作 {} 没有可操作的页面", plan_index, index + 1);
                stats.unchanged += 1;
            }
            Err(e) if e.is_validation() => {
                warn!("[计划 {}] ⚠️ 操作 {} 被拒绝: {}", plan_index, index + 1, e);
                stats.refused += 1;
            }
            Err(e) => {
                warn!("[计划 {}] ⚠️ 操作 {} 失败: {}", plan_index, index + 1, e);
                stats.failed += 1;
            }
        }
    }

    if session.is_dirty() {
        info!("[计划 {}] 📤 正在保存...", plan_index);
        let saved = session
            .save(backend)
            .await
            .with_context(|| format!("保存文档失败: {}", plan.document_id))?;
        stats.saved_document_id = Some(saved.id);
    } else {
        info!("[计划 {}] 没有修改，跳过保存", plan_index);
    }

    if let Some(file_path) = plan.file_path.as_deref() {
        let target = mark_plan_done(file_path).await?;
        info!("[计划 {}] ✓ 计划文件已标记: {}", plan_index, target.display());
    }

    log_plan_complete(plan_index, &stats, total);
    Ok(stats)
}

/// 执行单个操作
///
/// 返回是否改变了页面列表
pub async fn apply_operation<B: DocumentBackend>(
    backend: &B,
    session: &mut DocumentSession,
    operation: &PlanOperation,
    base_dir: &Path,
) -> AppResult<bool> {
    match operation {
        PlanOperation::Rotate { page, angle } => {
            let editor = session.organizer_mut();
            match editor.uid_at(*page) {
                Some(uid) => Ok(editor.rotate(uid, *angle)?.is_applied()),
                None => Ok(false),
            }
        }
        PlanOperation::Duplicate { page } => {
            let editor = session.organizer_mut();
            Ok(editor
                .uid_at(*page)
                .and_then(|uid| editor.duplicate(uid))
                .is_some())
        }
        PlanOperation::Delete { page } => {
            let editor = session.organizer_mut();
            match editor.uid_at(*page) {
                Some(uid) => Ok(editor.delete(uid)?.is_applied()),
                None => Ok(false),
            }
        }
        PlanOperation::Move { page, to } => {
            let editor = session.organizer_mut();
            match (editor.uid_at(*page), editor.uid_at(*to)) {
                (Some(uid), Some(target)) => Ok(editor.reorder(uid, target).is_applied()),
                _ => Ok(false),
            }
        }
        PlanOperation::ToggleSelect { pages } => {
            let editor = session.organizer_mut();
            let uids: Vec<_> = pages.iter().filter_map(|p| editor.uid_at(*p)).collect();
            for uid in uids {
                editor.toggle_select(uid);
            }
            Ok(false)
        }
        PlanOperation::SelectAll { selected } => {
            session.organizer_mut().select_all(*selected);
            Ok(false)
        }
        PlanOperation::BulkRotate { angle } => {
            Ok(session.organizer_mut().bulk_rotate(*angle)?.is_applied())
        }
        PlanOperation::BulkDelete => Ok(session.organizer_mut().bulk_delete()?.is_applied()),
        PlanOperation::BulkDuplicate => Ok(!session.organizer_mut().bulk_duplicate().is_empty()),
        PlanOperation::Insert { at, file, pages } => {
            let (file_name, bytes) = read_upload_file(&resolve_path(base_dir, file)).await?;

            let pending = session.begin_insert(backend, &file_name, bytes, *at).await?;
            match session.confirm_insert(pending, pages) {
                Ok(uids) => Ok(!uids.is_empty()),
                Err(rejected) => Err(rejected.error.into()),
            }
        }
        PlanOperation::Undo => Ok(session.organizer_mut().undo().is_applied()),
        PlanOperation::Redo => Ok(session.organizer_mut().redo().is_applied()),
    }
}

/// 相对路径以计划文件所在目录为基准
fn resolve_path(base_dir: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

// ========== 日志辅助函数 ==========

fn log_plan_start(plan_index: usize, plan: &EditPlan) {
    info!("[计划 {}] 开始处理", plan_index);
    info!(
        "[计划 {}] 名称: {}",
        plan_index,
        crate::utils::logging::truncate_text(plan.display_name(), 60)
    );
    info!("[计划 {}] 文档: {}", plan_index, plan.document_id);
    info!("[计划 {}] 操作总数: {}", plan_index, plan.operations.len());
}

fn log_plan_complete(plan_index: usize, stats: &PlanStats, total: usize) {
    info!(
        "[计划 {}] 操作统计: 生效 {}, 无变化 {}, 拒绝 {}, 失败 {}, 总计 {}",
        plan_index, stats.applied, stats.unchanged, stats.refused, stats.failed, total
    );
    if let Some(id) = &stats.saved_document_id {
        info!("[计划 {}] 新文档: {}", plan_index, id);
    }
    info!("\n[计划 {}] ✅ 计划处理完成\n", plan_index);
}
