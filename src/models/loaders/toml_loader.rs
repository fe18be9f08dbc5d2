use crate::models::plan::EditPlan;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 已处理计划文件的后缀
const DONE_SUFFIX: &str = "done";

/// 从 TOML 文件加载编辑计划
pub async fn load_toml_to_edit_plan(toml_file_path: &Path) -> Result<EditPlan> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let plan: EditPlan = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    Ok(plan.with_file_path(toml_file_path.to_string_lossy().to_string()))
}

/// 从文件夹中加载所有 TOML 编辑计划（按文件名排序）
///
/// 解析失败的文件只记录警告并跳过
pub async fn load_all_plan_files(folder_path: &str) -> Result<Vec<EditPlan>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut plans = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_toml_to_edit_plan(&path).await {
            Ok(plan) => {
                tracing::info!("成功加载 {} 个操作", plan.operations.len());
                plans.push(plan);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(plans)
}

/// 将处理完的计划文件重命名为 `*.toml.done`，避免重复执行
pub async fn mark_plan_done(file_path: &str) -> Result<PathBuf> {
    let source = PathBuf::from(file_path);
    let mut target = source.clone().into_os_string();
    target.push(".");
    target.push(DONE_SUFFIX);
    let target = PathBuf::from(target);

    fs::rename(&source, &target)
        .await
        .with_context(|| format!("无法重命名文件: {}", file_path))?;

    Ok(target)
}
