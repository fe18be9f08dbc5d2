//! 文档服务的数据结构
//!
//! 与后端 JSON 字段一一对应（驼峰命名）

use serde::{Deserialize, Serialize};

use crate::models::page::Rotation;

/// `GET /documents/{id}` 返回的文档详情
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(rename = "is_plain_text", default)]
    pub is_plain_text: bool,
    #[serde(rename = "is_code_file", default)]
    pub is_code_file: bool,
}

impl DocumentDetails {
    /// 文件大小（MB，保留两位小数）
    pub fn size_mb(&self) -> String {
        format!("{:.2} MB", self.size as f64 / (1024.0 * 1024.0))
    }
}

/// 上传或整理后返回的文档描述
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type", default)]
    pub file_type: String,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// 整理配方中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeEntry {
    pub source_document_id: String,
    pub source_page_index: usize,
    pub rotation: Rotation,
}

/// `POST /documents/{id}/organize` 的请求体
#[derive(Debug, Clone, Serialize)]
pub struct OrganizePayload<'a> {
    pub recipe: &'a [RecipeEntry],
}
