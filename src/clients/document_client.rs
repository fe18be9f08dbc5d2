/// 文档服务 API 客户端
///
/// 封装所有与文档后端相关的调用逻辑
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Response;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, FileError};
use crate::models::document::{DocumentDetails, OrganizePayload, RecipeEntry, UploadedDocument};

/// 文档后端能力
///
/// 会话层只依赖这个 trait，测试中可以用内存实现替换
pub trait DocumentBackend {
    /// `GET /documents/{id}`
    fn get_document(
        &self,
        document_id: &str,
    ) -> impl Future<Output = AppResult<DocumentDetails>> + Send;

    /// `GET /documents/{id}/page/{n}`，页码从 1 开始
    fn fetch_page(
        &self,
        document_id: &str,
        page_number: usize,
    ) -> impl Future<Output = AppResult<Vec<u8>>> + Send;

    /// `POST /documents/upload`（multipart）
    fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = AppResult<UploadedDocument>> + Send;

    /// `POST /documents/{id}/organize`
    fn organize(
        &self,
        document_id: &str,
        recipe: &[RecipeEntry],
    ) -> impl Future<Output = AppResult<UploadedDocument>> + Send;

    /// `DELETE /documents/{id}`
    fn delete_document(&self, document_id: &str) -> impl Future<Output = AppResult<()>> + Send;

    /// 单页预览地址，页码从 1 开始
    fn page_url(&self, document_id: &str, page_number: usize) -> String;
}

/// 读取待上传的本地文件
///
/// # 参数
/// - `path`: 本地文件路径
///
/// # 返回
/// 返回 `(文件名, 文件内容)`
pub async fn read_upload_file(path: &Path) -> AppResult<(String, Vec<u8>)> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(AppError::File(FileError::NotFound { path: display }));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::file_read_failed(display.clone(), e))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or(display);

    Ok((file_name, bytes))
}

/// 文档服务客户端
#[derive(Clone)]
pub struct DocumentClient {
    http: reqwest::Client,
    base_url: String,
}

impl DocumentClient {
    /// 创建新的文档服务客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 整个文档的预览地址
    pub fn preview_url(&self, document_id: &str) -> String {
        format!("{}/documents/{}/preview", self.base_url, document_id)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 非 2xx 响应转换为错误，响应体作为错误信息
    async fn ensure_success(response: Response, endpoint: &str) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        warn!("API 返回错误 ({}): {} {}", endpoint, status, text);
        let message = (!text.trim().is_empty()).then_some(text);
        Err(AppError::bad_response(endpoint, status.as_u16(), message))
    }

    async fn send(&self, request: reqwest::RequestBuilder, endpoint: &str) -> AppResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        Self::ensure_success(response, endpoint).await
    }
}

impl DocumentBackend for DocumentClient {
    async fn get_document(&self, document_id: &str) -> AppResult<DocumentDetails> {
        let endpoint = format!("/documents/{}", document_id);
        debug!("获取文档详情: {}", document_id);

        let response = self.send(self.http.get(self.url(&endpoint)), &endpoint).await?;
        Ok(response.json().await?)
    }

    async fn fetch_page(&self, document_id: &str, page_number: usize) -> AppResult<Vec<u8>> {
        let endpoint = format!("/documents/{}/page/{}", document_id, page_number);

        let response = self.send(self.http.get(self.url(&endpoint)), &endpoint).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload_document(&self, file_name: &str, bytes: Vec<u8>) -> AppResult<UploadedDocument> {
        let endpoint = "/documents/upload";
        debug!("上传文档: {} ({} 字节)", file_name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self
            .send(self.http.post(self.url(endpoint)).multipart(form), endpoint)
            .await?;
        Ok(response.json().await?)
    }

    async fn organize(
        &self,
        document_id: &str,
        recipe: &[RecipeEntry],
    ) -> AppResult<UploadedDocument> {
        let endpoint = format!("/documents/{}/organize", document_id);
        debug!("提交整理配方: {} ({} 页)", document_id, recipe.len());

        let payload = OrganizePayload { recipe };
        let response = self
            .send(self.http.post(self.url(&endpoint)).json(&payload), &endpoint)
            .await?;
        Ok(response.json().await?)
    }

    async fn delete_document(&self, document_id: &str) -> AppResult<()> {
        let endpoint = format!("/documents/{}", document_id);
        debug!("删除文档: {}", document_id);

        self.send(self.http.delete(self.url(&endpoint)), &endpoint)
            .await?;
        Ok(())
    }

    fn page_url(&self, document_id: &str, page_number: usize) -> String {
        format!(
            "{}/documents/{}/page/{}",
            self.base_url, document_id, page_number
        )
    }
}
