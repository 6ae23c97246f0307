/// 图片上传 API 客户端
///
/// 以 multipart 表单上传本地文件，字段 `file`（文件内容）和 `path`（目标路径）
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use super::{endpoint, http_client, ApiEnvelope};
use crate::config::Config;
use crate::error::{AppError, AppResult, UploadError};
use crate::models::LocalFile;
use crate::services::AssetUploader;

#[derive(Debug, Deserialize)]
struct UploadData {
    url: Option<String>,
}

/// 图片上传客户端
pub struct UploadClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl UploadClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: http_client(config),
            base_url: config.upload_api_base_url.clone(),
            token: config.api_token.clone(),
        }
    }

    /// 目标路径 = 前缀 + 文件相对路径
    fn destination(file: &LocalFile, destination_hint: &str) -> String {
        let hint = destination_hint.trim_matches('/');
        if hint.is_empty() {
            file.relative_path.clone()
        } else {
            format!("{}/{}", hint, file.relative_path)
        }
    }
}

/// 从响应中取出持久地址
fn upload_url(path: &str, envelope: ApiEnvelope<UploadData>) -> AppResult<String> {
    if !envelope.is_success() {
        return Err(AppError::upload_rejected(path, envelope.code, envelope.message));
    }
    envelope
        .data
        .and_then(|d| d.url)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            AppError::upload_rejected(path, envelope.code, Some("响应中没有 url".to_string()))
        })
}

#[async_trait]
impl AssetUploader for UploadClient {
    async fn upload_asset(&self, file: &LocalFile, destination_hint: &str) -> AppResult<String> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| UploadError::ReadFailed {
                path: file.relative_path.clone(),
                source,
            })?;

        let destination = Self::destination(file, destination_hint);
        debug!("上传图片: {} ({} 字节) → {}", file.relative_path, bytes.len(), destination);

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file.file_name().to_string()))
            .text("path", destination);

        let request_failed = |source| UploadError::RequestFailed {
            path: file.relative_path.clone(),
            source,
        };

        let envelope: ApiEnvelope<UploadData> = self
            .http
            .post(endpoint(&self.base_url, "asset/upload"))
            .header("token", &self.token)
            .multipart(form)
            .send()
            .await
            .map_err(request_failed)?
            .json()
            .await
            .map_err(request_failed)?;

        upload_url(&file.relative_path, envelope)
    }
}
