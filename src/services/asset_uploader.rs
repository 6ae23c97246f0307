//! 图片上传能力 - 业务能力层
//!
//! 只描述"把一个本地文件变成持久地址"，具体实现见 `clients::UploadClient`。

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::LocalFile;

/// 图片上传协作方
///
/// 每次调用都是一次尽力而为的上传，失败直接返回错误，不在内部重试。
#[async_trait]
pub trait AssetUploader: Send + Sync {
    /// 上传文件，返回持久地址
    async fn upload_asset(&self, file: &LocalFile, destination_hint: &str) -> AppResult<String>;
}
