//! HTTP 协作方实现
//!
//! 上传服务和题库服务共用一套响应外壳：`{"code": 200, "message": "...", "data": {...}}`

pub mod store_client;
pub mod upload_client;

pub use store_client::StoreClient;
pub use upload_client::UploadClient;

use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::config::Config;

/// 服务端成功码
const SUCCESS_CODE: u64 = 200;

/// 通用响应外壳
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub code: Option<u64>,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == Some(SUCCESS_CODE)
    }
}

/// 按配置的超时时间创建 HTTP 客户端
pub(crate) fn http_client(config: &Config) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!("⚠️ 无法按配置创建 HTTP 客户端，使用默认客户端: {}", e);
            reqwest::Client::new()
        })
}

/// 拼接接口地址，容忍 base_url 末尾多余的 `/`
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
