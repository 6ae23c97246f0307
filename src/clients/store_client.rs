/// 题库 API 客户端
///
/// 以 JSON 提交题目记录，返回服务端分配的记录 ID
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{endpoint, http_client, ApiEnvelope};
use crate::config::Config;
use crate::error::{AppError, AppResult, StoreError};
use crate::models::QuestionRecord;
use crate::services::QuestionStore;

#[derive(Debug, Deserialize)]
struct SaveData {
    id: Option<Value>,
}

/// 题库客户端
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl StoreClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: http_client(config),
            base_url: config.store_api_base_url.clone(),
            token: config.api_token.clone(),
        }
    }
}

/// 记录 ID 可能是字符串也可能是数字
fn record_id(collection: &str, envelope: ApiEnvelope<SaveData>) -> AppResult<String> {
    if !envelope.is_success() {
        return Err(AppError::store_rejected(collection, envelope.code, envelope.message));
    }
    match envelope.data.and_then(|d| d.id) {
        Some(Value::String(id)) if !id.is_empty() => Ok(id),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(StoreError::MissingId {
            collection: collection.to_string(),
        }
        .into()),
    }
}

#[async_trait]
impl QuestionStore for StoreClient {
    async fn persist_question_record(&self, record: &QuestionRecord) -> AppResult<String> {
        debug!("保存题目: {} → {}", record.label, record.collection);

        let request_failed = |source| StoreError::RequestFailed {
            collection: record.collection.clone(),
            source,
        };

        let envelope: ApiEnvelope<SaveData> = self
            .http
            .post(endpoint(&self.base_url, "question/save"))
            .header("token", &self.token)
            .json(record)
            .send()
            .await
            .map_err(request_failed)?
            .json()
            .await
            .map_err(request_failed)?;

        record_id(&record.collection, envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> ApiEnvelope<SaveData> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_record_id_accepts_string_and_number() {
        let id = record_id("questions", envelope(r#"{"code":200,"data":{"id":"abc"}}"#)).unwrap();
        assert_eq!(id, "abc");
        let id = record_id("questions", envelope(r#"{"code":200,"data":{"id":42}}"#)).unwrap();
        assert_eq!(id, "42");
    }

    #[test]
    fn test_record_id_errors() {
        let err = record_id("questions", envelope(r#"{"code":200,"data":{}}"#)).unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::MissingId { .. })));

        let err = record_id("questions", envelope(r#"{"code":401,"message":"token"}"#)).unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::BadResponse { code: Some(401), .. })));
    }
}
