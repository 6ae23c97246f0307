//! 题目存储能力 - 业务能力层

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::QuestionRecord;

/// 题目存储协作方
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// 保存一条题目记录，返回记录 ID
    async fn persist_question_record(&self, record: &QuestionRecord) -> AppResult<String>;
}
