use serde::{Deserialize, Serialize};

use super::draft::QuestionDraft;

/// 题目归属的题池
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolAssignment {
    pub pool_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_name: Option<String>,
}

impl PoolAssignment {
    pub fn new(pool_id: impl Into<String>) -> Self {
        Self {
            pool_id: pool_id.into(),
            pool_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOption {
    pub label: String,
    pub content: String,
    pub is_correct: bool,
}

/// 最终入库的题目记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub label: String,
    pub content: String,
    pub options: Vec<RecordOption>,
    pub correct_answer: String,
    pub explanation: String,
    pub collection: String,
    pub pool: PoolAssignment,
}

impl QuestionRecord {
    /// 由已解析完图片的草稿构建记录，缺失的选项字母按位置补齐
    pub fn from_draft(draft: &QuestionDraft, collection: &str, pool: &PoolAssignment) -> Self {
        let options = draft
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| RecordOption {
                label: option
                    .effective_label(index)
                    .map(String::from)
                    .unwrap_or_default(),
                content: option.content.clone(),
                is_correct: option.is_correct,
            })
            .collect();

        Self {
            label: draft.label.clone(),
            content: draft.content.clone(),
            options,
            correct_answer: draft.correct_answer_label.clone(),
            explanation: draft.explanation.clone(),
            collection: collection.to_string(),
            pool: pool.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptionDraft;

    #[test]
    fn test_record_json_shape() {
        let mut draft = QuestionDraft::new("q1", "Câu 1");
        draft.content = "<p>2 + 2?</p>".into();
        draft.options = vec![
            OptionDraft::new('A', "3"),
            OptionDraft { label: None, content: "4".into(), is_correct: true },
        ];
        draft.correct_answer_label = "B".into();

        let record = QuestionRecord::from_draft(&draft, "math", &PoolAssignment::new("pool-1"));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["label"], "Câu 1");
        assert_eq!(json["correctAnswer"], "B");
        assert_eq!(json["options"][1]["label"], "B");
        assert_eq!(json["options"][1]["isCorrect"], true);
        assert_eq!(json["pool"]["poolId"], "pool-1");
        assert!(json["pool"].get("poolName").is_none());
    }
}
