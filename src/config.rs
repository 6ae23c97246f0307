use serde::Deserialize;
use std::str::FromStr;

use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::models::PoolAssignment;

/// 程序配置
///
/// 先取默认值，可选地从 `CONFIG_FILE` 指向的 TOML 文件读取，最后用环境变量覆盖。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时提交的草稿数量
    pub max_concurrent_drafts: usize,
    /// 单个草稿内同时上传的图片数量
    pub max_concurrent_uploads: usize,
    /// 待导入的文件夹（标记文档和图片）
    pub source_folder: String,
    /// 指定标记文档文件名，不指定时取第一个 .html
    pub document_name: Option<String>,
    /// 题目写入的集合
    pub target_collection: String,
    /// 题池
    pub pool_id: String,
    pub pool_name: Option<String>,
    /// 上传图片时的目标路径前缀
    pub asset_destination: String,
    // --- 服务配置 ---
    pub upload_api_base_url: String,
    pub store_api_base_url: String,
    pub api_token: String,
    pub request_timeout_secs: u64,
    // --- 输出 ---
    /// 运行日志文件
    pub output_log_file: String,
    /// 需要人工复核的题目写到这里
    pub review_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_drafts: 8,
            max_concurrent_uploads: 4,
            source_folder: "import".to_string(),
            document_name: None,
            target_collection: "questions".to_string(),
            pool_id: "default".to_string(),
            pool_name: None,
            asset_destination: "quiz-assets".to_string(),
            upload_api_base_url: "http://localhost:8080/api".to_string(),
            store_api_base_url: "http://localhost:8080/api".to_string(),
            api_token: String::new(),
            request_timeout_secs: 30,
            output_log_file: "import_log.txt".to_string(),
            review_file: "review.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 默认值 + 可选配置文件 + 环境变量
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::from_toml_file(&path)?,
            Err(_) => Self::default(),
        };
        base.with_env_overrides()
    }

    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    fn from_toml_str(content: &str, path: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|source| {
            AppError::Config(ConfigError::TomlParseFailed {
                path: path.to_string(),
                source,
            })
        })
    }

    fn with_env_overrides(self) -> AppResult<Self> {
        Ok(Self {
            max_concurrent_drafts: env_parse("MAX_CONCURRENT_DRAFTS", self.max_concurrent_drafts)?,
            max_concurrent_uploads: env_parse("MAX_CONCURRENT_UPLOADS", self.max_concurrent_uploads)?,
            source_folder: std::env::var("SOURCE_FOLDER").unwrap_or(self.source_folder),
            document_name: std::env::var("DOCUMENT_NAME").ok().or(self.document_name),
            target_collection: std::env::var("TARGET_COLLECTION").unwrap_or(self.target_collection),
            pool_id: std::env::var("POOL_ID").unwrap_or(self.pool_id),
            pool_name: std::env::var("POOL_NAME").ok().or(self.pool_name),
            asset_destination: std::env::var("ASSET_DESTINATION").unwrap_or(self.asset_destination),
            upload_api_base_url: std::env::var("UPLOAD_API_BASE_URL").unwrap_or(self.upload_api_base_url),
            store_api_base_url: std::env::var("STORE_API_BASE_URL").unwrap_or(self.store_api_base_url),
            api_token: std::env::var("API_TOKEN").unwrap_or(self.api_token),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", self.request_timeout_secs)?,
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            review_file: std::env::var("REVIEW_FILE").unwrap_or(self.review_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging)?,
        })
    }

    pub fn pool_assignment(&self) -> PoolAssignment {
        PoolAssignment {
            pool_id: self.pool_id.clone(),
            pool_name: self.pool_name.clone(),
        }
    }
}

fn env_parse<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_overrides_defaults() {
        let config = Config::from_toml_str(
            r#"
            max_concurrent_drafts = 2
            target_collection = "dia_ly"
            pool_id = "pool-7"
            pool_name = "Học kỳ 1"
            "#,
            "test.toml",
        )
        .unwrap();

        assert_eq!(config.max_concurrent_drafts, 2);
        assert_eq!(config.max_concurrent_uploads, 4);
        assert_eq!(config.target_collection, "dia_ly");
        assert_eq!(
            config.pool_assignment(),
            PoolAssignment {
                pool_id: "pool-7".into(),
                pool_name: Some("Học kỳ 1".into())
            }
        );
    }

    #[test]
    fn test_bad_toml_is_a_config_error() {
        let err = Config::from_toml_str("max_concurrent_drafts = \"many\"", "bad.toml").unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::TomlParseFailed { .. })));
    }

    #[test]
    fn test_env_parse_reports_type() {
        std::env::set_var("QUIZ_IMPORT_TEST_LIMIT", "abc");
        let err = env_parse::<usize>("QUIZ_IMPORT_TEST_LIMIT", 1).unwrap_err();
        assert!(err.to_string().contains("usize"));
        std::env::remove_var("QUIZ_IMPORT_TEST_LIMIT");
        assert_eq!(env_parse::<usize>("QUIZ_IMPORT_TEST_LIMIT", 1).unwrap(), 1);
    }
}
