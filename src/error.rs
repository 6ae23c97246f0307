use thiserror::Error;

/// 应用程序错误类型
///
/// 只用于协作方调用（上传、存储）和启动阶段。草稿级别的问题不走这里，
/// 见 [`crate::models::DraftIssue`]。
#[derive(Debug, Error)]
pub enum AppError {
    /// 图片上传错误
    #[error("上传错误: {0}")]
    Upload(#[from] UploadError),
    /// 题目存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 图片上传错误
#[derive(Debug, Error)]
pub enum UploadError {
    /// 读取本地文件失败
    #[error("读取本地文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 网络请求失败
    #[error("上传请求失败 ({path}): {source}")]
    RequestFailed {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务返回错误响应
    #[error("上传服务返回错误 ({path}): code={code:?}, message={message:?}")]
    BadResponse {
        path: String,
        code: Option<u64>,
        message: Option<String>,
    },
}

/// 题目存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 网络请求失败
    #[error("保存请求失败 ({collection}): {source}")]
    RequestFailed {
        collection: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务返回错误响应
    #[error("存储服务返回错误 ({collection}): code={code:?}, message={message:?}")]
    BadResponse {
        collection: String,
        code: Option<u64>,
        message: Option<String>,
    },
    /// 响应里没有记录 ID
    #[error("存储服务未返回记录ID ({collection})")]
    MissingId { collection: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 所选文件中没有标记文档
    #[error("所选文件中没有标记文档 (.html/.htm)")]
    NoMarkupDocument,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML 解析失败
    #[error("配置文件 {path} 解析失败: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建上传服务错误响应
    pub fn upload_rejected(path: impl Into<String>, code: Option<u64>, message: Option<String>) -> Self {
        AppError::Upload(UploadError::BadResponse {
            path: path.into(),
            code,
            message,
        })
    }

    /// 创建存储服务错误响应
    pub fn store_rejected(collection: impl Into<String>, code: Option<u64>, message: Option<String>) -> Self {
        AppError::Store(StoreError::BadResponse {
            collection: collection.into(),
            code,
            message,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_nest() {
        let err = AppError::upload_rejected("sub/img1.png", Some(500), Some("quota".into()));
        assert_eq!(
            err.to_string(),
            "上传错误: 上传服务返回错误 (sub/img1.png): code=Some(500), message=Some(\"quota\")"
        );

        let err = AppError::from(StoreError::MissingId {
            collection: "math".into(),
        });
        assert_eq!(err.to_string(), "存储错误: 存储服务未返回记录ID (math)");
    }
}
