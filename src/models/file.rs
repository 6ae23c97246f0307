use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 用户选择的一个本地文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// 相对所选文件夹的路径，统一用 `/` 分隔
    pub relative_path: String,
    /// 磁盘上的实际位置
    pub path: PathBuf,
}

/// 不透明的文件句柄，索引和登记表共享同一份文件信息
pub type FileHandle = Arc<LocalFile>;

impl LocalFile {
    pub fn new(relative_path: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into().replace('\\', "/"),
            path: path.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// 是否是文字处理软件导出的标记文档
    pub fn is_markup(&self) -> bool {
        Path::new(&self.relative_path)
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
            .unwrap_or(false)
    }
}
