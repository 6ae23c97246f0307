use tracing::warn;

use crate::models::{FileHandle, LocalFile};

/// 本地文件索引
///
/// 导出的文档引用图片时常常比实际文件夹结构少几层目录，所以按路径后缀查找：
/// `sub/img1.png` 能匹配 `folder/sub/img1.png`，但不会匹配 `xsub/img1.png`。
#[derive(Debug, Clone, Default)]
pub struct AssetIndex {
    entries: Vec<(String, FileHandle)>,
}

impl AssetIndex {
    pub fn build(files: impl IntoIterator<Item = LocalFile>) -> Self {
        let entries = files
            .into_iter()
            .map(|file| (normalize_path(&file.relative_path), FileHandle::new(file)))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 查找引用路径对应的文件
    ///
    /// 多个文件都匹配时取最后一个，并记录警告。
    pub fn find(&self, reference_path: &str) -> Option<FileHandle> {
        let reference = normalize_path(reference_path);
        if reference.is_empty() {
            return None;
        }
        let suffix = format!("/{}", reference);

        let candidates: Vec<&(String, FileHandle)> = self
            .entries
            .iter()
            .filter(|(path, _)| *path == reference || path.ends_with(&suffix))
            .collect();

        if candidates.len() > 1 {
            let paths: Vec<&str> = candidates.iter().map(|(p, _)| p.as_str()).collect();
            warn!(
                "⚠️ 图片引用 {} 匹配到多个文件，使用最后一个: {:?}",
                reference_path, paths
            );
        }

        candidates.last().map(|(_, file)| file.clone())
    }
}

/// 反斜杠转正斜杠，去掉开头的 `./` 和 `/`
fn normalize_path(path: &str) -> String {
    let mut normalized = path.trim().replace('\\', "/");
    loop {
        if let Some(rest) = normalized.strip_prefix("./") {
            normalized = rest.to_string();
        } else if let Some(rest) = normalized.strip_prefix('/') {
            normalized = rest.to_string();
        } else {
            return normalized;
        }
    }
}
