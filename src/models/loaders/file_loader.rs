use crate::models::file::LocalFile;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 递归扫描文件夹，返回所有文件及其相对路径（按路径排序）
pub async fn load_local_files(folder_path: &str) -> Result<Vec<LocalFile>> {
    let root = PathBuf::from(folder_path);

    if !root.is_dir() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut files = Vec::new();
    let mut pending = vec![root.clone()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir)
            .await
            .with_context(|| format!("无法读取文件夹: {}", dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let relative = relative_path(&root, &path);
                tracing::debug!("发现文件: {}", relative);
                files.push(LocalFile::new(relative, path));
            }
        }
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    tracing::info!("在 {} 中找到 {} 个文件", folder_path, files.len());

    Ok(files)
}

/// 从文件列表中选出标记文档
///
/// 指定了文件名时按文件名精确匹配，否则取第一个 `.html` / `.htm` 文件。
pub fn pick_markup_document<'a>(
    files: &'a [LocalFile],
    preferred_name: Option<&str>,
) -> Option<&'a LocalFile> {
    match preferred_name {
        Some(name) => files
            .iter()
            .find(|f| f.relative_path == name || f.file_name() == name),
        None => files.iter().find(|f| f.is_markup()),
    }
}

/// 读取标记文档内容
pub async fn read_markup_document(file: &LocalFile) -> Result<String> {
    let bytes = fs::read(&file.path)
        .await
        .with_context(|| format!("无法读取标记文档: {}", file.path.display()))?;

    // 导出的文档偶尔不是合法 UTF-8，尽量读出来
    Ok(String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_local_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("de_thi_files").join("sub");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(dir.path().join("de_thi.html"), "<p>Câu 1</p>").unwrap();
        std::fs::write(images.join("img1.png"), [0u8; 4]).unwrap();

        let files = load_local_files(dir.path().to_str().unwrap()).await.unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["de_thi.html", "de_thi_files/sub/img1.png"]);

        let doc = pick_markup_document(&files, None).unwrap();
        assert_eq!(doc.relative_path, "de_thi.html");
        assert_eq!(read_markup_document(doc).await.unwrap(), "<p>Câu 1</p>");

        let named = pick_markup_document(&files, Some("img1.png")).unwrap();
        assert_eq!(named.relative_path, "de_thi_files/sub/img1.png");
    }

    #[tokio::test]
    async fn test_missing_folder_is_an_error() {
        assert!(load_local_files("/definitely/not/here").await.is_err());
    }
}
