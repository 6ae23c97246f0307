use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::FileHandle;

/// 本程序生成的临时句柄前缀
pub const HANDLE_PREFIX: &str = "blob:quiz-import/";

/// 临时句柄的形状：任何 `blob:` 开头、直到引号、空白或尖括号为止的串
static HANDLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"blob:[^\s"'<>]+"#).expect("临时句柄正则"));

/// 临时句柄 → 文件 的登记表
///
/// 内容里嵌着什么句柄、提交时要上传什么文件，都以这里为准。句柄是单向生成的，
/// 无法从文件反推，所以只能查表，不能重建。预览阶段只追加，提交阶段只读。
#[derive(Debug, Clone, Default)]
pub struct BlobFileRegistry {
    entries: HashMap<String, FileHandle>,
}

impl BlobFileRegistry {
    /// 生成一个新的临时句柄
    pub fn mint_handle() -> String {
        format!("{}{}", HANDLE_PREFIX, uuid::Uuid::new_v4())
    }

    /// 为文件生成句柄并登记
    pub fn register(&mut self, file: FileHandle) -> String {
        let handle = Self::mint_handle();
        self.entries.insert(handle.clone(), file);
        handle
    }

    pub fn extend(&mut self, updates: impl IntoIterator<Item = (String, FileHandle)>) {
        self.entries.extend(updates);
    }

    pub fn get(&self, handle: &str) -> Option<&FileHandle> {
        self.entries.get(handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 内容中出现的临时句柄，去重后按首次出现顺序
pub fn ephemeral_handles(content: &str) -> Vec<String> {
    let mut handles: Vec<String> = Vec::new();
    for m in HANDLE_PATTERN.find_iter(content) {
        if !handles.iter().any(|h| h == m.as_str()) {
            handles.push(m.as_str().to_string());
        }
    }
    handles
}

/// 把内容中的每个句柄按映射整体替换，不在映射里的保持原样
pub(crate) fn replace_handles(content: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    HANDLE_PATTERN
        .replace_all(content, |caps: &regex::Captures| {
            let handle = &caps[0];
            lookup(handle).unwrap_or_else(|| handle.to_string())
        })
        .into_owned()
}
