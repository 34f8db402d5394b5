//! 键值持久化基础设施
//!
//! 每个键保存一份 JSON 文档，语义上等同于浏览器的 local storage：
//! - `load` 读取失败时回退到默认值，错误通过 [`Outcome`] 交给调用方处理
//! - `save` 写入失败不会影响内存中的状态

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 存储错误类型
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("存储读写错误: {0}")]
    Io(#[from] io::Error),
    #[error("JSON 数据错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("存储空间不足: 写入 {key} 需要 {needed} 字节，配额 {quota} 字节")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
    #[error("无效的存储键: {0:?}")]
    InvalidKey(String),
}

/// 操作结果：值本身加上可选的存储错误
///
/// 存储失败不会让操作失败，调用方可以自行决定是否记录。
#[derive(Debug)]
#[must_use]
pub struct Outcome<T> {
    pub value: T,
    pub storage_error: Option<StorageError>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            storage_error: None,
        }
    }

    pub fn new(value: T, result: Result<(), StorageError>) -> Self {
        Self {
            value,
            storage_error: result.err(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.storage_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// 键值存储抽象
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// 读取 `key` 对应的快照，缺失或无法解析时返回 `fallback`
pub fn load<T, S>(store: &S, key: &str, fallback: T) -> Outcome<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Outcome::clean(fallback),
        Err(e) => {
            return Outcome {
                value: fallback,
                storage_error: Some(e),
            }
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Outcome::clean(value),
        Err(e) => Outcome {
            value: fallback,
            storage_error: Some(e.into()),
        },
    }
}

/// 序列化并写入 `key`
pub fn save<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, raw)
}

fn check_quota(
    quota: Option<usize>,
    key: &str,
    value_len: usize,
    others_len: usize,
) -> Result<(), StorageError> {
    if let Some(quota) = quota {
        let needed = others_len + value_len;
        if needed > quota {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                needed,
                quota,
            });
        }
    }
    Ok(())
}

/// 内存存储，主要用于测试
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let others: usize = self
            .entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum();
        check_quota(self.quota, key, value.len(), others)?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// 文件存储：目录下每个键一个 `<key>.json` 文件
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    /// 打开存储目录，不存在时自动创建
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, quota: None })
    }

    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// 目录中除 `key` 以外所有文档的字节数
    fn used_by_others(&self, key: &str) -> Result<usize, StorageError> {
        let own = format!("{}.json", key);
        let mut used = 0usize;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(".json") && name != own {
                used += entry.metadata()?.len() as usize;
            }
        }
        Ok(used)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if self.quota.is_some() {
            let others = self.used_by_others(key)?;
            check_quota(self.quota, key, value.len(), others)?;
        }

        // 先写临时文件再改名，避免留下半截文档
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_key_uses_fallback() {
        let store = MemoryStore::new();
        let outcome: Outcome<Vec<String>> = load(&store, "categories", vec!["x".to_string()]);
        assert!(outcome.is_clean());
        assert_eq!(outcome.value, vec!["x".to_string()]);
    }

    #[test]
    fn test_load_corrupt_document_reports_error() {
        let mut store = MemoryStore::new();
        store.set("categories", "{not json".to_string()).unwrap();

        let outcome: Outcome<Vec<String>> = load(&store, "categories", Vec::new());
        assert!(outcome.value.is_empty());
        assert!(matches!(outcome.storage_error, Some(StorageError::Json(_))));
    }

    #[test]
    fn test_memory_quota() {
        let mut store = MemoryStore::new().with_quota(10);
        assert!(save(&mut store, "a", &"12345").is_ok());
        // 覆盖同一个键不重复计算旧值
        assert!(save(&mut store, "a", &"1234567").is_ok());

        let err = save(&mut store, "b", &"123").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_store_save_load() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("data")).unwrap();

        save(&mut store, "categories", &vec!["A", "B"]).unwrap();
        assert!(dir.path().join("data").join("categories.json").exists());

        let outcome: Outcome<Vec<String>> = load(&store, "categories", Vec::new());
        assert!(outcome.is_clean());
        assert_eq!(outcome.value, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        let err = store.set("../escape", "[]".to_string()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[test]
    fn test_file_store_quota() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap().with_quota(Some(8));
        store.set("products", "[1,2,3]".to_string()).unwrap();

        let err = store.set("categories", "[\"A\"]".to_string()).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { quota: 8, .. }));
        assert!(store.get("categories").unwrap().is_none());
    }
}
