//! File-backed Session Storage 実装
//!
//! ブラウザのローカルストレージの代わりに、キーと文字列値の JSON オブジェクトを
//! 1 つのファイルに保存します。変更のたびにファイル全体を書き直します。

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::domain::{SessionStorage, StorageError};

/// ファイルを使った Session Storage 実装
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStorage {
    /// ファイルを開く（存在しない場合は空のストレージとして扱う）
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("Opened session storage at {}", path.display());

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let mut items = self
            .items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        change(&mut items);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&*items)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl SessionStorage for FileSessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self
            .items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_opens_empty() {
        // テスト項目: ファイルが存在しない場合は空のストレージとして開かれる
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local_storage.json");

        // when (操作):
        let storage = FileSessionStorage::open(&path).unwrap();

        // then (期待する結果):
        assert_eq!(storage.get_item("currentUser").unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        // テスト項目: 書き込んだ値は開き直しても残っている
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local_storage.json");
        let storage = FileSessionStorage::open(&path).unwrap();

        // when (操作):
        storage.set_item("currentUser", "{\"email\":\"a@b.c\"}").unwrap();
        storage.set_item("users", "[]").unwrap();
        storage.remove_item("users").unwrap();
        let reopened = FileSessionStorage::open(&path).unwrap();

        // then (期待する結果):
        assert_eq!(
            reopened.get_item("currentUser").unwrap().as_deref(),
            Some("{\"email\":\"a@b.c\"}")
        );
        assert_eq!(reopened.get_item("users").unwrap(), None);
    }

    #[test]
    fn test_corrupted_file_is_reported() {
        // テスト項目: 壊れたファイルは Corrupted エラーになる
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        fs::write(&path, "not json").unwrap();

        // when (操作):
        let result = FileSessionStorage::open(&path);

        // then (期待する結果):
        assert!(matches!(result, Err(StorageError::Corrupted(_))));
    }
}
