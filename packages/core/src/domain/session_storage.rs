//! Session storage trait 定義
//!
//! ブラウザのローカルストレージに相当する、同期的なキー・バリューストア。

use super::error::StorageError;

/// Key holding the logged-in user (JSON)
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Key holding the registered users list (JSON array)
pub const USERS_KEY: &str = "users";

/// Persistent, synchronous string key-value storage
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
