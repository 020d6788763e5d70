//! Realtime store trait 定義
//!
//! ホスト型リアルタイムデータベースへのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{
    error::StoreError,
    value_object::{PresenceKey, RoomId},
};

const CHAT_ROOMS: &str = "chatRooms";
const MESSAGES: &str = "messages";
const ONLINE_USERS: &str = "onlineUsers";

/// Stream of full values at a watched path.
///
/// `None` means nothing is stored at the path. Dropping or closing the receiver
/// detaches the watch.
pub type ValueWatch = mpsc::UnboundedReceiver<Option<Value>>;

/// Slash-separated key path inside the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Parse a path such as `chatRooms/general/messages`. Empty segments are skipped.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// The store root
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// `chatRooms/{roomId}`
    pub fn room(room_id: &RoomId) -> Self {
        Self::parse(CHAT_ROOMS).child(room_id.as_str())
    }

    /// `chatRooms/{roomId}/messages`
    pub fn room_messages(room_id: &RoomId) -> Self {
        Self::room(room_id).child(MESSAGES)
    }

    /// `onlineUsers`
    pub fn online_users() -> Self {
        Self::parse(ONLINE_USERS)
    }

    /// `onlineUsers/{userKey}`
    pub fn presence(key: &PresenceKey) -> Self {
        Self::online_users().child(key.as_str())
    }

    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `self` is `other` or one of its ancestors
    pub fn contains(&self, other: &StorePath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Whether a change at one path can affect the value at the other
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Realtime store trait
///
/// アプリケーションが必要とするリアルタイムデータベースの操作。
/// UseCase 層はこの trait に依存し、具体的な実装（インメモリ、REST）には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// パスの値を取得（存在しない場合は `None`）
    async fn get(&self, path: &StorePath) -> Result<Option<Value>, StoreError>;

    /// パスに値をアトミックに書き込む（`null` は削除）
    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError>;

    /// `path` の子として使える新しいキーを生成（I/O なし、生成順にソート可能）
    fn push_key(&self, path: &StorePath) -> String;

    /// パスの値の変更を購読（現在の値は即座に配信される）
    async fn watch(&self, path: &StorePath) -> Result<ValueWatch, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_paths() {
        // テスト項目: 既定のパスが正しく組み立てられる
        // given (前提条件):
        let room = RoomId::new("general").unwrap();
        let key = PresenceKey::new("alice").unwrap();

        // when (操作) / then (期待する結果):
        assert_eq!(StorePath::room(&room).to_string(), "chatRooms/general");
        assert_eq!(
            StorePath::room_messages(&room).to_string(),
            "chatRooms/general/messages"
        );
        assert_eq!(StorePath::online_users().to_string(), "onlineUsers");
        assert_eq!(StorePath::presence(&key).to_string(), "onlineUsers/alice");
    }

    #[test]
    fn test_parse_skips_empty_segments() {
        // テスト項目: 先頭・末尾・連続するスラッシュは無視される
        // given (前提条件):
        let raw = "/chatRooms//general/";

        // when (操作):
        let path = StorePath::parse(raw);

        // then (期待する結果):
        assert_eq!(path.segments(), &["chatRooms", "general"]);
        assert!(StorePath::parse("/").is_root());
    }

    #[test]
    fn test_overlaps_for_ancestors_and_descendants() {
        // テスト項目: 祖先・子孫のパスは重なり、兄弟のパスは重ならない
        // given (前提条件):
        let room = StorePath::parse("chatRooms/general");
        let messages = StorePath::parse("chatRooms/general/messages/abc");
        let sibling = StorePath::parse("chatRooms/random");

        // when (操作) / then (期待する結果):
        assert!(room.contains(&messages));
        assert!(!messages.contains(&room));
        assert!(room.overlaps(&messages));
        assert!(messages.overlaps(&room));
        assert!(!room.overlaps(&sibling));
        assert!(StorePath::root().overlaps(&sibling));
    }
}
