//! UseCase: チャットデータゲートウェイ
//!
//! Realtime Store 上のルームとメッセージを扱う 3 つの操作を提供します。
//!
//! - `ensure_room_exists`: ルームが無ければ Room Directory の情報で作成（冪等）
//! - `append_message`: store が生成したキーでメッセージを追記
//! - `subscribe_to_messages` / `watch_messages`: タイムスタンプ昇順のスナップショットを購読
//!
//! store 由来のエラーは全て [`GatewayError`] に変換され、呼び出し側で
//! ローカルモードへのフォールバックとして扱われます。

use std::sync::Arc;

use hiroba_shared::time::Clock;
use serde_json::Value;

use crate::domain::{
    ChatRoom, Message, MessageStatus, MessageText, RealtimeStore, RoomDirectory, RoomId,
    StorePath, Timestamp,
    record::{MessageRecord, RoomRecord, messages_from_snapshot},
};

use super::{
    error::GatewayError,
    subscription::{MessageSubscription, SubscriptionHandle},
};

/// 送信前のメッセージ（send gate を通過したもの）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// 表示名
    pub user: String,
    /// トリム済みの本文
    pub text: MessageText,
}

/// チャットデータゲートウェイ
pub struct ChatGateway {
    /// Realtime Store（外部データベースの抽象化）
    store: Arc<dyn RealtimeStore>,
    clock: Arc<dyn Clock>,
    directory: RoomDirectory,
}

impl ChatGateway {
    pub fn new(store: Arc<dyn RealtimeStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            directory: RoomDirectory,
        }
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    /// ルームが存在することを保証する
    ///
    /// 既に何らかの値が存在する場合は書き込みを行わない。
    ///
    /// # Returns
    ///
    /// * `Ok(ChatRoom)` - 既存または新規作成したルーム
    /// * `Err(GatewayError)` - store に到達できない、または書き込みが拒否された
    pub async fn ensure_room_exists(&self, room_id: &RoomId) -> Result<ChatRoom, GatewayError> {
        let path = StorePath::room(room_id);

        if let Some(existing) = self.store.get(&path).await? {
            return Ok(match serde_json::from_value::<RoomRecord>(existing) {
                Ok(record) => record.into_room(room_id.clone()),
                Err(e) => {
                    tracing::warn!("Room '{}' has an unreadable record: {}", room_id, e);
                    self.room_from_directory(room_id)
                }
            });
        }

        let room = self.room_from_directory(room_id);
        let record = RoomRecord::from(&room);
        let value = serde_json::to_value(&record)
            .map_err(|e| GatewayError::WriteRejected(e.to_string()))?;
        self.store.set(&path, value).await?;

        tracing::info!("Created room '{}' ({})", room.name, room_id);
        Ok(room)
    }

    /// メッセージを追記する
    ///
    /// ID は store が生成し、タイムスタンプは追記時刻、ステータスは `sent` になる。
    pub async fn append_message(
        &self,
        room_id: &RoomId,
        new_message: NewMessage,
    ) -> Result<Message, GatewayError> {
        let messages = StorePath::room_messages(room_id);
        let id = self.store.push_key(&messages);

        let message = Message {
            id: id.clone(),
            user: new_message.user,
            text: new_message.text.into_string(),
            timestamp: Timestamp::new(self.clock.now_millis()),
            status: MessageStatus::Sent,
        };

        let value = serde_json::to_value(MessageRecord::from(&message))
            .map_err(|e| GatewayError::WriteRejected(e.to_string()))?;
        self.store.set(&messages.child(&id), value).await?;

        tracing::debug!("Appended message {} to room '{}'", id, room_id);
        Ok(message)
    }

    /// ルームのメッセージを購読する（ストリーム形式）
    pub async fn watch_messages(&self, room_id: &RoomId) -> Result<MessageSubscription, GatewayError> {
        let path = StorePath::room_messages(room_id);
        let watch = self.store.watch(&path).await?;
        Ok(MessageSubscription::new(
            path.to_string(),
            watch,
            messages_from_snapshot as fn(Option<Value>) -> Vec<Message>,
        ))
    }

    /// ルームのメッセージを購読する（コールバック形式）
    ///
    /// 部屋を切り替える前に、呼び出し側で前のハンドルをキャンセルすること。
    pub async fn subscribe_to_messages<F>(
        &self,
        room_id: &RoomId,
        on_update: F,
    ) -> Result<SubscriptionHandle, GatewayError>
    where
        F: FnMut(Vec<Message>) + Send + 'static,
    {
        Ok(self.watch_messages(room_id).await?.into_callback(on_update))
    }

    fn room_from_directory(&self, room_id: &RoomId) -> ChatRoom {
        ChatRoom {
            id: room_id.clone(),
            name: self.directory.name_for(room_id).to_string(),
            description: self.directory.description_for(room_id).to_string(),
            created_at: Timestamp::new(self.clock.now_millis()),
        }
    }
}
