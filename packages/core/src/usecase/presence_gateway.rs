//! UseCase: プレゼンスゲートウェイ
//!
//! `onlineUsers/{userKey}` にユーザーごとのオンライン状態を書き込み、
//! `onlineUsers` 全体を購読します。
//!
//! 切断検知（ハートビートや有効期限）は行いません。異常終了したクライアントの
//! レコードは `online` のまま残ります。

use std::sync::Arc;

use hiroba_shared::time::Clock;
use serde_json::Value;

use crate::domain::{
    PresenceKey, PresenceRecord, PresenceStatus, RealtimeStore, SessionUser, StorePath,
    Timestamp,
    record::{PresenceRecordDto, presence_from_snapshot},
};

use super::{
    error::GatewayError,
    subscription::{PresenceSubscription, SubscriptionHandle},
};

/// プレゼンスゲートウェイ
pub struct PresenceGateway {
    store: Arc<dyn RealtimeStore>,
    clock: Arc<dyn Clock>,
}

impl PresenceGateway {
    pub fn new(store: Arc<dyn RealtimeStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// プレゼンスレコードを upsert する
    pub async fn set_presence(
        &self,
        key: &PresenceKey,
        record: &PresenceRecord,
    ) -> Result<(), GatewayError> {
        let value = serde_json::to_value(PresenceRecordDto::from(record))
            .map_err(|e| GatewayError::WriteRejected(e.to_string()))?;
        self.store.set(&StorePath::presence(key), value).await?;
        tracing::debug!("Presence of '{}' set to {:?}", key, record.status);
        Ok(())
    }

    /// ユーザーをオンラインとして記録する
    pub async fn announce_online(&self, user: &SessionUser) -> Result<PresenceRecord, GatewayError> {
        self.announce(user, PresenceStatus::Online).await
    }

    /// ユーザーをオフラインとして記録する（ベストエフォート）
    pub async fn announce_offline(
        &self,
        user: &SessionUser,
    ) -> Result<PresenceRecord, GatewayError> {
        self.announce(user, PresenceStatus::Offline).await
    }

    /// 全ユーザーのプレゼンスを購読する（ストリーム形式）
    pub async fn watch_presence(&self) -> Result<PresenceSubscription, GatewayError> {
        let path = StorePath::online_users();
        let watch = self.store.watch(&path).await?;
        Ok(PresenceSubscription::new(
            path.to_string(),
            watch,
            presence_from_snapshot as fn(Option<Value>) -> Vec<PresenceRecord>,
        ))
    }

    /// 全ユーザーのプレゼンスを購読する（コールバック形式）
    pub async fn subscribe_to_presence<F>(
        &self,
        on_update: F,
    ) -> Result<SubscriptionHandle, GatewayError>
    where
        F: FnMut(Vec<PresenceRecord>) + Send + 'static,
    {
        Ok(self.watch_presence().await?.into_callback(on_update))
    }

    async fn announce(
        &self,
        user: &SessionUser,
        status: PresenceStatus,
    ) -> Result<PresenceRecord, GatewayError> {
        let record = PresenceRecord {
            username: user.display_name().to_string(),
            email: user.email.clone(),
            last_seen: Timestamp::new(self.clock.now_millis()),
            status,
        };
        self.set_presence(&PresenceKey::for_user(user), &record)
            .await?;
        Ok(record)
    }
}
