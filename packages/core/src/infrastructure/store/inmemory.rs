//! InMemory Realtime Store 実装
//!
//! ドメイン層が定義する RealtimeStore trait の具体的な実装。
//! JSON ツリーをインメモリ DB として使用します。
//!
//! ホスト型データベースと同様に、`null` や空オブジェクトは保存されません
//! （書き込み後に刈り取られます）。ローカルモードとテストの両方で使用し、
//! テスト用に障害注入（オフライン化、書き込み拒否）を提供します。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, mpsc};

use hiroba_shared::time::{Clock, SystemClock};

use crate::domain::{RealtimeStore, StoreError, StorePath, ValueWatch};

use super::push_id::PushIdGenerator;

struct Watcher {
    path: StorePath,
    sender: mpsc::UnboundedSender<Option<Value>>,
}

struct StoreState {
    root: Value,
    watchers: Vec<Watcher>,
    available: bool,
    reject_writes: bool,
    write_count: usize,
}

/// インメモリ Realtime Store 実装
pub struct InMemoryRealtimeStore {
    state: Mutex<StoreState>,
    push_ids: PushIdGenerator,
    clock: Arc<dyn Clock>,
}

impl InMemoryRealtimeStore {
    /// 新しい空の InMemoryRealtimeStore を作成
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// push キーの生成に使う時計を指定して作成
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                root: Value::Null,
                watchers: Vec::new(),
                available: true,
                reject_writes: false,
                write_count: 0,
            }),
            push_ids: PushIdGenerator::new(),
            clock,
        }
    }

    /// オンライン／オフラインを切り替える
    ///
    /// オフラインにすると全ての操作が `Unavailable` になり、既存の購読は切断される。
    pub async fn set_available(&self, available: bool) {
        let mut state = self.state.lock().await;
        state.available = available;
        if !available {
            let dropped = state.watchers.len();
            state.watchers.clear();
            tracing::debug!("In-memory store offline, dropped {} watchers", dropped);
        }
    }

    /// 書き込みを拒否する（権限エラーの再現）
    pub async fn set_reject_writes(&self, reject: bool) {
        self.state.lock().await.reject_writes = reject;
    }

    /// 成功した書き込みの回数
    pub async fn write_count(&self) -> usize {
        self.state.lock().await.write_count
    }

    /// 現在アクティブな購読の数
    pub async fn watcher_count(&self) -> usize {
        let mut state = self.state.lock().await;
        state.watchers.retain(|watcher| !watcher.sender.is_closed());
        state.watchers.len()
    }
}

impl Default for InMemoryRealtimeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeStore for InMemoryRealtimeStore {
    async fn get(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        let state = self.state.lock().await;
        ensure_available(&state)?;
        Ok(value_at(&state.root, path).cloned())
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        ensure_available(&state)?;
        if state.reject_writes {
            return Err(StoreError::Rejected(format!(
                "permission denied writing '{}'",
                path
            )));
        }

        write_at(&mut state.root, path, value);
        prune(&mut state.root);
        state.write_count += 1;
        tracing::trace!("In-memory store wrote '{}'", path);

        let StoreState { root, watchers, .. } = &mut *state;
        let root = &*root;
        watchers.retain(|watcher| {
            if !watcher.path.overlaps(path) {
                return !watcher.sender.is_closed();
            }
            watcher
                .sender
                .send(value_at(root, &watcher.path).cloned())
                .is_ok()
        });

        Ok(())
    }

    fn push_key(&self, _path: &StorePath) -> String {
        self.push_ids.generate(self.clock.now_millis())
    }

    async fn watch(&self, path: &StorePath) -> Result<ValueWatch, StoreError> {
        let mut state = self.state.lock().await;
        ensure_available(&state)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        // 現在の値を即座に配信
        let _ = sender.send(value_at(&state.root, path).cloned());
        state.watchers.push(Watcher {
            path: path.clone(),
            sender,
        });
        tracing::debug!("In-memory store watching '{}'", path);

        Ok(receiver)
    }
}

fn ensure_available(state: &StoreState) -> Result<(), StoreError> {
    if state.available {
        Ok(())
    } else {
        Err(StoreError::Unavailable("in-memory store is offline".to_string()))
    }
}

fn value_at<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = current.as_object()?.get(segment)?;
    }
    (!current.is_null()).then_some(current)
}

fn write_at(root: &mut Value, path: &StorePath, value: Value) {
    let Some((last, parents)) = path.segments().split_last() else {
        *root = value;
        return;
    };

    let mut current = root;
    for segment in parents {
        current = ensure_object(current)
            .entry(segment.clone())
            .or_insert(Value::Null);
    }

    let parent = ensure_object(current);
    if value.is_null() {
        parent.remove(last);
    } else {
        parent.insert(last.clone(), value);
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

/// `null` と空オブジェクトを再帰的に取り除く
fn prune(value: &mut Value) {
    if let Value::Object(map) = value {
        for child in map.values_mut() {
            prune(child);
        }
        map.retain(|_, child| !child.is_null());
        if map.is_empty() {
            *value = Value::Null;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRealtimeStore の読み書きと購読
    // - ホスト型データベースと同じ「null／空オブジェクトは保存しない」挙動
    // - 障害注入（オフライン化、書き込み拒否）
    //
    // 【なぜこのテストが必要か】
    // - ゲートウェイやビューのテストはこのストアを前提に書かれている
    // - 購読の通知漏れはビューの表示不整合に直結する
    // ========================================

    async fn recv(watch: &mut ValueWatch) -> Option<Value> {
        tokio::time::timeout(Duration::from_secs(1), watch.recv())
            .await
            .expect("watch did not deliver in time")
            .expect("watch closed")
    }

    #[tokio::test]
    async fn test_set_then_get_nested_value() {
        // テスト項目: ネストしたパスに書き込んだ値を親パスから取得できる
        // given (前提条件):
        let store = InMemoryRealtimeStore::new();
        let path = StorePath::parse("chatRooms/general/name");

        // when (操作):
        store.set(&path, json!("General")).await.unwrap();

        // then (期待する結果):
        let room = store
            .get(&StorePath::parse("chatRooms/general"))
            .await
            .unwrap();
        assert_eq!(room, Some(json!({"name": "General"})));
        assert_eq!(store.write_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_path_is_none() {
        // テスト項目: 存在しないパスは None になる
        // given (前提条件):
        let store = InMemoryRealtimeStore::new();

        // when (操作):
        let value = store.get(&StorePath::parse("nothing/here")).await.unwrap();

        // then (期待する結果):
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_empty_objects_and_nulls_are_not_stored() {
        // テスト項目: 空オブジェクトは保存されず、null の書き込みは削除になる
        // given (前提条件):
        let store = InMemoryRealtimeStore::new();
        let room = StorePath::parse("chatRooms/general");

        // when (操作):
        store
            .set(&room, json!({"name": "General", "messages": {}}))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(store.get(&room).await.unwrap(), Some(json!({"name": "General"})));

        store.set(&room.child("name"), Value::Null).await.unwrap();
        assert_eq!(store.get(&room).await.unwrap(), None);
        assert_eq!(store.get(&StorePath::root()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_watch_delivers_current_value_then_changes() {
        // テスト項目: 購読すると現在値が即座に届き、その後の変更も届く
        // given (前提条件):
        let store = InMemoryRealtimeStore::new();
        let messages = StorePath::parse("chatRooms/general/messages");
        let mut watch = store.watch(&messages).await.unwrap();

        // when (操作):
        let initial = recv(&mut watch).await;
        store
            .set(&messages.child("k1"), json!({"text": "hi"}))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(initial, None);
        assert_eq!(recv(&mut watch).await, Some(json!({"k1": {"text": "hi"}})));
    }

    #[tokio::test]
    async fn test_watch_ignores_unrelated_paths() {
        // テスト項目: 関係の無いパスへの書き込みは通知されない
        // given (前提条件):
        let store = InMemoryRealtimeStore::new();
        let mut watch = store
            .watch(&StorePath::parse("chatRooms/general/messages"))
            .await
            .unwrap();
        let _ = recv(&mut watch).await;

        // when (操作):
        store
            .set(&StorePath::parse("chatRooms/random/messages/k1"), json!({"text": "x"}))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(watch.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_watch_is_detached() {
        // テスト項目: 受信側を破棄すると購読が解除される
        // given (前提条件):
        let store = InMemoryRealtimeStore::new();
        let watch = store.watch(&StorePath::online_users()).await.unwrap();
        assert_eq!(store.watcher_count().await, 1);

        // when (操作):
        drop(watch);

        // then (期待する結果):
        assert_eq!(store.watcher_count().await, 0);
    }

    #[tokio::test]
    async fn test_offline_store_fails_and_drops_watchers() {
        // テスト項目: オフライン時は全操作が Unavailable になり、購読は切断される
        // given (前提条件):
        let store = InMemoryRealtimeStore::new();
        let mut watch = store.watch(&StorePath::online_users()).await.unwrap();
        let _ = recv(&mut watch).await;

        // when (操作):
        store.set_available(false).await;

        // then (期待する結果):
        assert!(matches!(
            store.get(&StorePath::root()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.set(&StorePath::parse("a"), json!(1)).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.watch(&StorePath::root()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(watch.recv().await, None);
    }

    #[tokio::test]
    async fn test_rejected_writes_leave_data_untouched() {
        // テスト項目: 書き込み拒否時は Rejected が返り、データは変わらない
        // given (前提条件):
        let store = InMemoryRealtimeStore::new();
        store.set_reject_writes(true).await;

        // when (操作):
        let result = store.set(&StorePath::parse("a"), json!(1)).await;

        // then (期待する結果):
        assert!(matches!(result, Err(StoreError::Rejected(_))));
        assert_eq!(store.get(&StorePath::parse("a")).await.unwrap(), None);
        assert_eq!(store.write_count().await, 0);
    }
}
