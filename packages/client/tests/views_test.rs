//! Integration tests driving the chat and community views against a shared
//! in-memory store.

use std::{sync::Arc, time::Duration};

use hiroba_client::view::{ChatPhase, ChatUpdate, ChatView, PresenceUpdate, PresenceView};
use hiroba_core::{
    domain::{MessageStatus, RoomId},
    infrastructure::{session_storage::InMemorySessionStorage, store::InMemoryRealtimeStore},
    usecase::{ChatGateway, PresenceGateway, SendRejection, Session},
};
use hiroba_shared::time::{Clock, ManualClock};

const STEP_TIMEOUT: Duration = Duration::from_secs(2);

/// Shared backend standing in for the hosted database
struct TestBackend {
    store: Arc<InMemoryRealtimeStore>,
    clock: ManualClock,
}

impl TestBackend {
    fn new() -> Self {
        let clock = ManualClock::new(1_700_000_000_000);
        let store = Arc::new(InMemoryRealtimeStore::with_clock(Arc::new(clock.clone())));
        Self { store, clock }
    }

    fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(self.clock.clone())
    }

    /// A logged-in session with its own local storage
    fn session(&self, username: &str) -> Session {
        let session =
            Session::restore(Arc::new(InMemorySessionStorage::new()), self.clock()).unwrap();
        session
            .signup(username, &format!("{}@example.com", username))
            .unwrap();
        session
    }

    fn chat_view(&self, username: &str) -> ChatView {
        let gateway = Arc::new(ChatGateway::new(self.store.clone(), self.clock()));
        ChatView::new(gateway, self.session(username), self.clock())
    }

    fn presence_view(&self, session: Session) -> PresenceView {
        let gateway = Arc::new(PresenceGateway::new(self.store.clone(), self.clock()));
        PresenceView::new(gateway, session)
    }
}

async fn step(view: &mut ChatView) -> ChatUpdate {
    tokio::time::timeout(STEP_TIMEOUT, view.step())
        .await
        .expect("chat view did not update in time")
}

/// Step until the view is ready and has applied its first snapshot
async fn mount_ready(view: &mut ChatView) {
    view.mount();
    let update = step(view).await;
    assert!(matches!(update, ChatUpdate::RoomReady { .. }));
    assert_eq!(step(view).await, ChatUpdate::Messages);
}

/// Step until `predicate` holds for the displayed messages
async fn step_until<F>(view: &mut ChatView, predicate: F)
where
    F: Fn(&ChatView) -> bool,
{
    while !predicate(view) {
        step(view).await;
    }
}

fn texts(view: &ChatView) -> Vec<String> {
    view.messages().into_iter().map(|message| message.text).collect()
}

#[tokio::test]
async fn test_two_clients_in_same_room_see_each_other() {
    // テスト項目: 同じルームの 2 クライアントが互いのメッセージを受信する
    // given (前提条件):
    let backend = TestBackend::new();
    let mut alice = backend.chat_view("alice");
    let mut bob = backend.chat_view("bob");
    mount_ready(&mut alice).await;
    mount_ready(&mut bob).await;

    // when (操作):
    alice.send("Hello, Bob!").unwrap();
    step_until(&mut alice, |view| !view.is_sending()).await;

    // then (期待する結果):
    step_until(&mut bob, |view| {
        texts(view).contains(&"Hello, Bob!".to_string())
    })
    .await;
    let received = bob
        .messages()
        .into_iter()
        .find(|message| message.text == "Hello, Bob!")
        .unwrap();
    assert_eq!(received.user, "alice");
    assert_eq!(received.status, MessageStatus::Sent);
    assert_eq!(backend.store.watcher_count().await, 2);
}

#[tokio::test]
async fn test_room_switch_isolates_rooms() {
    // テスト項目: ルームを切り替えると前のルームのメッセージは届かない
    // given (前提条件):
    let backend = TestBackend::new();
    let mut alice = backend.chat_view("alice");
    let mut bob = backend.chat_view("bob");
    mount_ready(&mut alice).await;
    mount_ready(&mut bob).await;

    // when (操作):
    bob.switch_room(RoomId::new("tech").unwrap());
    let update = step(&mut bob).await;
    assert_eq!(step(&mut bob).await, ChatUpdate::Messages);
    alice.send("general only").unwrap();
    step_until(&mut alice, |view| !view.is_sending()).await;
    backend.clock.advance(1_000);
    bob.send("tech only").unwrap();
    step_until(&mut bob, |view| {
        texts(view).contains(&"tech only".to_string())
    })
    .await;

    // then (期待する結果):
    assert_eq!(
        update,
        ChatUpdate::RoomReady {
            room_id: RoomId::new("tech").unwrap(),
            offline: false,
        }
    );
    assert_eq!(bob.room_name(), "Tech Talk");
    assert_eq!(texts(&bob), vec!["tech only".to_string()]);
    assert_eq!(backend.store.watcher_count().await, 2);
}

#[tokio::test]
async fn test_failed_write_keeps_message_locally() {
    // テスト項目: 書き込みに失敗したメッセージは local としてビューに残り、入力は続けられる
    // given (前提条件):
    let backend = TestBackend::new();
    let mut alice = backend.chat_view("alice");
    mount_ready(&mut alice).await;
    backend.store.set_reject_writes(true).await;

    // when (操作):
    alice.send("kept locally").unwrap();
    let update = step(&mut alice).await;

    // then (期待する結果):
    let ChatUpdate::SavedLocally(local) = update else {
        panic!("expected a local fallback, got {:?}", update);
    };
    assert_eq!(local.status, MessageStatus::Local);
    assert_eq!(local.text, "kept locally");
    assert!(alice.is_offline());
    assert!(alice.can_send("next message"));
    assert!(alice.messages().iter().any(|message| message.id == local.id));
    assert!(
        alice
            .notice()
            .is_some_and(|notice| notice.text.starts_with("Message saved locally"))
    );
}

#[tokio::test]
async fn test_offline_store_degrades_to_local_mode() {
    // テスト項目: store に到達できない場合もビューは Ready になり、オフラインモードで使える
    // given (前提条件):
    let backend = TestBackend::new();
    backend.store.set_available(false).await;
    let mut alice = backend.chat_view("alice");

    // when (操作):
    alice.mount();
    let update = step(&mut alice).await;

    // then (期待する結果):
    assert!(matches!(update, ChatUpdate::RoomReady { offline: true, .. }));
    assert_eq!(alice.phase(), ChatPhase::Ready);
    assert!(alice.is_offline());
    assert!(texts(&alice)[0].contains("offline mode"));

    // when (操作):
    alice.send("still typing").unwrap();
    let update = step(&mut alice).await;

    // then (期待する結果):
    assert!(matches!(update, ChatUpdate::SavedLocally(_)));
}

#[tokio::test]
async fn test_rate_limit_between_sends() {
    // テスト項目: 1000ms 以内の連続送信は拒否され、経過後は送信できる
    // given (前提条件):
    let backend = TestBackend::new();
    let mut alice = backend.chat_view("alice");
    mount_ready(&mut alice).await;
    alice.send("first").unwrap();
    step_until(&mut alice, |view| !view.is_sending()).await;

    // when (操作):
    backend.clock.advance(999);
    let too_soon = alice.send("second");
    backend.clock.advance(1);
    let allowed = alice.send("second");

    // then (期待する結果):
    assert_eq!(too_soon, Err(SendRejection::RateLimited));
    assert!(allowed.is_ok());
    assert_eq!(alice.send("third"), Err(SendRejection::AlreadySending));
}

#[tokio::test]
async fn test_ensure_room_is_written_once_across_clients() {
    // テスト項目: 2 つのクライアントが同じルームを開いてもルームの作成は 1 回だけ
    // given (前提条件):
    let backend = TestBackend::new();
    let mut alice = backend.chat_view("alice");
    let mut bob = backend.chat_view("bob");

    // when (操作):
    mount_ready(&mut alice).await;
    mount_ready(&mut bob).await;

    // then (期待する結果):
    assert_eq!(backend.store.write_count().await, 1);
}

#[tokio::test]
async fn test_unmount_releases_subscription() {
    // テスト項目: アンマウントで購読が解除される
    // given (前提条件):
    let backend = TestBackend::new();
    let mut alice = backend.chat_view("alice");
    mount_ready(&mut alice).await;

    // when (操作):
    alice.unmount();

    // then (期待する結果):
    assert_eq!(backend.store.watcher_count().await, 0);
    assert_eq!(alice.phase(), ChatPhase::Uninitialized);
}

#[tokio::test]
async fn test_presence_directory_between_clients() {
    // テスト項目: コミュニティページで他のユーザーのオンライン状態が見える
    // given (前提条件):
    let backend = TestBackend::new();
    let mut observer = backend.presence_view(backend.session("carol"));
    observer.mount();
    let mut alice = backend.presence_view(backend.session("alice"));

    // when (操作):
    alice.mount();
    while observer.online_count() < 2 {
        let update = tokio::time::timeout(STEP_TIMEOUT, observer.step())
            .await
            .unwrap();
        assert_ne!(update, PresenceUpdate::Disconnected);
    }
    alice
        .unmount()
        .expect("alice was announced online")
        .await
        .unwrap();
    while observer.online_count() > 1 {
        tokio::time::timeout(STEP_TIMEOUT, observer.step())
            .await
            .unwrap();
    }

    // then (期待する結果):
    assert_eq!(observer.records().len(), 2);
    let alice_record = observer
        .records()
        .iter()
        .find(|record| record.username == "alice")
        .unwrap();
    assert!(!alice_record.is_online());
}
