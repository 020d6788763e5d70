//! Chat View
//!
//! Room switching, the message list and the send form over [`ChatGateway`].
//!
//! ```text
//! Uninitialized --mount--> Initializing --room ready / failed--> Ready
//!       ^                        ^                                 |
//!       |                        +----------- switch_room ---------+
//!       +------------------------- unmount ------------------------+
//! ```
//!
//! Room initialisation, sends and connection tests run on spawned tasks and
//! report back through an event channel. Events carry the generation they
//! were started in; anything from an earlier generation is dropped, so a
//! result for a room the view has left never lands in the current room.

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use hiroba_core::{
    domain::{ChatRoom, Message, MessageStatus, RoomId, SessionUser, Timestamp},
    usecase::{
        ChatGateway, GatewayError, MessageSubscription, NewMessage, SendAttempt, SendRejection,
        Session, validate_send,
    },
};
use hiroba_shared::time::Clock;

use super::Notice;

const SYSTEM_USER: &str = "System";
const CHAT_SYSTEM_USER: &str = "Chat System";
const DEMO_USER: &str = "Demo User";

const LOADING_TEXT: &str = "💬 Chat system is loading...";
const WELCOME_TEXT: &str = "🎉 Welcome to Hiroba! Your conversations, your way. Start chatting, share moments, or explore new connections. It's all just a message away.";
const OFFLINE_TEXT: &str =
    "⚠️ Chat initialized in offline mode. You can still send messages - they'll be saved locally!";
const DEMO_TEXT: &str = "Hello! This is a test message. If you can see this, the chat is working!";

const INIT_FAILED_NOTICE: &str = "Failed to initialize chat. Please restart the client.";
const SWITCH_FAILED_NOTICE: &str = "Failed to switch chat room. Please try again.";
const SAVED_LOCALLY_NOTICE: &str = "Message saved locally. The chat server may be unavailable.";
const DEMO_ADDED_NOTICE: &str = "Demo message added successfully!";
const CONNECTION_OK_NOTICE: &str = "Connection successful!";
const CONNECTION_FAILED_NOTICE: &str = "Connection failed. Using local storage.";
const DISCONNECTED_NOTICE: &str = "Lost connection to the chat server. Messages will be saved locally.";

/// Per-room lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Uninitialized,
    Initializing,
    Ready,
}

/// What a call to [`ChatView::step`] changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatUpdate {
    /// Initialisation finished (`offline` when it failed)
    RoomReady { room_id: RoomId, offline: bool },
    /// A new snapshot of the room's messages
    Messages,
    /// The store accepted a message
    Sent(Message),
    /// The store refused a message; it is kept locally
    SavedLocally(Message),
    ConnectionTested { ok: bool },
    /// The subscription ended without being cancelled
    Disconnected,
    /// A result for a room the view has left
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitKind {
    Mount,
    Switch,
}

enum ChatEvent {
    RoomInitialized {
        generation: u64,
        kind: InitKind,
        result: Result<(ChatRoom, MessageSubscription), GatewayError>,
    },
    SendFinished {
        generation: u64,
        draft: NewMessage,
        result: Result<Message, GatewayError>,
    },
    ConnectionTested {
        result: Result<ChatRoom, GatewayError>,
    },
}

enum Step {
    Event(Option<ChatEvent>),
    Snapshot(Option<Vec<Message>>),
}

/// Chat page state
pub struct ChatView {
    gateway: Arc<ChatGateway>,
    session: Session,
    clock: Arc<dyn Clock>,
    room_id: RoomId,
    phase: ChatPhase,
    offline: bool,
    notice: Option<Notice>,
    /// Latest store snapshot, ascending by timestamp
    snapshot: Vec<Message>,
    /// `local` and `demo` messages of the current room
    client_only: Vec<Message>,
    sending: bool,
    testing: bool,
    last_attempt_at: Option<i64>,
    generation: u64,
    subscription: Option<MessageSubscription>,
    events_tx: mpsc::UnboundedSender<ChatEvent>,
    events_rx: mpsc::UnboundedReceiver<ChatEvent>,
}

impl ChatView {
    pub fn new(gateway: Arc<ChatGateway>, session: Session, clock: Arc<dyn Clock>) -> Self {
        let room_id = gateway.directory().default_room();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            session,
            clock,
            room_id,
            phase: ChatPhase::Uninitialized,
            offline: false,
            notice: None,
            snapshot: Vec::new(),
            client_only: Vec::new(),
            sending: false,
            testing: false,
            last_attempt_at: None,
            generation: 0,
            subscription: None,
            events_tx,
            events_rx,
        }
    }

    /// Show the loading message and start initialising the current room
    pub fn mount(&mut self) {
        self.reset_room_state();
        let loading = self.client_message(SYSTEM_USER, LOADING_TEXT, MessageStatus::Demo);
        self.client_only.push(loading);
        self.start_initialization(InitKind::Mount);
    }

    /// Leave the current room and initialise `room_id`
    pub fn switch_room(&mut self, room_id: RoomId) {
        self.cancel_subscription();
        tracing::info!("Switching room '{}' -> '{}'", self.room_id, room_id);
        self.room_id = room_id;
        self.reset_room_state();
        self.start_initialization(InitKind::Switch);
    }

    /// Release the subscription and drop every pending result
    pub fn unmount(&mut self) {
        self.cancel_subscription();
        self.generation += 1;
        while self.events_rx.try_recv().is_ok() {}
        self.phase = ChatPhase::Uninitialized;
        self.sending = false;
        self.testing = false;
    }

    /// Run the send gate and, if it passes, append the message in the background
    pub fn send(&mut self, draft: &str) -> Result<(), SendRejection> {
        let user = self.session.current_user();
        let now = self.clock.now_millis();
        let attempt = SendAttempt {
            draft,
            user: user.as_ref(),
            in_flight: self.sending,
            last_attempt_at: self.last_attempt_at,
            now,
        };

        let new_message = match validate_send(&attempt) {
            Ok(new_message) => new_message,
            Err(rejection) => {
                if rejection.is_silent() {
                    tracing::debug!("Send ignored: {}", rejection);
                } else {
                    tracing::debug!("Send blocked: {}", rejection);
                    self.notice = Some(Notice::error(rejection.to_string()));
                }
                return Err(rejection);
            }
        };

        self.last_attempt_at = Some(now);
        self.sending = true;
        self.notice = None;

        let gateway = Arc::clone(&self.gateway);
        let events = self.events_tx.clone();
        let room_id = self.room_id.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = gateway.append_message(&room_id, new_message.clone()).await;
            let _ = events.send(ChatEvent::SendFinished {
                generation,
                draft: new_message,
                result,
            });
        });
        Ok(())
    }

    /// Append a synthetic demo message to the current room's view
    pub fn add_demo_message(&mut self) {
        let message = self.client_message(DEMO_USER, DEMO_TEXT, MessageStatus::Demo);
        self.client_only.push(message);
        self.notice = Some(Notice::info(DEMO_ADDED_NOTICE));
    }

    /// Check that the store is reachable by ensuring the default room exists
    pub fn test_connection(&mut self) {
        if self.testing {
            return;
        }
        self.testing = true;
        self.notice = None;

        let gateway = Arc::clone(&self.gateway);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let general = gateway.directory().default_room();
            let result = gateway.ensure_room_exists(&general).await;
            let _ = events.send(ChatEvent::ConnectionTested { result });
        });
    }

    /// Wait for and apply the next background result or snapshot
    pub async fn step(&mut self) -> ChatUpdate {
        let next = {
            let events = &mut self.events_rx;
            let subscription = &mut self.subscription;
            tokio::select! {
                event = events.recv() => Step::Event(event),
                snapshot = next_snapshot(subscription) => Step::Snapshot(snapshot),
            }
        };

        match next {
            Step::Event(Some(event)) => self.apply_event(event),
            Step::Event(None) => ChatUpdate::Stale,
            Step::Snapshot(Some(messages)) => {
                self.snapshot = messages;
                ChatUpdate::Messages
            }
            Step::Snapshot(None) => {
                tracing::warn!("Message subscription of room '{}' ended", self.room_id);
                self.subscription = None;
                self.offline = true;
                self.notice = Some(Notice::error(DISCONNECTED_NOTICE));
                ChatUpdate::Disconnected
            }
        }
    }

    /// The send-button rule: something to send and no send in flight
    pub fn can_send(&self, draft: &str) -> bool {
        !draft.trim().is_empty() && !self.sending
    }

    /// Displayed messages: the snapshot merged with client-only messages by timestamp
    pub fn messages(&self) -> Vec<Message> {
        let mut merged: Vec<Message> = self
            .snapshot
            .iter()
            .chain(self.client_only.iter())
            .cloned()
            .collect();
        merged.sort_by_key(|message| message.timestamp);
        merged
    }

    pub fn message_count(&self) -> usize {
        self.snapshot.len() + self.client_only.len()
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn room_name(&self) -> &'static str {
        self.gateway.directory().name_for(&self.room_id)
    }

    pub fn room_description(&self) -> &'static str {
        self.gateway.directory().description_for(&self.room_id)
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.session.current_user()
    }

    fn apply_event(&mut self, event: ChatEvent) -> ChatUpdate {
        match event {
            ChatEvent::RoomInitialized {
                generation,
                kind,
                result,
            } => {
                if generation != self.generation {
                    return ChatUpdate::Stale;
                }
                self.phase = ChatPhase::Ready;
                match result {
                    Ok((room, subscription)) => {
                        tracing::info!("Room '{}' ready", room.id);
                        self.subscription = Some(subscription);
                        self.offline = false;
                        self.drop_placeholders();
                        if kind == InitKind::Mount {
                            let welcome = self.client_message(
                                CHAT_SYSTEM_USER,
                                WELCOME_TEXT,
                                MessageStatus::Demo,
                            );
                            self.client_only.push(welcome);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Room '{}' failed to initialise: {}", self.room_id, e);
                        self.offline = true;
                        self.drop_placeholders();
                        match kind {
                            InitKind::Mount => {
                                self.notice = Some(Notice::error(INIT_FAILED_NOTICE));
                                let offline = self.client_message(
                                    CHAT_SYSTEM_USER,
                                    OFFLINE_TEXT,
                                    MessageStatus::Demo,
                                );
                                self.client_only.push(offline);
                            }
                            InitKind::Switch => {
                                self.notice = Some(Notice::error(SWITCH_FAILED_NOTICE));
                            }
                        }
                    }
                }
                ChatUpdate::RoomReady {
                    room_id: self.room_id.clone(),
                    offline: self.offline,
                }
            }
            ChatEvent::SendFinished {
                generation,
                draft,
                result,
            } => {
                self.sending = false;
                if generation != self.generation {
                    return ChatUpdate::Stale;
                }
                match result {
                    Ok(message) => {
                        if self.subscription.is_some() {
                            self.offline = false;
                        }
                        ChatUpdate::Sent(message)
                    }
                    Err(e) => {
                        tracing::warn!("Send failed, keeping message locally: {}", e);
                        let local = self.client_message(
                            draft.user,
                            draft.text.into_string(),
                            MessageStatus::Local,
                        );
                        self.client_only.push(local.clone());
                        self.offline = true;
                        self.notice = Some(Notice::error(SAVED_LOCALLY_NOTICE));
                        ChatUpdate::SavedLocally(local)
                    }
                }
            }
            ChatEvent::ConnectionTested { result } => {
                self.testing = false;
                let ok = match result {
                    Ok(_) => {
                        self.notice = Some(Notice::info(CONNECTION_OK_NOTICE));
                        true
                    }
                    Err(e) => {
                        tracing::warn!("Connection test failed: {}", e);
                        self.notice = Some(Notice::error(CONNECTION_FAILED_NOTICE));
                        false
                    }
                };
                ChatUpdate::ConnectionTested { ok }
            }
        }
    }

    fn start_initialization(&mut self, kind: InitKind) {
        self.generation += 1;
        self.phase = ChatPhase::Initializing;

        let gateway = Arc::clone(&self.gateway);
        let events = self.events_tx.clone();
        let room_id = self.room_id.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = async {
                let room = gateway.ensure_room_exists(&room_id).await?;
                let subscription = gateway.watch_messages(&room_id).await?;
                Ok::<_, GatewayError>((room, subscription))
            }
            .await;
            let _ = events.send(ChatEvent::RoomInitialized {
                generation,
                kind,
                result,
            });
        });
    }

    fn reset_room_state(&mut self) {
        self.snapshot.clear();
        self.client_only.clear();
        self.notice = None;
    }

    /// Drop the loading message but keep messages the user sent while the room was initialising
    fn drop_placeholders(&mut self) {
        self.client_only.retain(|message| message.status == MessageStatus::Local);
    }

    fn cancel_subscription(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }

    fn client_message(
        &self,
        user: impl Into<String>,
        text: impl Into<String>,
        status: MessageStatus,
    ) -> Message {
        Message::client_only(
            format!("{:?}-{}", status, Uuid::new_v4()).to_lowercase(),
            user,
            text,
            Timestamp::new(self.clock.now_millis()),
            status,
        )
    }
}

async fn next_snapshot(subscription: &mut Option<MessageSubscription>) -> Option<Vec<Message>> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}
