//! Presence View (community page)
//!
//! Subscribes to every presence record and announces the session user while
//! mounted. Records of clients that exit without unmounting stay `online`.
//!
//! The subscription and both announcements run on spawned tasks, so a store
//! that never answers leaves the page empty instead of blocking the caller.
//! Results from an earlier mount are dropped by generation, like in the chat
//! view.

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};

use hiroba_core::{
    domain::{PresenceRecord, SessionUser},
    usecase::{GatewayError, PresenceGateway, PresenceSubscription, Session},
};

use super::Notice;

const SUBSCRIBE_FAILED_NOTICE: &str = "Could not load the user directory. The chat server may be unavailable.";
const ANNOUNCE_FAILED_NOTICE: &str = "Could not update your online status.";

/// What a call to [`PresenceView::step`] changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceUpdate {
    /// The directory subscription was opened (or failed to open)
    Subscribed { ok: bool },
    /// The session user was announced online (or the write failed)
    Announced { ok: bool },
    /// A new directory snapshot with this many records
    Directory(usize),
    /// The subscription ended without being cancelled
    Disconnected,
    /// A result for a mount the view has left
    Stale,
}

enum PresenceEvent {
    Subscribed {
        generation: u64,
        result: Result<PresenceSubscription, GatewayError>,
    },
    Announced {
        generation: u64,
        user: SessionUser,
        ok: bool,
    },
}

enum Step {
    Event(Option<PresenceEvent>),
    Snapshot(Option<Vec<PresenceRecord>>),
}

/// Community page state
pub struct PresenceView {
    gateway: Arc<PresenceGateway>,
    session: Session,
    records: Vec<PresenceRecord>,
    subscription: Option<PresenceSubscription>,
    /// Online announcement started by this mount; resolves to whether it was written
    announcing: Option<(SessionUser, JoinHandle<bool>)>,
    notice: Option<Notice>,
    generation: u64,
    events_tx: mpsc::UnboundedSender<PresenceEvent>,
    events_rx: mpsc::UnboundedReceiver<PresenceEvent>,
}

impl PresenceView {
    pub fn new(gateway: Arc<PresenceGateway>, session: Session) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            session,
            records: Vec::new(),
            subscription: None,
            announcing: None,
            notice: None,
            generation: 0,
            events_tx,
            events_rx,
        }
    }

    /// Start subscribing to the directory and announcing the session user online
    pub fn mount(&mut self) {
        self.generation += 1;
        self.notice = None;
        let generation = self.generation;

        let gateway = Arc::clone(&self.gateway);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = gateway.watch_presence().await;
            let _ = events.send(PresenceEvent::Subscribed { generation, result });
        });

        if let Some(user) = self.session.current_user() {
            let gateway = Arc::clone(&self.gateway);
            let events = self.events_tx.clone();
            let announced = user.clone();
            let task = tokio::spawn(async move {
                let ok = match gateway.announce_online(&announced).await {
                    Ok(_) => {
                        tracing::info!("'{}' is online", announced.display_name());
                        true
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Announcing '{}' online failed: {}",
                            announced.display_name(),
                            e
                        );
                        false
                    }
                };
                let _ = events.send(PresenceEvent::Announced {
                    generation,
                    user: announced,
                    ok,
                });
                ok
            });
            self.announcing = Some((user, task));
        }
    }

    /// Wait for and apply the next background result or directory snapshot
    pub async fn step(&mut self) -> PresenceUpdate {
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
            Step::Event(None) => PresenceUpdate::Stale,
            Step::Snapshot(Some(records)) => {
                self.records = records;
                PresenceUpdate::Directory(self.records.len())
            }
            Step::Snapshot(None) => {
                tracing::warn!("Presence subscription ended");
                self.subscription = None;
                self.notice = Some(Notice::error(SUBSCRIBE_FAILED_NOTICE));
                PresenceUpdate::Disconnected
            }
        }
    }

    /// Cancel the subscription and mark the announced user offline (best effort)
    ///
    /// The offline write runs in the background once the online announcement
    /// has settled. The returned handle lets the caller wait for it.
    pub fn unmount(&mut self) -> Option<JoinHandle<()>> {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
        }
        self.generation += 1;
        while self.events_rx.try_recv().is_ok() {}

        let (user, announcing) = self.announcing.take()?;
        let gateway = Arc::clone(&self.gateway);
        Some(tokio::spawn(async move {
            if !announcing.await.unwrap_or(false) {
                return;
            }
            match gateway.announce_offline(&user).await {
                Ok(_) => tracing::info!("'{}' is offline", user.display_name()),
                Err(e) => tracing::warn!("Announcing '{}' offline failed: {}", user.display_name(), e),
            }
        }))
    }

    pub fn records(&self) -> &[PresenceRecord] {
        &self.records
    }

    pub fn online_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_online()).count()
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.session.current_user()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn apply_event(&mut self, event: PresenceEvent) -> PresenceUpdate {
        match event {
            PresenceEvent::Subscribed { generation, result } => {
                if generation != self.generation {
                    return PresenceUpdate::Stale;
                }
                match result {
                    Ok(subscription) => {
                        self.subscription = Some(subscription);
                        PresenceUpdate::Subscribed { ok: true }
                    }
                    Err(e) => {
                        tracing::warn!("Presence subscription failed: {}", e);
                        self.notice = Some(Notice::error(SUBSCRIBE_FAILED_NOTICE));
                        PresenceUpdate::Subscribed { ok: false }
                    }
                }
            }
            PresenceEvent::Announced {
                generation,
                user,
                ok,
            } => {
                if generation != self.generation {
                    return PresenceUpdate::Stale;
                }
                if !ok {
                    tracing::debug!("'{}' stays unannounced", user.display_name());
                    self.notice = Some(Notice::error(ANNOUNCE_FAILED_NOTICE));
                }
                PresenceUpdate::Announced { ok }
            }
        }
    }
}

async fn next_snapshot(
    subscription: &mut Option<PresenceSubscription>,
) -> Option<Vec<PresenceRecord>> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}
