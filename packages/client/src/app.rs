//! Interactive loop of the terminal client.
//!
//! A blocking `rustyline` thread feeds input lines into a channel; the loop
//! selects over those lines and the active view's next update.

use std::{collections::HashSet, sync::Arc, time::Duration};

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use hiroba_core::{
    domain::{Message, RealtimeStore, RoomDirectory, RoomId},
    infrastructure::{
        session_storage::FileSessionStorage,
        store::{InMemoryRealtimeStore, RestRealtimeStore},
    },
    usecase::{ChatGateway, PresenceGateway, Session, SessionError},
};
use hiroba_shared::time::{Clock, SystemClock};

use crate::{
    command::Command,
    config::Config,
    error::ClientError,
    formatter::PageFormatter,
    route::Route,
    ui::Prompt,
    view::{ChatUpdate, ChatView, PresenceUpdate, PresenceView},
};

/// How long exiting waits for the offline status write of the community page
const EXIT_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

enum Page {
    Chat(ChatView),
    Community(PresenceView),
    Static,
}

enum PageUpdate {
    Chat(ChatUpdate),
    Community(PresenceUpdate),
}

enum AppEvent {
    Input(Option<String>),
    Page(PageUpdate),
}

impl Page {
    async fn step(&mut self) -> PageUpdate {
        match self {
            Page::Chat(view) => PageUpdate::Chat(view.step().await),
            Page::Community(view) => PageUpdate::Community(view.step().await),
            Page::Static => std::future::pending().await,
        }
    }
}

struct App {
    chat: Arc<ChatGateway>,
    presence: Arc<PresenceGateway>,
    session: Session,
    clock: Arc<dyn Clock>,
    route: Route,
    page: Page,
    /// Message IDs already printed for the current room
    printed: HashSet<String>,
}

/// Run the client until the user quits
pub async fn run_app(config: Config) -> Result<(), ClientError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = build_store(&config, &clock)?;
    let storage = FileSessionStorage::open(config.storage_path()).map_err(SessionError::from)?;
    tracing::debug!("Session storage at {}", storage.path().display());
    let session = Session::restore(Arc::new(storage), Arc::clone(&clock))?;

    let mut app = App {
        chat: Arc::new(ChatGateway::new(Arc::clone(&store), Arc::clone(&clock))),
        presence: Arc::new(PresenceGateway::new(store, Arc::clone(&clock))),
        session,
        clock,
        route: config.start_route,
        page: Page::Static,
        printed: HashSet::new(),
    };

    println!("\nType /help for commands. Press Ctrl+C to exit.");
    app.navigate(config.start_route);

    let prompt = Prompt::new(app.prompt_text());
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    spawn_input_thread(prompt.clone(), input_tx).await?;

    loop {
        let event = tokio::select! {
            line = input_rx.recv() => AppEvent::Input(line),
            update = app.page.step() => AppEvent::Page(update),
        };

        match event {
            AppEvent::Input(None) => break,
            AppEvent::Input(Some(line)) => {
                if app.handle_line(&line) == Flow::Quit {
                    break;
                }
                prompt.set(app.prompt_text());
            }
            AppEvent::Page(update) => {
                app.apply_update(update);
                prompt.set(app.prompt_text());
                prompt.redisplay();
            }
        }
    }

    if let Some(offline) = app.leave_page()
        && tokio::time::timeout(EXIT_GRACE, offline).await.is_err()
    {
        tracing::warn!("Gave up waiting for the offline status write");
    }
    println!();
    tracing::info!("Bye");
    Ok(())
}

fn build_store(
    config: &Config,
    clock: &Arc<dyn Clock>,
) -> Result<Arc<dyn RealtimeStore>, ClientError> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Using realtime database at {}", url);
            let store = RestRealtimeStore::new(url.clone(), config.auth_token.clone())?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("No database URL configured, messages stay in this process");
            Ok(Arc::new(InMemoryRealtimeStore::with_clock(Arc::clone(clock))))
        }
    }
}

async fn spawn_input_thread(
    prompt: Prompt,
    input_tx: mpsc::UnboundedSender<String>,
) -> Result<(), ClientError> {
    let (ready_tx, ready_rx) = oneshot::channel();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => {
                let _ = ready_tx.send(Ok(()));
                rl
            }
            Err(e) => {
                let _ = ready_tx.send(Err(ClientError::Readline(e.to_string())));
                return;
            }
        };

        loop {
            match rl.readline(&prompt.get()) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    ready_rx
        .await
        .map_err(|_| ClientError::Readline("input thread exited".to_string()))?
}

impl App {
    fn handle_line(&mut self, line: &str) -> Flow {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                return Flow::Continue;
            }
        };

        match command {
            Command::Go(path) => match Route::parse(&path) {
                Ok(route) => self.navigate(route),
                Err(e) => println!("{}", e),
            },
            Command::Login(identifier) => match self.session.login(&identifier) {
                Ok(user) => {
                    println!("Logged in as {}", user.display_name());
                    self.navigate(Route::Chat);
                }
                Err(e) => println!("{}", e),
            },
            Command::Signup { username, email } => match self.session.signup(&username, &email) {
                Ok(user) => {
                    println!("Welcome, {}!", user.display_name());
                    self.navigate(Route::Chat);
                }
                Err(e) => println!("{}", e),
            },
            Command::Logout => {
                self.leave_page();
                match self.session.logout() {
                    Ok(()) => println!("Logged out"),
                    Err(e) => println!("{}", e),
                }
                self.navigate(Route::Home);
            }
            Command::Room(room_id) => self.switch_room(&room_id),
            Command::Rooms => {
                let selected = match &self.page {
                    Page::Chat(view) => view.room_id().clone(),
                    _ => RoomDirectory.default_room(),
                };
                print!("{}", PageFormatter::format_rooms(&RoomDirectory, &selected));
            }
            Command::Demo => match &mut self.page {
                Page::Chat(view) => {
                    view.add_demo_message();
                    let demo = view.messages().into_iter().last();
                    if let Some(message) = demo {
                        println!("{}", PageFormatter::format_message(&message));
                        self.printed.insert(message.id);
                    }
                    print_notice(view.notice());
                }
                _ => println!("Demo messages are only available on the chat page."),
            },
            Command::Test => match &mut self.page {
                Page::Chat(view) => {
                    println!("Testing connection...");
                    view.test_connection();
                }
                _ => println!("Connection tests are only available on the chat page."),
            },
            Command::Help => print!("{}", PageFormatter::format_help()),
            Command::Quit => return Flow::Quit,
            Command::Say(text) => match &mut self.page {
                Page::Chat(view) => {
                    if view.send(&text).is_err() {
                        print_notice(view.notice());
                    }
                }
                _ => println!("Open the chat page with /go /chat to send messages."),
            },
        }
        Flow::Continue
    }

    fn apply_update(&mut self, update: PageUpdate) {
        match update {
            PageUpdate::Chat(update) => self.apply_chat_update(update),
            PageUpdate::Community(PresenceUpdate::Directory(_)) => self.render_community(),
            PageUpdate::Community(
                PresenceUpdate::Subscribed { ok: false }
                | PresenceUpdate::Announced { ok: false }
                | PresenceUpdate::Disconnected,
            ) => {
                if let Page::Community(view) = &self.page {
                    print_notice(view.notice());
                }
            }
            PageUpdate::Community(_) => {}
        }
    }

    fn apply_chat_update(&mut self, update: ChatUpdate) {
        let Page::Chat(view) = &self.page else {
            return;
        };
        match update {
            ChatUpdate::RoomReady { .. } => self.render_chat(),
            ChatUpdate::Messages | ChatUpdate::SavedLocally(_) => {
                let messages = view.messages();
                let notice = view.notice().cloned();
                for message in &messages {
                    if !self.printed.contains(&message.id) {
                        self.print_message(message);
                    }
                }
                print_notice(notice.as_ref());
            }
            ChatUpdate::Sent(message) => {
                tracing::debug!("Message {} accepted", message.id);
            }
            ChatUpdate::ConnectionTested { .. } | ChatUpdate::Disconnected => {
                print_notice(view.notice());
            }
            ChatUpdate::Stale => {}
        }
    }

    fn navigate(&mut self, route: Route) {
        let route = route.resolve(self.session.is_logged_in());
        self.leave_page();
        self.route = route;
        print!(
            "{}",
            PageFormatter::format_nav(self.session.is_logged_in(), route)
        );

        match route {
            Route::Chat => {
                let mut view = ChatView::new(
                    Arc::clone(&self.chat),
                    self.session.clone(),
                    Arc::clone(&self.clock),
                );
                view.mount();
                self.page = Page::Chat(view);
                self.render_chat();
            }
            Route::Community => {
                let mut view = PresenceView::new(Arc::clone(&self.presence), self.session.clone());
                view.mount();
                self.page = Page::Community(view);
                self.render_community();
            }
            Route::Home => print!("{}", PageFormatter::format_home()),
            Route::Login => print!("{}", PageFormatter::format_login()),
            Route::Signup => print!("{}", PageFormatter::format_signup()),
            Route::Profile => {
                let registered_at = match self.session.current_registration() {
                    Ok(registration) => registration.map(|user| user.registered_at),
                    Err(e) => {
                        tracing::warn!("Could not read the registered users: {}", e);
                        None
                    }
                };
                print!(
                    "{}",
                    PageFormatter::format_profile(
                        self.session.current_user().as_ref(),
                        registered_at
                    )
                );
            }
        }
    }

    /// Unmount the current page; the handle tracks a pending offline status write
    fn leave_page(&mut self) -> Option<JoinHandle<()>> {
        self.printed.clear();
        match std::mem::replace(&mut self.page, Page::Static) {
            Page::Chat(mut view) => {
                view.unmount();
                None
            }
            Page::Community(mut view) => view.unmount(),
            Page::Static => None,
        }
    }

    fn switch_room(&mut self, room_id: &str) {
        let Page::Chat(view) = &mut self.page else {
            println!("Open the chat page with /go /chat first.");
            return;
        };
        match RoomId::new(room_id) {
            Ok(room_id) => {
                view.switch_room(room_id);
                self.printed.clear();
                println!("Switching to {}...", view.room_name());
            }
            Err(e) => println!("{}", e),
        }
    }

    fn render_chat(&mut self) {
        let Page::Chat(view) = &self.page else {
            return;
        };
        let user = view.current_user();
        let messages = view.messages();
        let notice = view.notice().cloned();
        print!(
            "{}",
            PageFormatter::format_chat_header(
                view.room_name(),
                view.room_description(),
                view.room_id(),
                view.message_count(),
                user.as_ref(),
                view.is_offline(),
            )
        );
        print!("{}", PageFormatter::format_messages(&messages));
        self.printed = messages.iter().map(|message| message.id.clone()).collect();
        print_notice(notice.as_ref());
    }

    fn render_community(&self) {
        if let Page::Community(view) = &self.page {
            print!(
                "{}",
                PageFormatter::format_community(
                    view.records(),
                    view.online_count(),
                    view.current_user().as_ref(),
                    self.clock.now_millis(),
                )
            );
            print_notice(view.notice());
        }
    }

    fn print_message(&mut self, message: &Message) {
        println!("{}", PageFormatter::format_message(message));
        self.printed.insert(message.id.clone());
    }

    fn prompt_text(&self) -> String {
        let name = self
            .session
            .current_user()
            .map(|user| user.display_name().to_string())
            .unwrap_or_else(|| "guest".to_string());
        match &self.page {
            Page::Chat(view) => format!("{}@{}> ", name, view.room_id()),
            _ => format!("{}{}> ", name, self.route),
        }
    }
}

fn print_notice(notice: Option<&crate::view::Notice>) {
    if let Some(notice) = notice {
        print!("{}", PageFormatter::format_notice(notice));
    }
}
