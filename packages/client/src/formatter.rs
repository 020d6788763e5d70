//! Page formatting utilities for terminal display.

use hiroba_core::domain::{
    Message, MessageStatus, PresenceRecord, RoomDirectory, RoomId, SessionUser, Timestamp,
};
use hiroba_shared::time::{format_clock_time, format_last_seen, timestamp_to_rfc3339};

use crate::{
    route::{NavLink, Route, nav_links},
    view::{Notice, NoticeKind},
};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

const FEATURES: [(&str, &str); 3] = [
    (
        "Real-time Messaging",
        "Send and receive messages instantly with a realtime database backend.",
    ),
    (
        "User Authentication",
        "Login and signup for a personalized experience.",
    ),
    (
        "Profile Management",
        "See your profile and track your chat activity.",
    ),
];

/// Profile shown when nobody is logged in
struct ShowcaseProfile {
    username: &'static str,
    email: &'static str,
    messages_sent: u32,
    time_online: &'static str,
    joined: &'static str,
    favorite_room: &'static str,
}

const SHOWCASE_PROFILE: ShowcaseProfile = ShowcaseProfile {
    username: "ChatUser123",
    email: "chatuser123@example.com",
    messages_sent: 156,
    time_online: "24h 32m",
    joined: "2024-01-15",
    favorite_room: "General",
};

/// Page formatter for terminal display
pub struct PageFormatter;

impl PageFormatter {
    /// Format the layout header with the navigation links
    pub fn format_nav(logged_in: bool, current: Route) -> String {
        let links: Vec<String> = nav_links(logged_in)
            .iter()
            .map(|link| match link {
                NavLink::Page(route) if *route == current => format!("[{}]", route.title()),
                NavLink::Page(route) => format!("{} ({})", route.title(), route.path()),
                NavLink::Logout => "Logout (/logout)".to_string(),
            })
            .collect();
        format!("\n{}\nHiroba | {}\n{}\n", RULE, links.join(" | "), RULE)
    }

    pub fn format_home() -> String {
        let mut output = String::new();
        output.push_str("Welcome to Hiroba!\n");
        output.push_str("Connect, communicate, and chat with friends in real-time.\n\n");
        output.push_str("Features:\n");
        for (title, description) in FEATURES {
            output.push_str(&format!("  * {}: {}\n", title, description));
        }
        output
    }

    pub fn format_login() -> String {
        "Log in with: /login <email-or-username>\nNo account yet? /go /signup\n".to_string()
    }

    pub fn format_signup() -> String {
        "Create an account with: /signup <username> <email>\n".to_string()
    }

    /// Format the chat header
    ///
    /// # Arguments
    ///
    /// * `room_name` / `description` - Room Directory entry of the room
    /// * `room_id` - The current room
    /// * `message_count` - Number of displayed messages
    /// * `user` - The session user, if any
    /// * `offline` - Whether the view fell back to local mode
    pub fn format_chat_header(
        room_name: &str,
        description: &str,
        room_id: &RoomId,
        message_count: usize,
        user: Option<&SessionUser>,
        offline: bool,
    ) -> String {
        let status = if offline { "Offline Mode" } else { "Online" };
        let mut meta = format!("Messages: {} | Room: {}", message_count, room_id);
        if let Some(user) = user {
            meta.push_str(&format!(" | User: {}", user.display_name()));
        }
        format!(
            "{} Chat [{}]\n{}\n{}\n{}\n",
            room_name, status, description, meta, THIN_RULE
        )
    }

    /// Format the room list, marking the selected room
    pub fn format_rooms(directory: &RoomDirectory, selected: &RoomId) -> String {
        let mut output = String::from("Chat Rooms:\n");
        for room in directory.rooms() {
            let marker = if room.id == selected.as_str() { ">" } else { " " };
            output.push_str(&format!(
                "{} {} ({}) - {}\n",
                marker, room.name, room.id, room.description
            ));
        }
        output
    }

    /// Format a single chat message
    pub fn format_message(message: &Message) -> String {
        let badge = match message.status {
            MessageStatus::Sent => "",
            MessageStatus::Local => " [Local]",
            MessageStatus::Demo => " [Demo]",
        };
        format!(
            "[{}] @{}: {}{}",
            format_clock_time(message.timestamp.value()),
            message.user,
            message.text,
            badge
        )
    }

    pub fn format_messages(messages: &[Message]) -> String {
        if messages.is_empty() {
            return "(No messages yet. Start the conversation!)\n".to_string();
        }
        let mut output = String::new();
        for message in messages {
            output.push_str(&Self::format_message(message));
            output.push('\n');
        }
        output
    }

    pub fn format_notice(notice: &Notice) -> String {
        match notice.kind {
            NoticeKind::Info => format!("(i) {}\n", notice.text),
            NoticeKind::Error => format!("(!) {}\n", notice.text),
        }
    }

    /// Format the profile page; the showcase profile stands in when logged out
    pub fn format_profile(user: Option<&SessionUser>, registered_at: Option<Timestamp>) -> String {
        let mut output = String::new();
        match user {
            Some(user) => {
                output.push_str(&format!("{}\n", user.display_name()));
                output.push_str(&format!("{}\n", user.email));
                if let Some(registered_at) = registered_at {
                    output.push_str(&format!(
                        "Registered: {}\n",
                        timestamp_to_rfc3339(registered_at.value())
                    ));
                }
                output.push_str("Log out with: /logout\n");
            }
            None => {
                let profile = &SHOWCASE_PROFILE;
                output.push_str(&format!("{}\n{}\n\n", profile.username, profile.email));
                output.push_str("Chat Stats:\n");
                output.push_str(&format!("  Messages Sent: {}\n", profile.messages_sent));
                output.push_str(&format!("  Time Online: {}\n", profile.time_online));
                output.push_str(&format!("  Joined: {}\n", profile.joined));
                output.push_str(&format!("  Favorite Room: {}\n", profile.favorite_room));
            }
        }
        output
    }

    /// Format the community page
    ///
    /// # Arguments
    ///
    /// * `records` - Every presence record
    /// * `online_count` - Records with status online
    /// * `me` - The session user, if any
    /// * `now` - Current time used for "Last seen"
    pub fn format_community(
        records: &[PresenceRecord],
        online_count: usize,
        me: Option<&SessionUser>,
        now: i64,
    ) -> String {
        let mut output = String::from("Community\nConnect with other chat users\n\n");

        if let Some(me) = me {
            output.push_str(&format!("Your Status: Online as {}\n\n", me.display_name()));
        }

        output.push_str(&format!("Online Users ({}):\n", online_count));
        if records.is_empty() {
            output.push_str("No users online right now.\n");
            return output;
        }
        for record in records {
            let status = if record.is_online() {
                "Online".to_string()
            } else {
                format!("Last seen {}", format_last_seen(now, record.last_seen.value()))
            };
            output.push_str(&format!("  {} - {}\n", record.username, status));
        }
        output
    }

    pub fn format_help() -> String {
        [
            "Commands:",
            "  /go <path>                   open a page (/, /chat, /login, /signup, /profile, /community)",
            "  /login <email-or-username>   log in as a registered user",
            "  /signup <username> <email>   register and log in",
            "  /logout                      log out",
            "  /room <id>                   switch chat room",
            "  /rooms                       list chat rooms",
            "  /demo                        add a demo message",
            "  /test                        test the connection to the chat server",
            "  /help                        show this help",
            "  /quit                        exit",
            "On the chat page, any other text is sent as a message. Start it with // to send text beginning with /.",
            "",
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiroba_core::domain::PresenceStatus;

    fn message(text: &str, status: MessageStatus) -> Message {
        Message {
            id: "m1".to_string(),
            user: "alice".to_string(),
            text: text.to_string(),
            timestamp: Timestamp::new(1672498800000),
            status,
        }
    }

    #[test]
    fn test_format_nav_for_logged_out_user() {
        // テスト項目: 未ログインの場合は Login と Signup のみ表示される
        // given (前提条件) / when (操作):
        let result = PageFormatter::format_nav(false, Route::Login);

        // then (期待する結果):
        assert!(result.contains("[Login]"));
        assert!(result.contains("Signup (/signup)"));
        assert!(!result.contains("Logout"));
    }

    #[test]
    fn test_format_chat_header_shows_mode_and_count() {
        // テスト項目: チャットヘッダーにモード・メッセージ数・ユーザーが表示される
        // given (前提条件):
        let room = RoomId::new("general").unwrap();
        let user = SessionUser::new(Some("alice".to_string()), "alice@example.com");

        // when (操作):
        let online = PageFormatter::format_chat_header(
            "General",
            "General discussion",
            &room,
            3,
            Some(&user),
            false,
        );
        let offline =
            PageFormatter::format_chat_header("General", "General discussion", &room, 0, None, true);

        // then (期待する結果):
        assert!(online.contains("General Chat [Online]"));
        assert!(online.contains("Messages: 3 | Room: general | User: alice"));
        assert!(offline.contains("[Offline Mode]"));
        assert!(!offline.contains("User:"));
    }

    #[test]
    fn test_format_message_badges() {
        // テスト項目: local と demo のメッセージにはバッジが付く
        // given (前提条件) / when (操作):
        let sent = PageFormatter::format_message(&message("hi", MessageStatus::Sent));
        let local = PageFormatter::format_message(&message("hi", MessageStatus::Local));
        let demo = PageFormatter::format_message(&message("hi", MessageStatus::Demo));

        // then (期待する結果):
        assert!(sent.contains("@alice: hi"));
        assert!(!sent.contains("[Local]") && !sent.contains("[Demo]"));
        assert!(local.ends_with("[Local]"));
        assert!(demo.ends_with("[Demo]"));
    }

    #[test]
    fn test_format_profile_falls_back_to_showcase() {
        // テスト項目: 未ログインの場合は既定のプロフィールが表示される
        // given (前提条件) / when (操作):
        let result = PageFormatter::format_profile(None, None);

        // then (期待する結果):
        assert!(result.contains("ChatUser123"));
        assert!(result.contains("Messages Sent: 156"));
        assert!(result.contains("Favorite Room: General"));
    }

    #[test]
    fn test_format_profile_shows_registration_time() {
        // テスト項目: ログイン中のユーザーは登録日時が UTC の RFC 3339 で表示される
        // given (前提条件):
        let user = SessionUser::new(Some("alice".to_string()), "alice@example.com");

        // when (操作):
        let result = PageFormatter::format_profile(Some(&user), Some(Timestamp::new(0)));

        // then (期待する結果):
        assert!(result.contains("alice@example.com"));
        assert!(result.contains("Registered: 1970-01-01T00:00:00+00:00"));
        assert!(!result.contains("ChatUser123"));
    }

    #[test]
    fn test_format_community_lists_status() {
        // テスト項目: オンラインのユーザーは Online、オフラインは最終アクセスが表示される
        // given (前提条件):
        let records = vec![
            PresenceRecord {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                last_seen: Timestamp::new(0),
                status: PresenceStatus::Online,
            },
            PresenceRecord {
                username: "bob".to_string(),
                email: "bob@example.com".to_string(),
                last_seen: Timestamp::new(0),
                status: PresenceStatus::Offline,
            },
        ];

        // when (操作):
        let result = PageFormatter::format_community(&records, 1, None, 3 * 60_000);

        // then (期待する結果):
        assert!(result.contains("Online Users (1):"));
        assert!(result.contains("alice - Online"));
        assert!(result.contains("bob - Last seen 3 minutes ago"));
    }

    #[test]
    fn test_format_community_empty() {
        // テスト項目: レコードが無い場合は空の旨が表示される
        // given (前提条件) / when (操作):
        let result = PageFormatter::format_community(&[], 0, None, 0);

        // then (期待する結果):
        assert!(result.contains("No users online right now."));
    }
}
