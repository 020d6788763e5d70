//! Parsing of input lines into commands.
//!
//! Lines starting with `/` are commands; anything else is chat text. A
//! doubled `//` sends the rest of the line as text starting with `/`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type /help for the list of commands.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Navigate to a page path
    Go(String),
    Login(String),
    Signup { username: String, email: String },
    Logout,
    /// Switch the chat room
    Room(String),
    /// List the chat rooms
    Rooms,
    /// Add a demo message to the chat
    Demo,
    /// Test the store connection
    Test,
    Help,
    Quit,
    /// Plain text
    Say(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if let Some(text) = line.strip_prefix("//") {
            return Ok(Command::Say(format!("/{}", text)));
        }
        let Some(body) = line.strip_prefix('/') else {
            return Ok(Command::Say(line.to_string()));
        };

        let mut parts = body.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (name, args.as_slice()) {
            ("go", [path]) => Ok(Command::Go(normalize_path(path))),
            ("go", _) => Err(CommandError::Usage("/go <path>")),
            ("login", [identifier]) => Ok(Command::Login(identifier.to_string())),
            ("login", _) => Err(CommandError::Usage("/login <email-or-username>")),
            ("signup", [username, email]) => Ok(Command::Signup {
                username: username.to_string(),
                email: email.to_string(),
            }),
            ("signup", _) => Err(CommandError::Usage("/signup <username> <email>")),
            ("logout", []) => Ok(Command::Logout),
            ("room", [room_id]) => Ok(Command::Room(room_id.to_string())),
            ("room", _) => Err(CommandError::Usage("/room <id>")),
            ("rooms", []) => Ok(Command::Rooms),
            ("demo", []) => Ok(Command::Demo),
            ("test", []) => Ok(Command::Test),
            ("help", []) => Ok(Command::Help),
            ("quit" | "exit", []) => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(line.to_string())),
        }
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
