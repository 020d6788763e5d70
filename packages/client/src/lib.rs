//! Hiroba terminal chat client.
//!
//! Pages and views on top of `hiroba-core`: routing, the chat and community
//! views, command parsing, and the interactive loop.

pub mod app;
pub mod command;
pub mod config;
pub mod error;
pub mod formatter;
pub mod route;
pub mod ui;
pub mod view;

pub use app::run_app;
pub use config::{Args, Config};
pub use error::ClientError;
