//! Command-line configuration.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::route::{Route, RouteError};

/// File inside the data directory that emulates browser local storage
pub const LOCAL_STORAGE_FILE: &str = "local_storage.json";

#[derive(Parser, Debug, Clone)]
#[command(name = "hiroba")]
#[command(about = "Terminal chat client backed by a hosted realtime database", long_about = None)]
pub struct Args {
    /// Realtime database URL (runs against an in-process store when omitted)
    #[arg(short = 'u', long, env = "HIROBA_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Auth token appended to database requests
    #[arg(long, env = "HIROBA_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Directory holding the local session storage
    #[arg(short = 'd', long, default_value = ".hiroba")]
    pub data_dir: PathBuf,

    /// Page shown at start-up
    #[arg(short = 'r', long, default_value = "/")]
    pub route: String,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Database URL must start with http:// or https://, got '{0}'")]
    InvalidDatabaseUrl(String),

    #[error("Invalid start page: {0}")]
    InvalidRoute(#[from] RouteError),
}

/// Validated client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: Option<String>,
    pub auth_token: Option<String>,
    pub data_dir: PathBuf,
    pub start_route: Route,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let database_url = match args.database_url.map(|url| url.trim().to_string()) {
            Some(url) if url.is_empty() => None,
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => Some(url),
            Some(url) => return Err(ConfigError::InvalidDatabaseUrl(url)),
            None => None,
        };

        Ok(Self {
            database_url,
            auth_token: args.auth_token.filter(|token| !token.is_empty()),
            data_dir: args.data_dir,
            start_route: Route::parse(&args.route)?,
        })
    }

    /// Path of the local storage file
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(LOCAL_STORAGE_FILE)
    }
}
