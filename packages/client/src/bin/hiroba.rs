//! Hiroba terminal chat client.
//!
//! Chat rooms and a community directory backed by a hosted realtime database.
//! Without a database URL the client runs against an in-process store.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba
//! cargo run --bin hiroba -- --database-url https://example-default-rtdb.firebaseio.com --route /chat
//! ```

use clap::Parser;

use hiroba_client::{Args, Config};
use hiroba_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = hiroba_client::run_app(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
