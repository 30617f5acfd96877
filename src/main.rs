//! Barrage client entry point.
//!
//! Wires the pieces together: CLI flags, tracing, the optional MySQL chat
//! store, Ctrl-C as the logout trigger, and one [`session::Session`] for the
//! requested room. A fatal connection error exits non-zero; everything else
//! (malformed frames, store failures, unknown message kinds) is absorbed by
//! the session.

mod codec;
mod db;
mod event;
mod keepalive;
mod payload;
mod session;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::db::ChatStore;
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(name = "barrage", about = "Douyu barrage (danmaku) TCP client")]
struct Cli {
    /// Room to join.
    #[arg(long = "rid", env = "BARRAGE_ROOM_ID", default_value = "9999")]
    room_id: String,

    /// MySQL connection string, e.g. `mysql://root@127.0.0.1:3306/dybarrage`.
    /// Chat persistence is disabled when absent.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    // Persistence is optional and its init is non-fatal: a failed pool only
    // disables the chat store.
    let store: Option<Arc<dyn ChatStore>> = match &cli.database_url {
        Some(url) => match db::init_pool(url).await {
            Ok(pool) => {
                info!("chat persistence enabled");
                Some(Arc::new(db::MySqlChatStore::new(pool)))
            }
            Err(e) => {
                warn!(error = %e, "database init failed; chat messages will not be stored");
                None
            }
        },
        None => None,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; logging out");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut session = match Session::connect(&cli.room_id, store).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, room_id = %cli.room_id, "failed to join room");
            return ExitCode::FAILURE;
        }
    };

    match session.run(shutdown_rx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "session ended with error");
            ExitCode::FAILURE
        }
    }
}
