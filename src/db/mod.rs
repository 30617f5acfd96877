//! Chat persistence — optional MySQL sink for decoded chat messages.
//!
//! DESIGN
//! ======
//! The protocol engine only knows the [`ChatStore`] trait; the MySQL
//! implementation lives here so the session never touches SQL. Persistence
//! is fire-and-forget from the engine's perspective: failures are logged by
//! the caller and never abort the session.

use async_trait::async_trait;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

fn db_max_connections() -> u32 {
    std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
}

/// Initialize the MySQL connection pool and run migrations.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(db_max_connections())
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    Ok(pool)
}

/// Persistence sink invoked for every decoded chat message.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Store one chat message, returning the number of rows written.
    async fn store(&self, room_id: &str, nickname: &str, text: &str) -> Result<u64, sqlx::Error>;
}

/// [`ChatStore`] backed by the `barrages` table.
pub struct MySqlChatStore {
    pool: MySqlPool,
}

impl MySqlChatStore {
    #[must_use]
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for MySqlChatStore {
    async fn store(&self, room_id: &str, nickname: &str, text: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO barrages (room_id, nickname, chatmsg) VALUES (?, ?, ?)")
            .bind(room_id)
            .bind(nickname)
            .bind(text)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
