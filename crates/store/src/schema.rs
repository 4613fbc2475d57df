//! Embedded SQLite schema.
//!
//! Production runs against MySQL with `configs/fastblog.sql`; this copy is
//! used for local runs and tests on an in-memory SQLite database.

use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

pub const SQLITE: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS user (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id VARCHAR(36) NOT NULL UNIQUE,
        username VARCHAR(255) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL,
        nickname VARCHAR(30) NOT NULL DEFAULT '',
        email VARCHAR(256) NOT NULL,
        phone VARCHAR(16) NOT NULL,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id VARCHAR(36) NOT NULL,
        post_id VARCHAR(35) NOT NULL UNIQUE,
        title VARCHAR(256) NOT NULL,
        content TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_post_user_id ON post (user_id)",
];

/// Open a single-connection in-memory SQLite pool with the schema applied.
///
/// One connection only: every in-memory connection is its own database.
pub async fn sqlite_memory_pool() -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    for stmt in SQLITE {
        sqlx::query(stmt).execute(&pool).await?;
    }
    Ok(pool)
}
