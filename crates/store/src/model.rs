//! Row models for the `user` and `post` tables.

use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserM {
    pub id: i64,
    pub user_id: String,
    pub username: String,
    /// Bcrypt hash, never the plain password.
    pub password: String,
    pub nickname: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostM {
    pub id: i64,
    pub user_id: String,
    pub post_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const USER_COLUMNS: &str =
    "id, user_id, username, password, nickname, email, phone, created_at, updated_at";
pub(crate) const POST_COLUMNS: &str = "id, user_id, post_id, title, content, created_at, updated_at";

fn timestamp(row: &AnyRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let secs: i64 = row.try_get(column)?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("timestamp out of range: {secs}").into(),
    })
}

impl<'r> FromRow<'r, AnyRow> for UserM {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(UserM {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            username: row.try_get("username")?,
            password: row.try_get("password")?,
            nickname: row.try_get("nickname")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, AnyRow> for PostM {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(PostM {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            post_id: row.try_get("post_id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}
