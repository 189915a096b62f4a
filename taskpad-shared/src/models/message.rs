/// Message model and database operations
///
/// An append-only log of short user messages: one insert on receipt,
/// one "recent messages" query. Messages are never edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A single message posted by a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,

    /// Author
    pub user_id: Uuid,

    /// Message text
    pub body: String,

    /// When the message was posted
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Inserts a message
    pub async fn create(pool: &PgPool, user_id: Uuid, body: &str) -> Result<Self, sqlx::Error> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (user_id, body)
            VALUES ($1, $2)
            RETURNING id, user_id, body, created_at
            "#,
        )
        .bind(user_id)
        .bind(body)
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    /// Lists the most recent messages, newest first
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, user_id, body, created_at
            FROM messages
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }
}
