/// Task model and database operations
///
/// Tasks are the per-user to-do items of the task manager. Every query that
/// touches a single task is scoped by `user_id` as well as `id`, so one
/// user's tasks are invisible to another: a lookup of someone else's task
/// behaves exactly like a miss.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(120) NOT NULL,
///     state VARCHAR(20) NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Default state for newly created tasks
pub const DEFAULT_TASK_STATE: &str = "active";

/// A single to-do item owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user (tasks are private to their owner)
    pub user_id: Uuid,

    /// Human-readable task name
    pub name: String,

    /// Free-form state label (e.g. "active", "done")
    pub state: String,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Owning user
    pub user_id: Uuid,

    /// Task name
    pub name: String,
}

/// Input for updating a task
///
/// Only non-None fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New task name
    pub name: Option<String>,

    /// New state label
    pub state: Option<String>,
}

impl Task {
    /// Creates a task in the default "active" state
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, name, state)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, state, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.name)
        .bind(DEFAULT_TASK_STATE)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, scoped to its owner
    ///
    /// Returns None both when the task does not exist and when it belongs
    /// to a different user.
    pub async fn find_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, name, state, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists all tasks belonging to one user, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, name, state, created_at, updated_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task's name and/or state, scoped to its owner
    ///
    /// Returns None when the task does not exist or is owned by someone
    /// else. Fields left as None keep their current value (COALESCE).
    pub async fn update_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET name = COALESCE($3, name),
                state = COALESCE($4, state),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, state, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.name)
        .bind(data.state)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task, scoped to its owner
    ///
    /// Returns true if a row was deleted; false covers both "no such task"
    /// and "not yours".
    pub async fn delete_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts tasks belonging to one user
    pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
