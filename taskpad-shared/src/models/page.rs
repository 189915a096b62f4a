/// Wiki page model and database operations
///
/// Pages are addressed by their unique title. Anyone may read them;
/// only the creating user may change or delete them, which is why the
/// row carries `created_by`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A wiki page
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Page {
    /// Unique page ID
    pub id: Uuid,

    /// Unique page title (the wiki address of the page)
    pub title: String,

    /// Page body
    pub content: String,

    /// User who created the page; only they may edit or delete it
    pub created_by: Uuid,

    /// When the page was created
    pub created_at: DateTime<Utc>,

    /// When the page was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePage {
    /// Unique title
    pub title: String,

    /// Page body
    pub content: String,

    /// Creating user
    pub created_by: Uuid,
}

impl Page {
    /// Creates a page
    ///
    /// # Errors
    ///
    /// Returns an error if the title already exists (unique constraint).
    pub async fn create(pool: &PgPool, data: CreatePage) -> Result<Self, sqlx::Error> {
        let page = sqlx::query_as::<_, Page>(
            r#"
            INSERT INTO pages (title, content, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, title, content, created_by, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.content)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(page)
    }

    /// Finds a page by its title
    pub async fn find_by_title(pool: &PgPool, title: &str) -> Result<Option<Self>, sqlx::Error> {
        let page = sqlx::query_as::<_, Page>(
            r#"
            SELECT id, title, content, created_by, created_at, updated_at
            FROM pages
            WHERE title = $1
            "#,
        )
        .bind(title)
        .fetch_optional(pool)
        .await?;

        Ok(page)
    }

    /// Lists pages, optionally filtered by a case-insensitive title search
    ///
    /// Ordered alphabetically by title.
    pub async fn list(pool: &PgPool, search: Option<&str>) -> Result<Vec<Self>, sqlx::Error> {
        let pages = match search {
            Some(q) => {
                sqlx::query_as::<_, Page>(
                    r#"
                    SELECT id, title, content, created_by, created_at, updated_at
                    FROM pages
                    WHERE title ILIKE $1
                    ORDER BY title
                    "#,
                )
                .bind(format!("%{}%", q))
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Page>(
                    r#"
                    SELECT id, title, content, created_by, created_at, updated_at
                    FROM pages
                    ORDER BY title
                    "#,
                )
                .fetch_all(pool)
                .await?
            }
        };

        Ok(pages)
    }

    /// Updates a page's content (title is immutable once created)
    ///
    /// Ownership is checked by the caller; this only matches by title.
    /// Returns None if the page does not exist.
    pub async fn update_content(
        pool: &PgPool,
        title: &str,
        content: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let page = sqlx::query_as::<_, Page>(
            r#"
            UPDATE pages
            SET content = $2, updated_at = NOW()
            WHERE title = $1
            RETURNING id, title, content, created_by, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(content)
        .fetch_optional(pool)
        .await?;

        Ok(page)
    }

    /// Deletes a page by title
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, title: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pages WHERE title = $1")
            .bind(title)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Checks whether a user is the page's creator
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }
}
