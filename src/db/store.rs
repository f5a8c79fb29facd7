//! Content store: queries over posts, team members and projects.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::models::{
    NewPost, Post, PostSummary, Project, ProjectInput, TeamMember, TeamMemberInput,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a post with slug '{0}' already exists")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of an insert-or-update by optional id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(i64),
    Updated,
    /// An update named an id that no longer exists; nothing was written.
    Missing,
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[derive(Debug, Clone)]
pub struct ContentStore {
    pool: SqlitePool,
}

impl ContentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    /// Insert a post. A slug that already exists is a [`StoreError::Conflict`].
    pub async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, slug, excerpt, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, slug, excerpt, content, created_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(post.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(post.slug.clone())
            } else {
                StoreError::Database(e)
            }
        })
    }

    /// All posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<PostSummary>, StoreError> {
        let posts = sqlx::query_as::<_, PostSummary>(
            r#"
            SELECT id, title, slug, excerpt, created_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    pub async fn find_post(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, slug, excerpt, content, created_at
            FROM posts
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    // ------------------------------------------------------------------
    // Team members
    // ------------------------------------------------------------------

    /// Active members ordered by display order, then name.
    pub async fn list_active_team(&self) -> Result<Vec<TeamMember>, StoreError> {
        let members = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT id, name, position, about, image_url, portfolio_link, linkedin_link,
                   display_order, is_active, created_at
            FROM team_members
            WHERE is_active = 1
            ORDER BY display_order, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    pub async fn upsert_team_member(
        &self,
        id: Option<i64>,
        input: &TeamMemberInput,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError> {
        match id {
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE team_members
                    SET name = $1, position = $2, about = $3, image_url = $4,
                        portfolio_link = $5, linkedin_link = $6, display_order = $7,
                        is_active = $8
                    WHERE id = $9
                    "#,
                )
                .bind(&input.name)
                .bind(&input.position)
                .bind(&input.about)
                .bind(&input.image_url)
                .bind(&input.portfolio_link)
                .bind(&input.linkedin_link)
                .bind(input.display_order)
                .bind(input.is_active)
                .bind(id)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    Ok(UpsertOutcome::Missing)
                } else {
                    Ok(UpsertOutcome::Updated)
                }
            }
            None => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO team_members
                        (name, position, about, image_url, portfolio_link, linkedin_link,
                         display_order, is_active, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    RETURNING id
                    "#,
                )
                .bind(&input.name)
                .bind(&input.position)
                .bind(&input.about)
                .bind(&input.image_url)
                .bind(&input.portfolio_link)
                .bind(&input.linkedin_link)
                .bind(input.display_order)
                .bind(input.is_active)
                .bind(now)
                .fetch_one(&self.pool)
                .await?;
                Ok(UpsertOutcome::Created(id))
            }
        }
    }

    /// Returns whether a row was removed. Unknown ids are not an error.
    pub async fn delete_team_member(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    /// Active projects ordered by display order, newest first within a tie.
    pub async fn list_active_projects(&self) -> Result<Vec<Project>, StoreError> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, project_name, company_name, about, project_link, company_link,
                   image_url, display_order, is_active, created_at
            FROM projects
            WHERE is_active = 1
            ORDER BY display_order, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    pub async fn upsert_project(
        &self,
        id: Option<i64>,
        input: &ProjectInput,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError> {
        match id {
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE projects
                    SET project_name = $1, company_name = $2, about = $3, project_link = $4,
                        company_link = $5, image_url = $6, display_order = $7, is_active = $8
                    WHERE id = $9
                    "#,
                )
                .bind(&input.project_name)
                .bind(&input.company_name)
                .bind(&input.about)
                .bind(&input.project_link)
                .bind(&input.company_link)
                .bind(&input.image_url)
                .bind(input.display_order)
                .bind(input.is_active)
                .bind(id)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    Ok(UpsertOutcome::Missing)
                } else {
                    Ok(UpsertOutcome::Updated)
                }
            }
            None => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO projects
                        (project_name, company_name, about, project_link, company_link,
                         image_url, display_order, is_active, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    RETURNING id
                    "#,
                )
                .bind(&input.project_name)
                .bind(&input.company_name)
                .bind(&input.about)
                .bind(&input.project_link)
                .bind(&input.company_link)
                .bind(&input.image_url)
                .bind(input.display_order)
                .bind(input.is_active)
                .bind(now)
                .fetch_one(&self.pool)
                .await?;
                Ok(UpsertOutcome::Created(id))
            }
        }
    }

    pub async fn delete_project(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
