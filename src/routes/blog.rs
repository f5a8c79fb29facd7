/**
 * Blog Routes
 * Public post list and single post pages
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{redirect, render};
use crate::auth::{FlashLevel, Session};
use crate::content::render_markdown;
use crate::db::models::PostSummary;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BlogListPage {
    pub posts: Vec<PostSummary>,
}

/// A post with its markdown rendered and sanitized.
#[derive(Debug, Serialize)]
pub struct BlogPostPage {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
    pub content_html: String,
}

/// GET /blog - all posts, newest first
pub async fn list_posts(State(state): State<AppState>, mut session: Session) -> impl IntoResponse {
    match state.store.list_posts().await {
        Ok(posts) => render(&mut session, StatusCode::OK, "blog_list", BlogListPage { posts }).await,
        Err(e) => {
            tracing::error!(error = %e, "database error listing posts");
            session
                .data
                .flash(FlashLevel::Danger, "Could not load posts. Please try again later.");
            render(
                &mut session,
                StatusCode::INTERNAL_SERVER_ERROR,
                "blog_list",
                BlogListPage { posts: vec![] },
            )
            .await
        }
    }
}

/// GET /blog/{slug} - one post; unknown slugs go back to the list
pub async fn get_post(
    State(state): State<AppState>,
    mut session: Session,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match state.store.find_post(&slug).await {
        Ok(Some(post)) => {
            let page = BlogPostPage {
                content_html: render_markdown(&post.content),
                title: post.title,
                slug: post.slug,
                excerpt: post.excerpt,
                created_at: post.created_at,
            };
            render(&mut session, StatusCode::OK, "blog_post", page).await
        }
        Ok(None) => {
            tracing::debug!(slug = %slug, "blog post not found");
            session.data.flash(FlashLevel::Danger, "Post not found.");
            redirect(&session, "/blog").await
        }
        Err(e) => {
            tracing::error!(slug = %slug, error = %e, "database error fetching post");
            session
                .data
                .flash(FlashLevel::Danger, "Could not load this post. Please try again later.");
            redirect(&session, "/blog").await
        }
    }
}
