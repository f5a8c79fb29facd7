//! Database Models - structs representing content tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Blog post model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Blog post without its body (for the list view)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
}

/// New blog post for insertion; slug and excerpt are already derived
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Team member model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub about: String,
    pub image_url: Option<String>,
    pub portfolio_link: Option<String>,
    pub linkedin_link: Option<String>,
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated team member fields for insert or update
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMemberInput {
    pub name: String,
    pub position: String,
    pub about: String,
    pub image_url: Option<String>,
    pub portfolio_link: Option<String>,
    pub linkedin_link: Option<String>,
    pub display_order: i64,
    pub is_active: bool,
}

/// Project model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub project_name: String,
    pub company_name: String,
    pub about: String,
    pub project_link: Option<String>,
    pub company_link: Option<String>,
    pub image_url: Option<String>,
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated project fields for insert or update
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInput {
    pub project_name: String,
    pub company_name: String,
    pub about: String,
    pub project_link: Option<String>,
    pub company_link: Option<String>,
    pub image_url: Option<String>,
    pub display_order: i64,
    pub is_active: bool,
}
