/**
 * Admin Content Editor
 * Post creation, team member and project management (auth required)
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Form};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{optional, redirect, render};
use crate::auth::{FlashLevel, Session};
use crate::content::{derive_excerpt, derive_slug, EXCERPT_LENGTH};
use crate::db::models::{NewPost, Project, ProjectInput, TeamMember, TeamMemberInput};
use crate::db::{StoreError, UpsertOutcome};
use crate::state::AppState;

// ============================================================================
// Forms
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamMemberForm {
    /// Present only on a delete submission
    #[serde(default, skip_serializing)]
    pub delete_id: Option<String>,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub portfolio_link: String,
    #[serde(default)]
    pub linkedin_link: String,
    #[serde(default)]
    pub display_order: String,
    #[serde(default)]
    pub is_active: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectForm {
    #[serde(default, skip_serializing)]
    pub delete_id: Option<String>,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub project_link: String,
    #[serde(default)]
    pub company_link: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub display_order: String,
    #[serde(default)]
    pub is_active: String,
}

/// Blank or malformed means 0.
fn parse_display_order(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

/// Unchecked boxes are simply absent, so only explicit "off" values deactivate.
fn parse_active(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "off" | "no"
    )
}

/// Blank id means insert.
fn parse_id(value: &str) -> Result<Option<i64>, ()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| ())
}

impl TeamMemberForm {
    fn validate(&self) -> Result<(Option<i64>, TeamMemberInput), &'static str> {
        let name = self.name.trim();
        let position = self.position.trim();
        let about = self.about.trim();
        if name.is_empty() || position.is_empty() || about.is_empty() {
            return Err("Name, position, and about are required.");
        }
        let id = parse_id(&self.id).map_err(|_| "Invalid team member id.")?;

        Ok((
            id,
            TeamMemberInput {
                name: name.to_string(),
                position: position.to_string(),
                about: about.to_string(),
                image_url: optional(&self.image_url),
                portfolio_link: optional(&self.portfolio_link),
                linkedin_link: optional(&self.linkedin_link),
                display_order: parse_display_order(&self.display_order),
                is_active: parse_active(&self.is_active),
            },
        ))
    }
}

impl ProjectForm {
    fn validate(&self) -> Result<(Option<i64>, ProjectInput), &'static str> {
        let project_name = self.project_name.trim();
        let company_name = self.company_name.trim();
        let about = self.about.trim();
        if project_name.is_empty() || company_name.is_empty() || about.is_empty() {
            return Err("Project name, company name, and about are required.");
        }
        let id = parse_id(&self.id).map_err(|_| "Invalid project id.")?;

        Ok((
            id,
            ProjectInput {
                project_name: project_name.to_string(),
                company_name: company_name.to_string(),
                about: about.to_string(),
                project_link: optional(&self.project_link),
                company_link: optional(&self.company_link),
                image_url: optional(&self.image_url),
                display_order: parse_display_order(&self.display_order),
                is_active: parse_active(&self.is_active),
            },
        ))
    }
}

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreatePostPage {
    pub form: PostForm,
}

#[derive(Debug, Serialize)]
pub struct TeamPage {
    pub team_members: Vec<TeamMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<TeamMemberForm>,
}

#[derive(Debug, Serialize)]
pub struct ProjectsPage {
    pub projects: Vec<Project>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<ProjectForm>,
}

// ============================================================================
// Posts
// ============================================================================

/// GET /admin/create
pub async fn create_post_page(mut session: Session) -> impl IntoResponse {
    render(
        &mut session,
        StatusCode::OK,
        "admin_create",
        CreatePostPage {
            form: PostForm::default(),
        },
    )
    .await
}

/// POST /admin/create
pub async fn create_post(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<PostForm>,
) -> impl IntoResponse {
    let title = form.title.trim().to_string();
    let content = form.content.trim().to_string();
    let form = PostForm {
        title: title.clone(),
        content: content.clone(),
    };

    if title.is_empty() || content.is_empty() {
        session
            .data
            .flash(FlashLevel::Danger, "Title and content are required.");
        return render(
            &mut session,
            StatusCode::UNPROCESSABLE_ENTITY,
            "admin_create",
            CreatePostPage { form },
        )
        .await;
    }

    let slug = derive_slug(&title);
    if slug.is_empty() {
        session.data.flash(
            FlashLevel::Danger,
            "The title must contain at least one letter or digit.",
        );
        return render(
            &mut session,
            StatusCode::UNPROCESSABLE_ENTITY,
            "admin_create",
            CreatePostPage { form },
        )
        .await;
    }

    let post = NewPost {
        excerpt: derive_excerpt(&content, EXCERPT_LENGTH),
        title,
        slug,
        content,
        created_at: Utc::now(),
    };

    match state.store.create_post(&post).await {
        Ok(created) => {
            tracing::info!(slug = %created.slug, id = created.id, "post created");
            session
                .data
                .flash(FlashLevel::Success, "Post created successfully!");
            redirect(&session, &format!("/blog/{}", created.slug)).await
        }
        Err(StoreError::Conflict(slug)) => {
            tracing::warn!(slug = %slug, "post slug already taken");
            session.data.flash(
                FlashLevel::Danger,
                "A post with this title already exists. Please use a different title.",
            );
            render(
                &mut session,
                StatusCode::CONFLICT,
                "admin_create",
                CreatePostPage { form },
            )
            .await
        }
        Err(e) => {
            tracing::error!(error = %e, "database error creating post");
            session
                .data
                .flash(FlashLevel::Danger, "Error creating post. Please try again.");
            render(
                &mut session,
                StatusCode::INTERNAL_SERVER_ERROR,
                "admin_create",
                CreatePostPage { form },
            )
            .await
        }
    }
}

// ============================================================================
// Team members
// ============================================================================

async fn team_page(
    state: &AppState,
    session: &mut Session,
    status: StatusCode,
    form: Option<TeamMemberForm>,
) -> Response {
    let team_members = match state.store.list_active_team().await {
        Ok(members) => members,
        Err(e) => {
            tracing::error!(error = %e, "failed to load team members");
            session
                .data
                .flash(FlashLevel::Danger, "Could not load team members.");
            return render(
                session,
                StatusCode::INTERNAL_SERVER_ERROR,
                "admin_team",
                TeamPage {
                    team_members: vec![],
                    form,
                },
            )
            .await;
        }
    };
    render(session, status, "admin_team", TeamPage { team_members, form }).await
}

/// GET /admin/team
pub async fn team(State(state): State<AppState>, mut session: Session) -> impl IntoResponse {
    team_page(&state, &mut session, StatusCode::OK, None).await
}

/// POST /admin/team - delete when `delete_id` is present, otherwise upsert
pub async fn save_team_member(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<TeamMemberForm>,
) -> impl IntoResponse {
    if let Some(delete_id) = form.delete_id.as_deref() {
        match delete_id.trim().parse::<i64>() {
            Ok(id) => match state.store.delete_team_member(id).await {
                Ok(true) => session
                    .data
                    .flash(FlashLevel::Success, "Team member deleted successfully!"),
                Ok(false) => session
                    .data
                    .flash(FlashLevel::Info, "Team member was already removed."),
                Err(e) => {
                    tracing::error!(id, error = %e, "failed to delete team member");
                    session
                        .data
                        .flash(FlashLevel::Danger, "Could not delete team member.");
                }
            },
            Err(_) => session
                .data
                .flash(FlashLevel::Danger, "Invalid team member id."),
        }
        return redirect(&session, "/admin/team").await;
    }

    let (id, input) = match form.validate() {
        Ok(valid) => valid,
        Err(message) => {
            session.data.flash(FlashLevel::Danger, message);
            return team_page(
                &state,
                &mut session,
                StatusCode::UNPROCESSABLE_ENTITY,
                Some(form),
            )
            .await;
        }
    };

    match state.store.upsert_team_member(id, &input, Utc::now()).await {
        Ok(UpsertOutcome::Created(id)) => {
            tracing::info!(id, "team member added");
            session
                .data
                .flash(FlashLevel::Success, "Team member added successfully!");
        }
        Ok(UpsertOutcome::Updated) => session
            .data
            .flash(FlashLevel::Success, "Team member updated successfully!"),
        Ok(UpsertOutcome::Missing) => session.data.flash(
            FlashLevel::Warning,
            "That team member no longer exists; nothing was updated.",
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to save team member");
            session
                .data
                .flash(FlashLevel::Danger, "Could not save team member.");
            return team_page(
                &state,
                &mut session,
                StatusCode::INTERNAL_SERVER_ERROR,
                Some(form),
            )
            .await;
        }
    }

    redirect(&session, "/admin/team").await
}

// ============================================================================
// Projects
// ============================================================================

async fn projects_page(
    state: &AppState,
    session: &mut Session,
    status: StatusCode,
    form: Option<ProjectForm>,
) -> Response {
    let projects = match state.store.list_active_projects().await {
        Ok(projects) => projects,
        Err(e) => {
            tracing::error!(error = %e, "failed to load projects");
            session
                .data
                .flash(FlashLevel::Danger, "Could not load projects.");
            return render(
                session,
                StatusCode::INTERNAL_SERVER_ERROR,
                "admin_projects",
                ProjectsPage {
                    projects: vec![],
                    form,
                },
            )
            .await;
        }
    };
    render(session, status, "admin_projects", ProjectsPage { projects, form }).await
}

/// GET /admin/projects
pub async fn projects(State(state): State<AppState>, mut session: Session) -> impl IntoResponse {
    projects_page(&state, &mut session, StatusCode::OK, None).await
}

/// POST /admin/projects - delete when `delete_id` is present, otherwise upsert
pub async fn save_project(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<ProjectForm>,
) -> impl IntoResponse {
    if let Some(delete_id) = form.delete_id.as_deref() {
        match delete_id.trim().parse::<i64>() {
            Ok(id) => match state.store.delete_project(id).await {
                Ok(true) => session
                    .data
                    .flash(FlashLevel::Success, "Project deleted successfully!"),
                Ok(false) => session
                    .data
                    .flash(FlashLevel::Info, "Project was already removed."),
                Err(e) => {
                    tracing::error!(id, error = %e, "failed to delete project");
                    session
                        .data
                        .flash(FlashLevel::Danger, "Could not delete project.");
                }
            },
            Err(_) => session.data.flash(FlashLevel::Danger, "Invalid project id."),
        }
        return redirect(&session, "/admin/projects").await;
    }

    let (id, input) = match form.validate() {
        Ok(valid) => valid,
        Err(message) => {
            session.data.flash(FlashLevel::Danger, message);
            return projects_page(
                &state,
                &mut session,
                StatusCode::UNPROCESSABLE_ENTITY,
                Some(form),
            )
            .await;
        }
    };

    match state.store.upsert_project(id, &input, Utc::now()).await {
        Ok(UpsertOutcome::Created(id)) => {
            tracing::info!(id, "project added");
            session
                .data
                .flash(FlashLevel::Success, "Project added successfully!");
        }
        Ok(UpsertOutcome::Updated) => session
            .data
            .flash(FlashLevel::Success, "Project updated successfully!"),
        Ok(UpsertOutcome::Missing) => session.data.flash(
            FlashLevel::Warning,
            "That project no longer exists; nothing was updated.",
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to save project");
            session.data.flash(FlashLevel::Danger, "Could not save project.");
            return projects_page(
                &state,
                &mut session,
                StatusCode::INTERNAL_SERVER_ERROR,
                Some(form),
            )
            .await;
        }
    }

    redirect(&session, "/admin/projects").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_order_defaults_to_zero() {
        assert_eq!(parse_display_order(""), 0);
        assert_eq!(parse_display_order("abc"), 0);
        assert_eq!(parse_display_order(" 7 "), 7);
        assert_eq!(parse_display_order("-2"), -2);
    }

    #[test]
    fn test_active_flag_defaults_to_true() {
        assert!(parse_active(""));
        assert!(parse_active("on"));
        assert!(parse_active("true"));
        assert!(!parse_active("false"));
        assert!(!parse_active("OFF"));
        assert!(!parse_active("0"));
    }

    #[test]
    fn test_team_form_requires_trimmed_fields() {
        let form = TeamMemberForm {
            name: "  ".to_string(),
            position: "CTO".to_string(),
            about: "Leads".to_string(),
            ..Default::default()
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_team_form_blank_id_means_insert() {
        let form = TeamMemberForm {
            name: " Ada ".to_string(),
            position: "CTO".to_string(),
            about: "Leads".to_string(),
            linkedin_link: "  ".to_string(),
            display_order: "2".to_string(),
            ..Default::default()
        };
        let (id, input) = form.validate().unwrap();
        assert_eq!(id, None);
        assert_eq!(input.name, "Ada");
        assert_eq!(input.linkedin_link, None);
        assert_eq!(input.display_order, 2);
        assert!(input.is_active);
    }

    #[test]
    fn test_project_form_rejects_malformed_id() {
        let form = ProjectForm {
            id: "twelve".to_string(),
            project_name: "Site".to_string(),
            company_name: "Acme".to_string(),
            about: "Web".to_string(),
            ..Default::default()
        };
        assert_eq!(form.validate().unwrap_err(), "Invalid project id.");

        let form = ProjectForm { id: "12".to_string(), ..form };
        assert_eq!(form.validate().unwrap().0, Some(12));
    }

    // ------------------------------------------------------------------------
    // Through the router
    // ------------------------------------------------------------------------

    use crate::testing::TestApp;

    const MEMBER: [(&str, &str); 5] = [
        ("name", "Ada"),
        ("position", "CTO"),
        ("about", "Builds things"),
        ("display_order", "1"),
        ("linkedin_link", "https://linkedin.example/ada"),
    ];

    #[tokio::test]
    async fn test_anonymous_mutations_are_redirected_without_writing() {
        let mut app = TestApp::new().await;
        let store = app.state.store.clone();

        let member = TeamMemberForm {
            name: "Seeded".to_string(),
            position: "CEO".to_string(),
            about: "Already here".to_string(),
            ..Default::default()
        };
        let project = ProjectForm {
            project_name: "Seeded".to_string(),
            company_name: "Acme".to_string(),
            about: "Already here".to_string(),
            ..Default::default()
        };
        let (_, member) = member.validate().unwrap();
        let (_, project) = project.validate().unwrap();
        let Ok(UpsertOutcome::Created(member_id)) =
            store.upsert_team_member(None, &member, Utc::now()).await
        else {
            panic!("team member not seeded");
        };
        let Ok(UpsertOutcome::Created(project_id)) =
            store.upsert_project(None, &project, Utc::now()).await
        else {
            panic!("project not seeded");
        };
        let member_id = member_id.to_string();
        let project_id = project_id.to_string();

        let attempts: Vec<(&str, Vec<(&str, &str)>)> = vec![
            ("/admin/create", vec![("title", "Sneaky"), ("content", "Body")]),
            ("/admin/team", MEMBER.to_vec()),
            (
                "/admin/team",
                vec![
                    ("id", member_id.as_str()),
                    ("name", "Renamed"),
                    ("position", "CEO"),
                    ("about", "Changed"),
                ],
            ),
            ("/admin/team", vec![("delete_id", member_id.as_str())]),
            (
                "/admin/projects",
                vec![
                    ("project_name", "Sneaky"),
                    ("company_name", "Acme"),
                    ("about", "Web"),
                ],
            ),
            (
                "/admin/projects",
                vec![
                    ("id", project_id.as_str()),
                    ("project_name", "Renamed"),
                    ("company_name", "Acme"),
                    ("about", "Changed"),
                ],
            ),
            ("/admin/projects", vec![("delete_id", project_id.as_str())]),
        ];

        for (uri, fields) in &attempts {
            let res = app.post_form(uri, fields).await;
            assert_eq!(res.status, StatusCode::SEE_OTHER, "{uri} {fields:?}");
            assert_eq!(res.location.as_deref(), Some("/admin/login"));
        }

        assert!(store.list_posts().await.unwrap().is_empty());
        let team = store.list_active_team().await.unwrap();
        assert_eq!(team.len(), 1);
        assert_eq!(team[0].name, "Seeded");
        let projects = store.list_active_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].project_name, "Seeded");
    }

    #[tokio::test]
    async fn test_post_title_without_letters_is_rejected() {
        let mut app = TestApp::new().await;
        app.login().await;
        let res = app
            .post_form("/admin/create", &[("title", "!!!"), ("content", "Body")])
            .await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(res
            .flash_messages()
            .contains(&"The title must contain at least one letter or digit.".to_string()));

        let res = app
            .post_form("/admin/create", &[("title", "  "), ("content", "Body")])
            .await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(res.flash_messages(), vec!["Title and content are required."]);
    }

    #[tokio::test]
    async fn test_team_member_lifecycle() {
        let mut app = TestApp::new().await;
        app.login().await;

        let res = app.post_form("/admin/team", &MEMBER).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location.as_deref(), Some("/admin/team"));

        let res = app.get("/admin/team").await;
        assert_eq!(res.flash_messages(), vec!["Team member added successfully!"]);
        let members = res.body["team_members"].as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["linkedin_link"], "https://linkedin.example/ada");
        let id = members[0]["id"].as_i64().unwrap().to_string();

        let res = app
            .post_form(
                "/admin/team",
                &[
                    ("id", id.as_str()),
                    ("name", "Ada Lovelace"),
                    ("position", "CTO"),
                    ("about", "Builds things"),
                ],
            )
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        let res = app.get("/about").await;
        assert_eq!(res.body["team_members"][0]["name"], "Ada Lovelace");
        assert_eq!(res.body["team_members"][0]["linkedin_link"], serde_json::Value::Null);

        app.post_form("/admin/team", &[("delete_id", id.as_str())]).await;
        let res = app.get("/admin/team").await;
        assert_eq!(res.flash_messages(), vec!["Team member deleted successfully!"]);
        assert!(res.body["team_members"].as_array().unwrap().is_empty());

        app.post_form("/admin/team", &[("delete_id", id.as_str())]).await;
        let res = app.get("/admin/team").await;
        assert_eq!(res.flash_messages(), vec!["Team member was already removed."]);
    }

    #[tokio::test]
    async fn test_invalid_team_member_rerenders_form() {
        let mut app = TestApp::new().await;
        app.login().await;
        let res = app
            .post_form("/admin/team", &[("name", "Ada"), ("position", "CTO")])
            .await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(res.body["form"]["name"], "Ada");
        assert_eq!(
            res.flash_messages(),
            vec!["Name, position, and about are required."]
        );
    }

    #[tokio::test]
    async fn test_update_of_missing_project_warns() {
        let mut app = TestApp::new().await;
        app.login().await;
        let res = app
            .post_form(
                "/admin/projects",
                &[
                    ("id", "999"),
                    ("project_name", "Site"),
                    ("company_name", "Acme"),
                    ("about", "Web"),
                ],
            )
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);

        let res = app.get("/admin/projects").await;
        assert_eq!(
            res.flash_messages(),
            vec!["That project no longer exists; nothing was updated."]
        );
        assert!(res.body["projects"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_project_is_hidden_from_about() {
        let mut app = TestApp::new().await;
        app.login().await;
        for (name, active) in [("Shown", "on"), ("Hidden", "false")] {
            app.post_form(
                "/admin/projects",
                &[
                    ("project_name", name),
                    ("company_name", "Acme"),
                    ("about", "Web"),
                    ("is_active", active),
                ],
            )
            .await;
        }

        let res = app.get("/about").await;
        assert_eq!(res.status, StatusCode::OK);
        let projects = res.body["projects"].as_array().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0]["project_name"], "Shown");
    }
}
