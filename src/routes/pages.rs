use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::{render, NoData};
use crate::auth::{FlashLevel, Session};
use crate::db::models::{Project, TeamMember};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AboutPage {
    pub team_members: Vec<TeamMember>,
    pub projects: Vec<Project>,
}

/// GET /
pub async fn index(mut session: Session) -> impl IntoResponse {
    render(&mut session, StatusCode::OK, "index", NoData {}).await
}

/// GET /services
pub async fn services(mut session: Session) -> impl IntoResponse {
    render(&mut session, StatusCode::OK, "services", NoData {}).await
}

/// GET /about - active team members and projects
pub async fn about(State(state): State<AppState>, mut session: Session) -> impl IntoResponse {
    let team = state.store.list_active_team().await;
    let projects = state.store.list_active_projects().await;

    match (team, projects) {
        (Ok(team_members), Ok(projects)) => {
            render(
                &mut session,
                StatusCode::OK,
                "about",
                AboutPage {
                    team_members,
                    projects,
                },
            )
            .await
        }
        (team, projects) => {
            if let Err(e) = team {
                tracing::error!(error = %e, "failed to load team members");
            }
            if let Err(e) = projects {
                tracing::error!(error = %e, "failed to load projects");
            }
            session
                .data
                .flash(FlashLevel::Danger, "Could not load this page. Please try again later.");
            render(
                &mut session,
                StatusCode::INTERNAL_SERVER_ERROR,
                "about",
                AboutPage {
                    team_members: vec![],
                    projects: vec![],
                },
            )
            .await
        }
    }
}
