/**
 * Routes Module
 * Page and admin handlers
 */
pub mod admin;
pub mod blog;
pub mod editor;
pub mod health;
pub mod pages;
pub mod partner;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

use crate::auth::{Flash, Session};

/// Everything a page template would receive: its name, the pending notices
/// and the page's own data flattened alongside.
#[derive(Debug, Serialize)]
pub struct View<T: Serialize> {
    pub page: &'static str,
    pub flashes: Vec<Flash>,
    #[serde(flatten)]
    pub data: T,
}

/// View data for pages that carry nothing but notices.
#[derive(Debug, Serialize)]
pub struct NoData {}

/// Drain the session's notices into a view and persist the session.
pub async fn render<T: Serialize>(
    session: &mut Session,
    status: StatusCode,
    page: &'static str,
    data: T,
) -> Response {
    let flashes = session.data.take_flashes();
    session.save().await;
    (status, Json(View { page, flashes, data })).into_response()
}

/// Persist the session (and any queued notices) then send the browser on.
pub async fn redirect(session: &Session, to: &str) -> Response {
    session.save().await;
    Redirect::to(to).into_response()
}

/// Trim a form value; blank means absent.
pub(crate) fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
