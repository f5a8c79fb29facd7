use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::session::{FlashLevel, Session};

pub const LOGIN_PATH: &str = "/admin/login";

/// Route layer for the admin editor: anything but an authenticated session
/// is sent to the login page with a warning, before the handler runs.
pub async fn require_admin(mut session: Session, request: Request, next: Next) -> Response {
    if session.data.admin_logged_in {
        return next.run(request).await;
    }

    tracing::warn!(
        method = %request.method(),
        uri = %request.uri(),
        "unauthenticated admin request redirected to login"
    );
    session
        .data
        .flash(FlashLevel::Warning, "Please login to access this page.");
    session.save().await;

    Redirect::to(LOGIN_PATH).into_response()
}
