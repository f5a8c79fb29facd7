/**
 * Admin Login Routes
 * Credential + emailed code handshake, logout
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Form};
use serde::Serialize;

use super::{redirect, render};
use crate::auth::{FlashLevel, LoginForm, LoginOutcome, Session};
use crate::state::AppState;

#[derive(Debug, Default, Serialize)]
pub struct LoginPage {
    pub show_otp: bool,
    pub username: String,
    pub email: String,
}

/// GET /admin/login
pub async fn login_page(mut session: Session) -> impl IntoResponse {
    let page = LoginPage {
        show_otp: session.data.otp_sent(),
        ..Default::default()
    };
    render(&mut session, StatusCode::OK, "admin_login", page).await
}

/// POST /admin/login
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> impl IntoResponse {
    let outcome = state
        .authenticator
        .submit(&mut session.data, &form, &state.notifier)
        .await;

    let retained = |show_otp: bool| LoginPage {
        show_otp,
        username: form.username.clone(),
        email: form.email.clone(),
    };

    let (status, level, message, page) = match outcome {
        LoginOutcome::Authenticated => {
            session.renew().await;
            session.data.flash(FlashLevel::Success, "Login successful!");
            return redirect(&session, "/admin/create").await;
        }
        LoginOutcome::OtpSent => (
            StatusCode::OK,
            FlashLevel::Success,
            "OTP sent to your email. Please check and enter the code.",
            retained(true),
        ),
        LoginOutcome::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            FlashLevel::Danger,
            "Invalid username or password.",
            LoginPage::default(),
        ),
        LoginOutcome::EmailRequired => (
            StatusCode::UNPROCESSABLE_ENTITY,
            FlashLevel::Warning,
            "Please provide your email for OTP verification.",
            LoginPage {
                username: form.username.clone(),
                ..Default::default()
            },
        ),
        LoginOutcome::DeliveryFailed => (
            StatusCode::BAD_GATEWAY,
            FlashLevel::Danger,
            "Failed to send OTP. Please try again.",
            retained(false),
        ),
        LoginOutcome::InvalidOtp => (
            StatusCode::UNAUTHORIZED,
            FlashLevel::Danger,
            "Invalid OTP. Please try again.",
            retained(true),
        ),
        LoginOutcome::OtpExpired => (
            StatusCode::UNAUTHORIZED,
            FlashLevel::Warning,
            "Your code has expired. Please sign in again.",
            retained(false),
        ),
        LoginOutcome::AttemptsExhausted => (
            StatusCode::UNAUTHORIZED,
            FlashLevel::Danger,
            "Too many invalid codes. Please sign in again.",
            retained(false),
        ),
    };

    session.data.flash(level, message);
    render(&mut session, status, "admin_login", page).await
}

/// GET /admin/logout
pub async fn logout(mut session: Session) -> impl IntoResponse {
    session.data.logout();
    session.data.flash(FlashLevel::Info, "You have been logged out.");
    redirect(&session, "/").await
}
