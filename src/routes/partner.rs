/**
 * Partner Routes
 * Contact form forwarded by email, failing soft
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Form};
use chrono::Local;
use serde::{Deserialize, Serialize};

use super::{redirect, render};
use crate::auth::{FlashLevel, Session};
use crate::notify::ContactMessage;
use crate::state::AppState;

const THANK_YOU: &str =
    "Thank you for your interest! We have received your message and will get back to you soon.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PartnerPage {
    pub form: ContactForm,
}

/// GET /partner
pub async fn partner_page(mut session: Session) -> impl IntoResponse {
    render(
        &mut session,
        StatusCode::OK,
        "partner",
        PartnerPage {
            form: ContactForm::default(),
        },
    )
    .await
}

/// POST /partner
///
/// Once the form validates the submitter is always thanked; a delivery
/// failure only reaches the logs and the notifier's failure record.
pub async fn submit_contact(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<ContactForm>,
) -> impl IntoResponse {
    let form = ContactForm {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        message: form.message.trim().to_string(),
    };

    if form.name.is_empty() || form.email.is_empty() || form.message.is_empty() {
        session
            .data
            .flash(FlashLevel::Danger, "Please fill in all required fields.");
        return render(
            &mut session,
            StatusCode::UNPROCESSABLE_ENTITY,
            "partner",
            PartnerPage { form },
        )
        .await;
    }

    let contact = ContactMessage {
        timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        name: form.name,
        email: form.email,
        message: form.message,
    };
    state.notifier.send_contact(&contact).await;

    session.data.flash(FlashLevel::Success, THANK_YOU);
    redirect(&session, "/partner").await
}
