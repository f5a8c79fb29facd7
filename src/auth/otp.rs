//! Two-step admin login.
//!
//! `Anonymous -> OtpPending` on matching credentials plus a delivered code,
//! `OtpPending -> Authenticated` on the matching code. The whole state lives
//! in the caller's [`AdminSession`]; the authenticator holds only config.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::{AdminSession, PendingOtp};
use super::{constant_time_eq, generate_otp};
use crate::config::{AdminConfig, AdminSecret, OtpPolicy};
use crate::notify::Notifier;

/// Fields posted by the login form. The OTP step re-posts the username.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    InvalidCredentials,
    EmailRequired,
    OtpSent,
    DeliveryFailed,
    InvalidOtp,
    /// Pending code older than the configured window; handshake restarted.
    OtpExpired,
    /// Too many wrong codes; handshake restarted.
    AttemptsExhausted,
    Authenticated,
}

pub struct Authenticator {
    admin: AdminConfig,
    policy: OtpPolicy,
}

impl Authenticator {
    pub fn new(admin: AdminConfig, policy: OtpPolicy) -> Self {
        Self { admin, policy }
    }

    pub async fn submit(
        &self,
        session: &mut AdminSession,
        form: &LoginForm,
        notifier: &Notifier,
    ) -> LoginOutcome {
        self.submit_at(session, form, notifier, Utc::now()).await
    }

    /// While a code is pending every submission is treated as the code step.
    pub async fn submit_at(
        &self,
        session: &mut AdminSession,
        form: &LoginForm,
        notifier: &Notifier,
        now: DateTime<Utc>,
    ) -> LoginOutcome {
        if session.otp_sent() {
            self.confirm_code(session, form, now)
        } else {
            self.check_credentials(session, form, notifier, now).await
        }
    }

    async fn credentials_match(&self, username: &str, password: &str) -> bool {
        let username_ok = constant_time_eq(username, &self.admin.username);

        let password_ok = match &self.admin.secret {
            AdminSecret::Plain(expected) => constant_time_eq(password, expected),
            AdminSecret::Bcrypt(hash) => {
                // bcrypt is CPU-bound; keep the async executor free.
                let password = password.to_string();
                let hash = hash.clone();
                tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash).unwrap_or(false))
                    .await
                    .unwrap_or(false)
            }
        };

        username_ok & password_ok
    }

    async fn check_credentials(
        &self,
        session: &mut AdminSession,
        form: &LoginForm,
        notifier: &Notifier,
        now: DateTime<Utc>,
    ) -> LoginOutcome {
        if !self.credentials_match(&form.username, &form.password).await {
            tracing::warn!(username = %form.username, "invalid admin credentials");
            return LoginOutcome::InvalidCredentials;
        }

        let email = form.email.trim();
        if email.is_empty() {
            return LoginOutcome::EmailRequired;
        }

        let code = generate_otp();
        session.pending_otp = Some(PendingOtp {
            code: code.clone(),
            issued_at: now,
            failed_attempts: 0,
        });

        match notifier.send_otp(email, &code, &form.username).await {
            Ok(()) => LoginOutcome::OtpSent,
            Err(_) => {
                // A code the admin never received must not stay redeemable.
                session.pending_otp = None;
                LoginOutcome::DeliveryFailed
            }
        }
    }

    fn confirm_code(
        &self,
        session: &mut AdminSession,
        form: &LoginForm,
        now: DateTime<Utc>,
    ) -> LoginOutcome {
        let Some(pending) = session.pending_otp.as_mut() else {
            return LoginOutcome::InvalidOtp;
        };

        if let Some(ttl) = self.policy.ttl {
            let age = now
                .signed_duration_since(pending.issued_at)
                .to_std()
                .unwrap_or_default();
            if age > ttl {
                tracing::info!("pending admin OTP expired");
                session.pending_otp = None;
                return LoginOutcome::OtpExpired;
            }
        }

        let code_ok = constant_time_eq(form.otp.trim(), &pending.code);
        let username_ok = constant_time_eq(&form.username, &self.admin.username);

        if code_ok & username_ok {
            session.admin_logged_in = true;
            session.pending_otp = None;
            tracing::info!(username = %form.username, "admin logged in");
            return LoginOutcome::Authenticated;
        }

        pending.failed_attempts += 1;
        tracing::warn!(attempts = pending.failed_attempts, "invalid admin OTP");

        if let Some(max) = self.policy.max_attempts {
            if pending.failed_attempts >= max {
                session.pending_otp = None;
                return LoginOutcome::AttemptsExhausted;
            }
        }

        LoginOutcome::InvalidOtp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::AuthState;
    use crate::config::AppConfig;
    use crate::notify::testing::{Behaviour, RecordingTransport};
    use std::sync::Arc;
    use std::time::Duration;

    fn setup(behaviour: Behaviour, policy: OtpPolicy) -> (Authenticator, Notifier, Arc<RecordingTransport>) {
        let config = AppConfig::for_tests();
        let transport = RecordingTransport::new(behaviour);
        let notifier = Notifier::new(transport.clone(), &config.email);
        (Authenticator::new(config.admin, policy), notifier, transport)
    }

    fn credentials(email: &str) -> LoginForm {
        LoginForm {
            username: "admin".to_string(),
            password: "s3cret-pass".to_string(),
            email: email.to_string(),
            otp: String::new(),
        }
    }

    fn code_step(otp: &str) -> LoginForm {
        LoginForm {
            username: "admin".to_string(),
            otp: otp.to_string(),
            ..Default::default()
        }
    }

    fn wrong_code(code: &str) -> String {
        let first = if code.starts_with('0') { '1' } else { '0' };
        format!("{}{}", first, &code[1..])
    }

    #[tokio::test]
    async fn test_full_handshake_authenticates() {
        let (auth, notifier, transport) = setup(Behaviour::Deliver, OtpPolicy::default());
        let mut session = AdminSession::default();

        let outcome = auth.submit(&mut session, &credentials("me@example.com"), &notifier).await;
        assert_eq!(outcome, LoginOutcome::OtpSent);
        assert_eq!(session.state(), AuthState::OtpPending);

        let code = session.pending_otp.as_ref().unwrap().code.clone();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(transport.last_otp().as_deref(), Some(code.as_str()));

        let outcome = auth.submit(&mut session, &code_step(&code), &notifier).await;
        assert_eq!(outcome, LoginOutcome::Authenticated);
        assert_eq!(session.state(), AuthState::Authenticated);
        assert!(session.pending_otp.is_none());
    }

    #[tokio::test]
    async fn test_wrong_code_stays_pending_and_allows_retry() {
        let (auth, notifier, _) = setup(Behaviour::Deliver, OtpPolicy::default());
        let mut session = AdminSession::default();
        auth.submit(&mut session, &credentials("me@example.com"), &notifier).await;
        let code = session.pending_otp.as_ref().unwrap().code.clone();

        for _ in 0..3 {
            let outcome = auth
                .submit(&mut session, &code_step(&wrong_code(&code)), &notifier)
                .await;
            assert_eq!(outcome, LoginOutcome::InvalidOtp);
            assert_eq!(session.state(), AuthState::OtpPending);
        }

        let outcome = auth.submit(&mut session, &code_step(&code), &notifier).await;
        assert_eq!(outcome, LoginOutcome::Authenticated);
    }

    #[tokio::test]
    async fn test_code_step_requires_admin_username() {
        let (auth, notifier, _) = setup(Behaviour::Deliver, OtpPolicy::default());
        let mut session = AdminSession::default();
        auth.submit(&mut session, &credentials("me@example.com"), &notifier).await;
        let code = session.pending_otp.as_ref().unwrap().code.clone();

        let mut form = code_step(&code);
        form.username = "intruder".to_string();
        assert_eq!(auth.submit(&mut session, &form, &notifier).await, LoginOutcome::InvalidOtp);
        assert!(!session.admin_logged_in);
    }

    #[tokio::test]
    async fn test_bad_credentials_send_nothing() {
        let (auth, notifier, transport) = setup(Behaviour::Deliver, OtpPolicy::default());
        let mut session = AdminSession::default();

        let mut form = credentials("me@example.com");
        form.password = "S3cret-pass".to_string();
        assert_eq!(
            auth.submit(&mut session, &form, &notifier).await,
            LoginOutcome::InvalidCredentials
        );

        let mut form = credentials("me@example.com");
        form.username = "Admin".to_string();
        assert_eq!(
            auth.submit(&mut session, &form, &notifier).await,
            LoginOutcome::InvalidCredentials
        );

        assert_eq!(session.state(), AuthState::Anonymous);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_email_stays_anonymous() {
        let (auth, notifier, transport) = setup(Behaviour::Deliver, OtpPolicy::default());
        let mut session = AdminSession::default();

        let outcome = auth.submit(&mut session, &credentials("   "), &notifier).await;
        assert_eq!(outcome, LoginOutcome::EmailRequired);
        assert_eq!(session.state(), AuthState::Anonymous);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_clears_pending_code() {
        let (auth, notifier, transport) = setup(Behaviour::Reject, OtpPolicy::default());
        let mut session = AdminSession::default();

        let outcome = auth.submit(&mut session, &credentials("me@example.com"), &notifier).await;
        assert_eq!(outcome, LoginOutcome::DeliveryFailed);
        assert_eq!(session.state(), AuthState::Anonymous);
        assert_eq!(transport.sent().len(), 1);

        transport.set_behaviour(Behaviour::Deliver);
        let outcome = auth.submit(&mut session, &credentials("me@example.com"), &notifier).await;
        assert_eq!(outcome, LoginOutcome::OtpSent);
    }

    #[tokio::test]
    async fn test_delivery_timeout_is_a_failure() {
        let (auth, notifier, _) = setup(Behaviour::Hang(Duration::from_secs(5)), OtpPolicy::default());
        let mut session = AdminSession::default();

        let outcome = auth.submit(&mut session, &credentials("me@example.com"), &notifier).await;
        assert_eq!(outcome, LoginOutcome::DeliveryFailed);
        assert!(session.pending_otp.is_none());
    }

    #[tokio::test]
    async fn test_expired_code_restarts_handshake() {
        let policy = OtpPolicy {
            ttl: Some(Duration::from_secs(300)),
            max_attempts: None,
        };
        let (auth, notifier, _) = setup(Behaviour::Deliver, policy);
        let mut session = AdminSession::default();
        let start = Utc::now();

        auth.submit_at(&mut session, &credentials("me@example.com"), &notifier, start)
            .await;
        let code = session.pending_otp.as_ref().unwrap().code.clone();

        let late = start + chrono::Duration::seconds(301);
        let outcome = auth.submit_at(&mut session, &code_step(&code), &notifier, late).await;
        assert_eq!(outcome, LoginOutcome::OtpExpired);
        assert_eq!(session.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_code_within_window_is_accepted() {
        let policy = OtpPolicy {
            ttl: Some(Duration::from_secs(300)),
            max_attempts: None,
        };
        let (auth, notifier, _) = setup(Behaviour::Deliver, policy);
        let mut session = AdminSession::default();
        let start = Utc::now();

        auth.submit_at(&mut session, &credentials("me@example.com"), &notifier, start)
            .await;
        let code = session.pending_otp.as_ref().unwrap().code.clone();

        let soon = start + chrono::Duration::seconds(299);
        let outcome = auth.submit_at(&mut session, &code_step(&code), &notifier, soon).await;
        assert_eq!(outcome, LoginOutcome::Authenticated);
    }

    #[tokio::test]
    async fn test_attempt_limit_restarts_handshake() {
        let policy = OtpPolicy {
            ttl: None,
            max_attempts: Some(2),
        };
        let (auth, notifier, _) = setup(Behaviour::Deliver, policy);
        let mut session = AdminSession::default();
        auth.submit(&mut session, &credentials("me@example.com"), &notifier).await;
        let bad = wrong_code(&session.pending_otp.as_ref().unwrap().code);

        assert_eq!(
            auth.submit(&mut session, &code_step(&bad), &notifier).await,
            LoginOutcome::InvalidOtp
        );
        assert_eq!(
            auth.submit(&mut session, &code_step(&bad), &notifier).await,
            LoginOutcome::AttemptsExhausted
        );
        assert_eq!(session.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_bcrypt_secret_is_accepted() {
        let config = AppConfig::for_tests();
        let transport = RecordingTransport::new(Behaviour::Deliver);
        let notifier = Notifier::new(transport, &config.email);
        let hash = bcrypt::hash("hashed-pass", 4).unwrap();
        let auth = Authenticator::new(
            AdminConfig {
                username: "admin".to_string(),
                secret: AdminSecret::Bcrypt(hash),
            },
            OtpPolicy::default(),
        );

        let mut session = AdminSession::default();
        let mut form = credentials("me@example.com");
        form.password = "hashed-pass".to_string();
        assert_eq!(auth.submit(&mut session, &form, &notifier).await, LoginOutcome::OtpSent);

        let mut session = AdminSession::default();
        form.password = "wrong".to_string();
        assert_eq!(
            auth.submit(&mut session, &form, &notifier).await,
            LoginOutcome::InvalidCredentials
        );
    }
}
