/**
 * Configuration
 * Environment-provided settings, every value with a default
 */
use rand::distr::{Alphanumeric, SampleString};
use std::time::Duration;

use crate::db::DbConfig;

const DEFAULT_EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// How the admin password is checked.
#[derive(Clone)]
pub enum AdminSecret {
    Plain(String),
    /// bcrypt hash produced by the `hash-password` binary
    Bcrypt(String),
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminSecret::Plain(_) => f.write_str("Plain(***)"),
            AdminSecret::Bcrypt(_) => f.write_str("Bcrypt(***)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub secret: AdminSecret,
}

/// Optional limits on a pending one-time code. Both unset means the code
/// never expires and can be retried indefinitely.
#[derive(Debug, Clone, Default)]
pub struct OtpPolicy {
    pub ttl: Option<Duration>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub endpoint: String,
    pub service_id: String,
    pub otp_template_id: String,
    pub contact_template_id: String,
    pub public_key: String,
    pub access_token: String,
    pub contact_email: String,
    pub timeout: Duration,
}

/// Longest accepted SESSION_TTL_HOURS (one year).
const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    /// Idle time after which a session expires.
    pub ttl: Duration,
    /// Upper bound on sessions held in memory.
    pub max_entries: usize,
}

/// Session lifetime in hours, clamped to `1..=MAX_SESSION_TTL_HOURS`.
fn session_ttl(hours: Option<u64>) -> Duration {
    let hours = hours.unwrap_or(24).clamp(1, MAX_SESSION_TTL_HOURS);
    Duration::from_secs(hours * 3600)
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub database: DbConfig,
    pub admin: AdminConfig,
    pub otp: OtpPolicy,
    pub email: EmailConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let secret = match std::env::var("ADMIN_PASSWORD_HASH") {
            Ok(hash) if !hash.trim().is_empty() => AdminSecret::Bcrypt(hash),
            _ => AdminSecret::Plain(env_or("ADMIN_PASSWORD", "admin123")),
        };

        let session_secret = std::env::var("SECRET_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!(
                    "SECRET_KEY not set; generated a per-process key, sessions will not survive a restart"
                );
                Alphanumeric.sample_string(&mut rand::rng(), 64)
            });

        Self {
            environment: env_or("ENVIRONMENT", "development"),
            host: env_or("HOST", "127.0.0.1"),
            port: env_parse("PORT").unwrap_or(5000),
            database: DbConfig::default(),
            admin: AdminConfig {
                username: env_or("ADMIN_USERNAME", "admin"),
                secret,
            },
            otp: OtpPolicy {
                ttl: env_parse::<u64>("OTP_TTL_SECS").map(Duration::from_secs),
                max_attempts: env_parse("OTP_MAX_ATTEMPTS"),
            },
            email: EmailConfig {
                endpoint: env_or("EMAILJS_ENDPOINT", DEFAULT_EMAILJS_ENDPOINT),
                service_id: env_or("EMAILJS_SERVICE_ID", ""),
                otp_template_id: env_or("EMAILJS_TEMPLATE_ID", ""),
                contact_template_id: env_or("CONTACT_TEMPLATE_ID", ""),
                public_key: env_or("EMAILJS_PUBLIC_KEY", ""),
                access_token: env_or("EMAILJS_ACCESS_TOKEN", ""),
                contact_email: env_or("CONTACT_EMAIL", "contact@example.com"),
                timeout: Duration::from_secs(env_parse("EMAIL_TIMEOUT_SECS").unwrap_or(10)),
            },
            session: SessionConfig {
                secret: session_secret,
                ttl: session_ttl(env_parse("SESSION_TTL_HOURS")),
                max_entries: env_parse("SESSION_MAX_ENTRIES").unwrap_or(10_000),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Log insecure defaults. Only warns; the site still starts.
    pub fn warn_insecure_defaults(&self) {
        if !self.is_production() {
            return;
        }
        if std::env::var("SECRET_KEY").map(|s| s.is_empty()).unwrap_or(true) {
            tracing::warn!("SECURITY: SECRET_KEY is not set in production");
        }
        if matches!(&self.admin.secret, AdminSecret::Plain(p) if p == "admin123") {
            tracing::warn!(
                "SECURITY: the admin password is the insecure default. \
                 Set ADMIN_PASSWORD_HASH to a bcrypt hash of a strong password."
            );
        }
        if self.email.service_id.is_empty() || self.email.otp_template_id.is_empty() {
            tracing::warn!("EmailJS is not configured; admin OTP delivery will fail");
        }
    }
}

#[cfg(test)]
impl AppConfig {
    /// Fixed configuration for router and authenticator tests.
    pub(crate) fn for_tests() -> Self {
        Self {
            environment: "test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            database: DbConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
                min_connections: 1,
                connect_timeout_secs: 5,
                idle_timeout_secs: 300,
            },
            admin: AdminConfig {
                username: "admin".to_string(),
                secret: AdminSecret::Plain("s3cret-pass".to_string()),
            },
            otp: OtpPolicy::default(),
            email: EmailConfig {
                endpoint: DEFAULT_EMAILJS_ENDPOINT.to_string(),
                service_id: "service_test".to_string(),
                otp_template_id: "template_otp".to_string(),
                contact_template_id: "template_contact".to_string(),
                public_key: "public_key".to_string(),
                access_token: "access_token".to_string(),
                contact_email: "inbox@example.com".to_string(),
                timeout: Duration::from_millis(200),
            },
            session: SessionConfig {
                secret: "test-session-secret".to_string(),
                ttl: Duration::from_secs(3600),
                max_entries: 16,
            },
        }
    }
}
