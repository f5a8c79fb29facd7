/**
 * Admin Session
 * Per-browser server-side state on top of tower-sessions
 */
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tower_sessions::{
    cookie::{time::OffsetDateTime, Key, SameSite},
    session::{Id, Record},
    session_store, Expiry, SessionManagerLayer, SessionStore,
};

use crate::config::SessionConfig;

pub const SESSION_COOKIE: &str = "innovara_session";

/// Key under which [`AdminSession`] is stored in the session record.
const ADMIN_SESSION_KEY: &str = "admin";

// ============================================================================
// Session data
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// A one-shot notice shown by the next rendered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// A one-time code waiting to be confirmed.
#[derive(Clone, Serialize, Deserialize)]
pub struct PendingOtp {
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub failed_attempts: u32,
}

impl std::fmt::Debug for PendingOtp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingOtp")
            .field("code", &"******")
            .field("issued_at", &self.issued_at)
            .field("failed_attempts", &self.failed_attempts)
            .finish()
    }
}

/// Where a session stands in the admin login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    OtpPending,
    Authenticated,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminSession {
    pub admin_logged_in: bool,
    pub pending_otp: Option<PendingOtp>,
    pub flashes: Vec<Flash>,
}

impl AdminSession {
    pub fn state(&self) -> AuthState {
        if self.admin_logged_in {
            AuthState::Authenticated
        } else if self.pending_otp.is_some() {
            AuthState::OtpPending
        } else {
            AuthState::Anonymous
        }
    }

    pub fn otp_sent(&self) -> bool {
        self.pending_otp.is_some()
    }

    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }

    /// Drop the login flag and any half-finished handshake.
    pub fn logout(&mut self) {
        self.admin_logged_in = false;
        self.pending_otp = None;
    }

    fn is_blank(&self) -> bool {
        !self.admin_logged_in && self.pending_otp.is_none() && self.flashes.is_empty()
    }
}

// ============================================================================
// Session store
// ============================================================================

/// Process-local [`SessionStore`] holding at most `max_entries` records.
///
/// When full, expired records go first, then the least recently active
/// ones (earliest expiry under an inactivity window).
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    records: Arc<Mutex<HashMap<Id, Record>>>,
    max_entries: usize,
}

impl MemorySessionStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            max_entries: max_entries.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }
}

fn is_live(record: &Record, now: OffsetDateTime) -> bool {
    record.expiry_date > now
}

/// Free a slot for `incoming` unless it already has one.
fn make_room(records: &mut HashMap<Id, Record>, max_entries: usize, incoming: &Id) {
    if records.len() < max_entries || records.contains_key(incoming) {
        return;
    }

    let now = OffsetDateTime::now_utc();
    records.retain(|_, record| is_live(record, now));

    while records.len() >= max_entries {
        let oldest = records
            .values()
            .min_by_key(|record| record.expiry_date)
            .map(|record| record.id);
        match oldest {
            Some(id) => {
                records.remove(&id);
            }
            None => break,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        make_room(&mut records, self.max_entries, &record.id);
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        make_room(&mut records, self.max_entries, &record.id);
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        let records = self.records.lock().await;
        let now = OffsetDateTime::now_utc();
        Ok(records
            .get(id)
            .filter(|record| is_live(record, now))
            .cloned())
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(id);
        Ok(())
    }
}

// ============================================================================
// Cookie layer
// ============================================================================

/// Cookie signing key stretched from the configured secret.
pub fn signing_key(secret: &str) -> Key {
    Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

/// Session middleware: signed `innovara_session` cookie, HttpOnly and
/// SameSite=Lax, Secure when `secure`, expiring after `ttl` of inactivity.
pub fn session_manager<S>(
    store: S,
    config: &SessionConfig,
    secure: bool,
) -> SessionManagerLayer<S, tower_sessions::service::SignedCookie>
where
    S: SessionStore + Clone,
{
    let idle = tower_sessions::cookie::time::Duration::seconds(
        i64::try_from(config.ttl.as_secs()).unwrap_or(i64::MAX),
    );

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(secure)
        .with_expiry(Expiry::OnInactivity(idle))
        .with_signed(signing_key(&config.secret))
}

// ============================================================================
// Extractor
// ============================================================================

/// The current browser's [`AdminSession`]. Changes are kept only after
/// [`Session::save`].
pub struct Session {
    inner: tower_sessions::Session,
    stored: bool,
    pub data: AdminSession,
}

impl Session {
    /// Persist `data`. A blank session is never written, so visitors that
    /// neither log in nor see a notice get no record and no cookie.
    pub async fn save(&self) {
        let result = if !self.data.is_blank() {
            self.inner.insert(ADMIN_SESSION_KEY, &self.data).await
        } else if self.stored {
            self.inner
                .remove::<AdminSession>(ADMIN_SESSION_KEY)
                .await
                .map(|_| ())
        } else {
            Ok(())
        };

        if let Err(e) = result {
            tracing::error!(error = %e, "failed to save session");
        }
    }

    /// Move the session to a new id, e.g. after a privilege change.
    pub async fn renew(&self) {
        if let Err(e) = self.inner.cycle_id().await {
            tracing::error!(error = %e, "failed to renew session id");
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let inner = tower_sessions::Session::from_request_parts(parts, state).await?;

        let stored = inner
            .get::<AdminSession>(ADMIN_SESSION_KEY)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to load session");
                (StatusCode::INTERNAL_SERVER_ERROR, "session unavailable")
            })?;

        Ok(Self {
            inner,
            stored: stored.is_some(),
            data: stored.unwrap_or_default(),
        })
    }
}
