use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::{Authenticator, MemorySessionStore};
use crate::config::AppConfig;
use crate::db::ContentStore;
use crate::notify::{EmailTransport, Notifier};

/// Shared handles for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: ContentStore,
    pub sessions: MemorySessionStore,
    pub notifier: Arc<Notifier>,
    pub authenticator: Arc<Authenticator>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: SqlitePool, transport: Arc<dyn EmailTransport>) -> Self {
        let sessions = MemorySessionStore::new(config.session.max_entries);
        let notifier = Arc::new(Notifier::new(transport, &config.email));
        let authenticator = Arc::new(Authenticator::new(config.admin.clone(), config.otp.clone()));

        Self {
            config: Arc::new(config),
            store: ContentStore::new(pool),
            sessions,
            notifier,
            authenticator,
        }
    }
}
