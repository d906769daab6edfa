use std::sync::Arc;

use crate::auth::repo::UserStore;
use crate::config::AppConfig;
use crate::notify::ResetNotifier;

/// Shared application state. The store and notifier are trait objects so
/// the binary wires Postgres and the mailer stub while tests wire doubles.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub notifier: Arc<dyn ResetNotifier>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn from_parts(
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn ResetNotifier>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }
}
