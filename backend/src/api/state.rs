use std::sync::Arc;

use crate::auth::CredentialStore;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(config: AppConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            config: Arc::new(config),
            credentials,
        }
    }
}
