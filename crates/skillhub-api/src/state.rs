use std::sync::Arc;

use skillhub_db::Database;
use tracing::error;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub settings: ApiSettings,
}

/// Behaviour knobs the server reads from its environment.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Forked plans start with every unit incomplete instead of copying progress.
    pub reset_units_on_fork: bool,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            reset_units_on_fork: false,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl ApiSettings {
    /// Falls back to the default size when none is given and caps the rest.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

impl AppStateInner {
    pub fn new(db: Database, settings: ApiSettings) -> AppState {
        Arc::new(Self { db, settings })
    }
}

/// Runs a service call on the blocking pool; every service talks to SQLite
/// synchronously.
pub async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_defaults_and_caps() {
        let settings = ApiSettings::default();
        assert_eq!(settings.page_size(None), 10);
        assert_eq!(settings.page_size(Some(0)), 1);
        assert_eq!(settings.page_size(Some(25)), 25);
        assert_eq!(settings.page_size(Some(5000)), 100);
    }
}
