use std::sync::Arc;

use tracing::{debug, instrument};

use crate::storage::{Application, MonitorStore, MonitoringConfig, StorageResult};

/// Loads per-application monitoring configuration, creating defaults lazily
///
/// A missing configuration is never an error: the documented defaults are
/// persisted on first access and returned. Concurrent first accesses
/// converge on a single row because the insert is conditional on absence.
#[derive(Clone)]
pub struct ConfigResolver {
    store: Arc<dyn MonitorStore>,
}

impl ConfigResolver {
    pub fn new(store: Arc<dyn MonitorStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, app), fields(app = %app.name))]
    pub async fn resolve(&self, app: &Application) -> StorageResult<MonitoringConfig> {
        if let Some(config) = self.store.get_monitoring_config(app.id).await? {
            return Ok(config);
        }

        debug!("no monitoring config stored, creating defaults");
        self.store
            .insert_monitoring_config_if_absent(&MonitoringConfig::defaults_for(app.id))
            .await
    }
}
