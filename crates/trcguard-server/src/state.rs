use std::sync::Arc;
use trcguard_store::{KgStore, create_store};

use crate::config::AppConfig;
use crate::generator::{SqlGenerator, create_generator};

/// Shared application state.
pub struct AppState {
    pub cfg: AppConfig,
    pub store: Arc<dyn KgStore>,
    pub generator: Arc<dyn SqlGenerator>,
}

impl AppState {
    /// Build the store and generator named by `cfg` and initialize the generator.
    pub async fn init(cfg: &AppConfig) -> anyhow::Result<Self> {
        let store = create_store(cfg.store.backend, &cfg.store.dir)?;
        let generator = create_generator(&cfg.generator);
        generator.initialize().await?;

        tracing::info!(
            backend = ?cfg.store.backend,
            generator = ?cfg.generator.kind,
            "Application state ready"
        );

        Ok(Self::new(cfg.clone(), store, generator))
    }

    pub fn new(
        cfg: AppConfig,
        store: Arc<dyn KgStore>,
        generator: Arc<dyn SqlGenerator>,
    ) -> Self {
        Self {
            cfg,
            store,
            generator,
        }
    }
}
