use std::sync::Arc;

use super::{
    KikuConfig,
    KikuError,
};
use crate::assets::{
    self,
    AssetSource,
};

/// Everything the engine needs from its host, passed in explicitly at
/// construction time.
#[derive(Clone)]
pub struct SessionContext {
    pub config: Arc<KikuConfig>,
    pub assets: Arc<dyn AssetSource>,
}

impl SessionContext {
    pub fn new(config: KikuConfig, assets: Arc<dyn AssetSource>) -> Self {
        Self { config: Arc::new(config), assets }
    }

    /// Builds the asset source from `config.assets_path`.
    pub fn from_config(config: KikuConfig) -> Result<Self, KikuError> {
        let assets = assets::source_for(&config.assets_path)?;
        Ok(Self::new(config, assets))
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("config", &self.config)
            .field("assets", &self.assets.describe())
            .finish()
    }
}
