use config::{builder::BuilderState, ConfigBuilder, ConfigError};
use envconfig::Envconfig;
use tracing::debug;

#[derive(Envconfig)]
pub struct EnvVarOverrides {
    #[envconfig(from = "FETCH_COMPOSER_FETCH_URL")]
    pub fetch_url: Option<String>,
    #[envconfig(from = "FETCH_COMPOSER_FETCH_METHOD")]
    pub fetch_method: Option<String>,
    #[envconfig(from = "FETCH_COMPOSER_SUBSCRIPTION_URL")]
    pub subscription_url: Option<String>,
    #[envconfig(from = "FETCH_COMPOSER_FEDERATION_ENABLED")]
    pub federation_enabled: Option<bool>,
    #[envconfig(from = "FETCH_COMPOSER_UPSTREAM_SCHEMA_PATH")]
    pub upstream_schema_path: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvVarOverridesError {
    #[error("Failed to override configuration: {0}")]
    FailedToOverrideConfig(#[from] ConfigError),
}

impl EnvVarOverrides {
    pub fn apply_overrides<T: BuilderState>(
        mut self,
        mut config: ConfigBuilder<T>,
    ) -> Result<ConfigBuilder<T>, EnvVarOverridesError> {
        if let Some(fetch_url) = self.fetch_url.take() {
            debug!("[config-override] 'fetch.url' = {}", fetch_url);
            config = config.set_override("fetch.url", fetch_url)?;
        }

        if let Some(fetch_method) = self.fetch_method.take() {
            debug!("[config-override] 'fetch.method' = {}", fetch_method);
            config = config.set_override("fetch.method", fetch_method)?;
        }

        if let Some(subscription_url) = self.subscription_url.take() {
            debug!("[config-override] 'subscription.url' = {}", subscription_url);
            config = config.set_override("subscription.url", subscription_url)?;
        }

        if let Some(enabled) = self.federation_enabled.take() {
            debug!("[config-override] 'federation.enabled' = {}", enabled);
            config = config.set_override("federation.enabled", enabled)?;
        }

        if let Some(path) = self.upstream_schema_path.take() {
            debug!("[config-override] 'upstream_schema.path' = {}", path);
            config = config.set_override("upstream_schema.source", "file")?;
            config = config.set_override("upstream_schema.path", path)?;
        }

        Ok(config)
    }
}
