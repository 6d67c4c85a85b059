mod env_overrides;
pub mod federation;
pub mod fetch;
pub mod fields;

use config::{Config, File, FileFormat, FileSourceFile};
use envconfig::Envconfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    env_overrides::{EnvVarOverrides, EnvVarOverridesError},
    federation::{FederationConfig, FederationMetadataConfig},
    fetch::{FetchConfig, SubscriptionConfig},
    fields::{
        DirectiveRenameConfig, FieldConfig, NodesMetadataConfig, TypeFieldConfig,
        TypeRenameConfig,
    },
};

/// Configuration of a single upstream GraphQL data source.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct DataSourceConfig {
    /// The upstream fetch settings used for queries and mutations.
    pub fetch: FetchConfig,
    /// The upstream settings used for subscriptions.
    #[serde(default)]
    pub subscription: Option<SubscriptionConfig>,
    #[serde(default)]
    pub federation: FederationConfig,
    /// The schema of the upstream service.
    pub upstream_schema: UpstreamSchemaSource,
    /// Fields whose type is a custom scalar carrying arbitrary JSON.
    /// They are forwarded without inspecting their arguments.
    #[serde(default)]
    pub custom_scalar_type_fields: Vec<TypeFieldConfig>,
    /// Field renames and argument sources.
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    /// Type names that differ between the client schema and the upstream schema.
    #[serde(default)]
    pub types: Vec<TypeRenameConfig>,
    /// Directive names that differ between the client schema and the upstream schema.
    #[serde(default)]
    pub directives: Vec<DirectiveRenameConfig>,
    /// Root and child nodes of the data source.
    /// When omitted they are derived from the upstream schema.
    #[serde(default)]
    pub metadata: Option<NodesMetadataConfig>,
    #[serde(default)]
    pub federation_metadata: FederationMetadataConfig,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(tag = "source")]
pub enum UpstreamSchemaSource {
    /// The SDL is part of the configuration.
    #[serde(rename = "inline")]
    Inline { sdl: String },
    /// Loads the SDL from the filesystem, relative to the configuration file.
    #[serde(rename = "file")]
    File { path: PathBuf },
}

impl Default for UpstreamSchemaSource {
    fn default() -> Self {
        UpstreamSchemaSource::Inline { sdl: String::new() }
    }
}

impl UpstreamSchemaSource {
    pub fn load(&self, root_directory: &Path) -> Result<String, ComposerConfigError> {
        match self {
            UpstreamSchemaSource::Inline { sdl } => Ok(sdl.clone()),
            UpstreamSchemaSource::File { path } => {
                let full_path = root_directory.join(path);
                std::fs::read_to_string(&full_path).map_err(|e| {
                    ComposerConfigError::UpstreamSchemaReadError(
                        full_path.display().to_string(),
                        e,
                    )
                })
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ComposerConfigError {
    #[error("Failed to load configuration: {0}")]
    ConfigLoadError(#[from] config::ConfigError),
    #[error("Failed to apply configuration overrides: {0}")]
    EnvVarOverridesError(#[from] EnvVarOverridesError),
    #[error("Failed to load the environment variables: {0}")]
    EnvVarLoadError(#[from] envconfig::Error),
    #[error("Failed to read upstream schema file '{0}': {1}")]
    UpstreamSchemaReadError(String, std::io::Error),
}

/// Loads a data source configuration file (YAML, JSON or JSON5),
/// then applies the `FETCH_COMPOSER_*` environment overrides.
pub fn load_config(config_path: &Path) -> Result<DataSourceConfig, ComposerConfigError> {
    let env_overrides = EnvVarOverrides::init_from_env()?;
    let as_file: File<FileSourceFile, _> = config_path.to_path_buf().into();
    let config = Config::builder().add_source(as_file.required(true));
    let config = env_overrides.apply_overrides(config)?;

    Ok(config.build()?.try_deserialize::<DataSourceConfig>()?)
}

pub fn parse_yaml_config(config_raw: &str) -> Result<DataSourceConfig, ComposerConfigError> {
    Ok(Config::builder()
        .add_source(File::from_str(config_raw, FileFormat::Yaml))
        .build()?
        .try_deserialize::<DataSourceConfig>()?)
}
