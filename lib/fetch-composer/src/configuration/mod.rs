mod planner;

use std::{path::Path, sync::Arc};

use hive_router_composer_config::{
    fetch::{FetchConfig, SubscriptionConfig},
    fields::{
        DirectiveRenameConfig, FieldConfig, NodesMetadataConfig, TypeFieldConfig,
        TypeFieldsConfig, TypeRenameConfig,
    },
    ComposerConfigError, DataSourceConfig,
};
use http::{
    header::{InvalidHeaderName, InvalidHeaderValue},
    method::InvalidMethod,
};
use regex_automata::{meta, util::syntax::Config as SyntaxConfig};
use tracing::{debug, instrument};

use crate::{
    federation::FederationMetadata,
    schema::{
        base::{build_base_validation_schema, build_federation_validation_schema, entity_type_names},
        SchemaIndex, TypeDefinition,
    },
    utils::parsing::{parse_schema, to_validation_schema, SchemaDocument, ValidationSchemaDocument},
};

pub use planner::{DataSourcePlannerConfiguration, PathType, ProvidedField};

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to parse the upstream schema: {0}")]
    InvalidUpstreamSchema(String),
    #[error("The upstream schema has no query root type '{0}'")]
    MissingQueryType(String),
    #[error("Federation is enabled but no service SDL was provided")]
    MissingServiceSdl,
    #[error("Failed to parse the federation service SDL: {0}")]
    InvalidServiceSdl(String),
    #[error("The fetch configuration has no url")]
    EmptyFetchUrl,
    #[error("Invalid HTTP method '{0}': {1}")]
    InvalidMethod(String, InvalidMethod),
    #[error("Invalid header name '{0}'. Please check the configuration. Reason: {1}")]
    BadHeaderName(String, InvalidHeaderName),
    #[error("Invalid header value for header '{0}'. Please check the configuration. Reason: {1}")]
    BadHeaderValue(String, InvalidHeaderValue),
    #[error("The subscription configuration has no url")]
    EmptySubscriptionUrl,
    #[error(transparent)]
    UpstreamSchemaLoad(#[from] ComposerConfigError),
    #[error("Failed to build regex for forwarded client headers. Reason: {0}")]
    RegexBuild(#[from] Box<meta::BuildError>),
}

/// The validated configuration of one upstream data source.
///
/// Built once and shared read-only, behind `Arc`, by every planner of the data source.
#[derive(Debug)]
pub struct DataSourceConfiguration {
    pub fetch: FetchConfig,
    pub subscription: Option<SubscriptionConfig>,
    pub federation_enabled: bool,
    pub upstream_document: Arc<SchemaDocument>,
    pub upstream_schema: Arc<SchemaIndex>,
    /// The schema synthesized operations are validated against.
    pub validation_schema: Arc<SchemaDocument>,
    /// `validation_schema` in the AST of the validation rules.
    pub validation_document: Arc<ValidationSchemaDocument>,
    pub custom_scalar_type_fields: Vec<TypeFieldConfig>,
    pub fields: Vec<FieldConfig>,
    pub types: Vec<TypeRenameConfig>,
    pub directives: Vec<DirectiveRenameConfig>,
    pub metadata: NodesMetadataConfig,
    pub federation: FederationMetadata,
}

impl DataSourceConfiguration {
    #[instrument(level = "trace", skip_all, fields(url = %config.fetch.url))]
    pub fn new(config: DataSourceConfig, upstream_sdl: &str) -> Result<Self, ConfigurationError> {
        validate_fetch(&config.fetch)?;
        if let Some(subscription) = &config.subscription {
            validate_subscription(subscription)?;
        }

        let upstream_document = parse_schema(upstream_sdl)
            .map_err(|err| ConfigurationError::InvalidUpstreamSchema(err.to_string()))?;
        let upstream_schema = SchemaIndex::new(&upstream_document);
        if !matches!(
            upstream_schema.type_definition(&upstream_schema.query_type),
            Some(TypeDefinition::Object(_))
        ) {
            return Err(ConfigurationError::MissingQueryType(
                upstream_schema.query_type.clone(),
            ));
        }

        let service_document = match (config.federation.enabled, &config.federation.service_sdl) {
            (true, None) => return Err(ConfigurationError::MissingServiceSdl),
            (true, Some(sdl)) if sdl.trim().is_empty() => {
                return Err(ConfigurationError::MissingServiceSdl)
            }
            (true, Some(sdl)) => Some(
                parse_schema(sdl)
                    .map_err(|err| ConfigurationError::InvalidServiceSdl(err.to_string()))?,
            ),
            (false, _) => None,
        };

        let validation_schema = match &service_document {
            Some(service_document) => build_federation_validation_schema(
                &upstream_document,
                service_document,
                &upstream_schema,
            ),
            None => build_base_validation_schema(&upstream_document, &upstream_schema),
        }
        .map_err(|err| ConfigurationError::InvalidUpstreamSchema(err.to_string()))?;
        let validation_document = to_validation_schema(&validation_schema)
            .map_err(|err| ConfigurationError::InvalidUpstreamSchema(err.to_string()))?;

        let metadata = match config.metadata {
            Some(metadata) => metadata,
            None => derive_nodes_metadata(&upstream_schema, service_document.as_ref()),
        };
        debug!(
            "data source configured with {} root nodes and {} child nodes",
            metadata.root_nodes.len(),
            metadata.child_nodes.len()
        );

        Ok(Self {
            fetch: config.fetch,
            subscription: config.subscription,
            federation_enabled: config.federation.enabled,
            upstream_document: Arc::new(upstream_document),
            upstream_schema: Arc::new(upstream_schema),
            validation_schema: Arc::new(validation_schema),
            validation_document: Arc::new(validation_document),
            custom_scalar_type_fields: config.custom_scalar_type_fields,
            fields: config.fields,
            types: config.types,
            directives: config.directives,
            metadata,
            federation: config.federation_metadata.into(),
        })
    }

    /// Loads the upstream SDL from the configured source, relative to `root_directory`.
    pub fn load(
        config: DataSourceConfig,
        root_directory: &Path,
    ) -> Result<Self, ConfigurationError> {
        let upstream_sdl = config.upstream_schema.load(root_directory)?;
        Self::new(config, &upstream_sdl)
    }

    pub fn field_configuration(&self, type_name: &str, field_name: &str) -> Option<&FieldConfig> {
        self.fields
            .iter()
            .find(|field| field.type_name == type_name && field.field_name == field_name)
    }

    /// The upstream name of a client type.
    pub fn rename_type<'a>(&'a self, type_name: &'a str) -> &'a str {
        self.types
            .iter()
            .find(|rename| rename.type_name == type_name)
            .map(|rename| rename.rename_to.as_str())
            .unwrap_or(type_name)
    }

    pub fn is_type_renamed(&self, type_name: &str) -> bool {
        self.types.iter().any(|rename| rename.type_name == type_name)
    }

    /// The upstream name of a client directive.
    pub fn rename_directive<'a>(&'a self, directive_name: &'a str) -> &'a str {
        self.directives
            .iter()
            .find(|rename| rename.directive_name == directive_name)
            .map(|rename| rename.rename_to.as_str())
            .unwrap_or(directive_name)
    }

    pub fn is_custom_scalar_field(&self, type_name: &str, field_name: &str) -> bool {
        self.custom_scalar_type_fields
            .iter()
            .any(|field| field.type_name == type_name && field.field_name == field_name)
    }

    pub fn is_root_node(&self, type_name: &str, field_name: &str) -> bool {
        nodes_contain(&self.metadata.root_nodes, type_name, field_name)
    }

    pub fn is_child_node(&self, type_name: &str, field_name: &str) -> bool {
        nodes_contain(&self.metadata.child_nodes, type_name, field_name)
    }
}

fn nodes_contain(nodes: &[TypeFieldsConfig], type_name: &str, field_name: &str) -> bool {
    nodes.iter().any(|node| {
        node.type_name == type_name && node.field_names.iter().any(|name| name == field_name)
    })
}

fn validate_fetch(fetch: &FetchConfig) -> Result<(), ConfigurationError> {
    if fetch.url.trim().is_empty() {
        return Err(ConfigurationError::EmptyFetchUrl);
    }

    http::Method::from_bytes(fetch.method.as_bytes())
        .map_err(|err| ConfigurationError::InvalidMethod(fetch.method.clone(), err))?;

    for (name, values) in &fetch.header {
        http::HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| ConfigurationError::BadHeaderName(name.clone(), err))?;
        for value in values {
            http::HeaderValue::from_str(value)
                .map_err(|err| ConfigurationError::BadHeaderValue(name.clone(), err))?;
        }
    }

    Ok(())
}

/// Header patterns are matched by the runtime; they are only compiled here to
/// reject invalid ones at load.
fn validate_subscription(config: &SubscriptionConfig) -> Result<(), ConfigurationError> {
    if config.url.trim().is_empty() {
        return Err(ConfigurationError::EmptySubscriptionUrl);
    }

    for name in &config.forwarded_client_headers {
        http::HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| ConfigurationError::BadHeaderName(name.clone(), err))?;
    }

    if !config.forwarded_client_header_regex_patterns.is_empty() {
        let mut regex_builder = meta::Regex::builder();
        regex_builder.syntax(SyntaxConfig::new().unicode(false).utf8(false));
        regex_builder
            .build_many(&config.forwarded_client_header_regex_patterns)
            .map_err(Box::new)?;
    }

    Ok(())
}

/// Root nodes are the root operation fields plus the fields of `@key` types.
/// Every other object or interface field is a child node.
fn derive_nodes_metadata(
    schema: &SchemaIndex,
    service_document: Option<&SchemaDocument>,
) -> NodesMetadataConfig {
    let entities = service_document
        .map(entity_type_names)
        .unwrap_or_default();
    let root_types = [
        Some(schema.query_type.as_str()),
        schema.mutation_type.as_deref(),
        schema.subscription_type.as_deref(),
    ];

    let mut metadata = NodesMetadataConfig::default();
    for definition in schema.definitions.values() {
        let (TypeDefinition::Object(composite) | TypeDefinition::Interface(composite)) = definition
        else {
            continue;
        };
        if composite.name.starts_with("__") {
            continue;
        }

        let node = TypeFieldsConfig {
            type_name: composite.name.clone(),
            field_names: composite.fields.keys().cloned().collect(),
        };

        let is_root = root_types.contains(&Some(composite.name.as_str()))
            || entities.iter().any(|entity| entity == &composite.name);
        if is_root {
            metadata.root_nodes.push(node);
        } else {
            metadata.child_nodes.push(node);
        }
    }

    metadata
}
