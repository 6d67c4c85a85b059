use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fields::TypeFieldConfig;

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct FederationConfig {
    /// Treat the upstream as an Apollo Federation subgraph.
    #[serde(default)]
    pub enabled: bool,
    /// The SDL of the subgraph, as returned by `_service { sdl }`.
    /// Required when federation is enabled.
    #[serde(default)]
    pub service_sdl: Option<String>,
}

/// Federation directives of the subgraph, flattened to plain configuration.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct FederationMetadataConfig {
    /// One entry per `@key` directive.
    #[serde(default)]
    pub keys: Vec<FederationFieldConfig>,
    /// One entry per field carrying `@requires`.
    #[serde(default)]
    pub requires: Vec<FederationFieldConfig>,
    /// One entry per field carrying `@provides`.
    #[serde(default)]
    pub provides: Vec<FederationFieldConfig>,
    /// Interfaces declared as entities, with the concrete types implementing them.
    #[serde(default)]
    pub entity_interfaces: Vec<EntityInterfaceConfig>,
    /// Interfaces the subgraph exposes as an `@interfaceObject`,
    /// with the concrete types of the client schema folded into them.
    #[serde(default)]
    pub interface_objects: Vec<EntityInterfaceConfig>,
    /// Fields marked with `@external`.
    #[serde(default)]
    pub external_fields: Vec<TypeFieldConfig>,
    /// Fields marked with `@shareable`.
    #[serde(default)]
    pub shareable_fields: Vec<TypeFieldConfig>,
    /// Opaque entity caching settings, passed through to the execution engine.
    #[serde(default)]
    pub entity_caching: Vec<serde_json::Value>,
    /// Opaque root field caching settings, passed through to the execution engine.
    #[serde(default)]
    pub root_field_caching: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields)]
pub struct FederationFieldConfig {
    /// The entity type the field set belongs to.
    pub type_name: String,
    /// Empty for `@key`, the annotated field for `@requires` and `@provides`.
    #[serde(default)]
    pub field_name: String,
    /// The field set, for example `id info { a b }`.
    pub selection_set: String,
    /// Set for `@key(resolvable: false)`.
    #[serde(default)]
    pub disable_entity_resolver: bool,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EntityInterfaceConfig {
    pub interface_type_name: String,
    #[serde(default)]
    pub concrete_type_names: Vec<String>,
}
