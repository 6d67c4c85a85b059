use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields)]
pub struct TypeFieldConfig {
    pub type_name: String,
    pub field_name: String,
}

/// A type together with the fields a data source can resolve on it.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TypeFieldsConfig {
    pub type_name: String,
    #[serde(default)]
    pub field_names: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct NodesMetadataConfig {
    /// Entry points of the data source: root operation fields and entity fields.
    #[serde(default)]
    pub root_nodes: Vec<TypeFieldsConfig>,
    /// Fields reachable below a root node.
    #[serde(default)]
    pub child_nodes: Vec<TypeFieldsConfig>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub type_name: String,
    pub field_name: String,
    /// Renames the field upstream. A single-element path that differs from `field_name`
    /// makes the client field name an alias of the upstream field.
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentConfig>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ArgumentConfig {
    pub name: String,
    #[serde(default)]
    pub source_type: ArgumentSourceType,
    /// For `object_field` sources, the path of the value inside the parent object.
    #[serde(default)]
    pub source_path: Vec<String>,
    /// Overrides the type name used for the upstream variable definition.
    #[serde(default)]
    pub rename_type_to: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentSourceType {
    /// The value comes from the argument of the client field.
    #[default]
    FieldArgument,
    /// The value comes from a field of the already resolved parent object.
    ObjectField,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TypeRenameConfig {
    pub type_name: String,
    pub rename_to: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DirectiveRenameConfig {
    pub directive_name: String,
    pub rename_to: String,
}
