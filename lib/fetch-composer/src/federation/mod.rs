use graphql_parser::query::{self as parser, Definition, TypeCondition};
use hive_router_composer_config::federation::{EntityInterfaceConfig, FederationMetadataConfig};

use crate::{representation::RepresentationError, utils::parsing::parse_operation};

pub type FieldSet = parser::SelectionSet<'static, String>;

/// Read-only view over the federation directives of a subgraph.
#[derive(Debug, Clone, Default)]
pub struct FederationMetadata {
    config: FederationMetadataConfig,
}

impl From<FederationMetadataConfig> for FederationMetadata {
    fn from(config: FederationMetadataConfig) -> Self {
        Self { config }
    }
}

impl FederationMetadata {
    pub fn entity_caching(&self) -> &[serde_json::Value] {
        &self.config.entity_caching
    }

    pub fn root_field_caching(&self) -> &[serde_json::Value] {
        &self.config.root_field_caching
    }

    pub fn is_external(&self, type_name: &str, field_name: &str) -> bool {
        self.config
            .external_fields
            .iter()
            .any(|f| f.type_name == type_name && f.field_name == field_name)
    }

    /// The interface object the concrete type is folded into, if any.
    pub fn interface_object_for(&self, concrete_type: &str) -> Option<&EntityInterfaceConfig> {
        self.config.interface_objects.iter().find(|interface| {
            interface
                .concrete_type_names
                .iter()
                .any(|name| name == concrete_type)
        })
    }

    /// The entity interface the concrete type implements, if any.
    pub fn entity_interface_for(&self, concrete_type: &str) -> Option<&EntityInterfaceConfig> {
        self.config.entity_interfaces.iter().find(|interface| {
            interface
                .concrete_type_names
                .iter()
                .any(|name| name == concrete_type)
        })
    }

    pub fn is_interface_object(&self, type_name: &str) -> bool {
        self.config
            .interface_objects
            .iter()
            .any(|interface| interface.interface_type_name == type_name)
    }

    /// Entity type names of a `_entities` fragment: the type itself, followed by the
    /// interface object or entity interface it belongs to.
    pub fn on_type_names(&self, type_name: &str) -> Vec<String> {
        let mut names = vec![type_name.to_string()];
        if let Some(interface) = self
            .interface_object_for(type_name)
            .or_else(|| self.entity_interface_for(type_name))
        {
            names.push(interface.interface_type_name.clone());
        }
        names
    }
}

/// Parses a field set such as `id info { a b }` into the selection set of
/// `fragment Key on <type_name>`.
pub fn parse_field_set(type_name: &str, field_set: &str) -> Result<FieldSet, RepresentationError> {
    let source = format!("fragment Key on {} {{ {} }}", type_name, field_set);
    let document = parse_operation(&source).map_err(|err| {
        RepresentationError::FieldSetParse(field_set.to_string(), err.to_string())
    })?;

    document
        .definitions
        .into_iter()
        .find_map(|definition| match definition {
            Definition::Fragment(fragment) => match fragment.type_condition {
                TypeCondition::On(_) => Some(fragment.selection_set),
            },
            Definition::Operation(_) => None,
        })
        .ok_or_else(|| {
            RepresentationError::FieldSetParse(
                field_set.to_string(),
                "expected a single selection set".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use hive_router_composer_config::federation::{EntityInterfaceConfig, FederationMetadataConfig};

    use graphql_parser::query::Selection;

    use super::{parse_field_set, FederationMetadata};

    #[test]
    fn parses_nested_field_sets() {
        let field_set = parse_field_set("User", "id info { a b }").unwrap();
        let names = field_set
            .items
            .iter()
            .filter_map(|item| match item {
                Selection::Field(field) => Some(field.name.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["id", "info"]);
        assert!(parse_field_set("User", "id {").is_err());
    }

    #[test]
    fn on_type_names_include_interface_objects() {
        let metadata = FederationMetadata::from(FederationMetadataConfig {
            interface_objects: vec![EntityInterfaceConfig {
                interface_type_name: "Account".to_string(),
                concrete_type_names: vec!["User".to_string(), "Admin".to_string()],
            }],
            ..Default::default()
        });

        assert_eq!(metadata.on_type_names("Admin"), vec!["Admin", "Account"]);
        assert_eq!(metadata.on_type_names("Review"), vec!["Review"]);
        assert!(metadata.is_interface_object("Account"));
    }
}
